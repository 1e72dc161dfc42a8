use async_trait::async_trait;
use painel_core::api::{HttpResponse, HttpTransport};
use painel_core::ApiError;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

/// `window.fetch` transport. Any status is a response; only a rejected fetch
/// or an unreadable body is a network error.
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchTransport;

fn network(url: &str, error: &JsValue) -> ApiError {
    ApiError::Network {
        url: url.to_string(),
        message: error
            .as_string()
            .unwrap_or_else(|| format!("{error:?}")),
    }
}

#[async_trait(?Send)]
impl HttpTransport for FetchTransport {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, ApiError> {
        let Some(window) = web_sys::window() else {
            return Err(ApiError::Network {
                url: url.to_string(),
                message: "no window".to_string(),
            });
        };

        let opts = RequestInit::new();
        opts.set_method("GET");
        opts.set_mode(RequestMode::Cors);

        let request = Request::new_with_str_and_init(url, &opts).map_err(|e| network(url, &e))?;
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(|e| network(url, &e))?;
        for (name, value) in headers {
            request
                .headers()
                .set(name, value)
                .map_err(|e| network(url, &e))?;
        }

        let response_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| network(url, &e))?;
        let response: Response = response_value
            .dyn_into()
            .map_err(|e| network(url, &e))?;

        let body = JsFuture::from(response.text().map_err(|e| network(url, &e))?)
            .await
            .map_err(|e| network(url, &e))?
            .as_string()
            .unwrap_or_default();

        Ok(HttpResponse {
            status: response.status(),
            body,
        })
    }
}
