use std::time::Duration;

use async_trait::async_trait;
use painel_core::api::{HttpResponse, HttpTransport};
use painel_core::ApiError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `reqwest` transport for native runs.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("painel-cli/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }
}

fn network(url: &str, error: &reqwest::Error) -> ApiError {
    ApiError::Network {
        url: url.to_string(),
        message: error.to_string(),
    }
}

#[async_trait(?Send)]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, ApiError> {
        let mut request = self
            .http
            .get(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|error| network(url, &error))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|error| network(url, &error))?;

        Ok(HttpResponse { status, body })
    }
}
