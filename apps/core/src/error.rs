use std::time::Duration;

use thiserror::Error;

/// Failures raised by the API client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (backend unreachable, CORS, DNS...).
    #[error("network error requesting {url}: {message}")]
    Network { url: String, message: String },

    /// The backend answered with a non-2xx status.
    #[error(
        "HTTP {status} from {url}{}",
        .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
    )]
    HttpStatus {
        url: String,
        status: u16,
        message: Option<String>,
    },

    /// The body was empty or not the JSON shape we expected.
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },
}

impl ApiError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Network { .. } => "Erro: backend não respondeu".to_string(),
            Self::HttpStatus { status, .. } => format!("Erro ao carregar dados (HTTP {status})"),
            Self::MalformedResponse { .. } => "Resposta inválida do servidor".to_string(),
        }
    }
}

/// The rendering backend could not produce a widget.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WidgetCreationError {
    #[error("rendering backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("target element `{0}` not found")]
    TargetMissing(String),

    #[error("widget `{id}` failed: {message}")]
    Backend { id: String, message: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("element `{element}` not visible after {}ms", .waited.as_millis())]
pub struct VisibilityTimeout {
    pub element: String,
    pub waited: Duration,
}

/// A payload could not be turned into a drawable series.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ViewModelError {
    #[error("no data for `{0}`")]
    Empty(String),

    #[error("series `{series}` has {values} values for {labels} labels")]
    LengthMismatch {
        series: String,
        labels: usize,
        values: usize,
    },
}

/// Umbrella error for section handlers and cross-filter refreshes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DashboardError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Widget(#[from] WidgetCreationError),

    #[error(transparent)]
    Visibility(#[from] VisibilityTimeout),

    #[error(transparent)]
    ViewModel(#[from] ViewModelError),

    #[error("widget `{0}` could not be rendered")]
    RenderFailed(String),

    #[error("no handler registered for section `{0}`")]
    UnknownSection(String),
}

impl DashboardError {
    /// Short text shown in place of a failed widget.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(error) => error.user_message(),
            Self::ViewModel(ViewModelError::Empty(_)) => {
                "Sem dados para esta seleção".to_string()
            }
            Self::ViewModel(_) => "Dados inconsistentes para este gráfico".to_string(),
            Self::Widget(_) | Self::RenderFailed(_) => {
                "Não foi possível exibir o gráfico".to_string()
            }
            Self::Visibility(_) => "Gráfico indisponível no momento".to_string(),
            Self::UnknownSection(_) => "Seção indisponível".to_string(),
        }
    }
}

/// A filter listener refused a notification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("listener failed: {0}")]
pub struct ListenerError(pub String);
