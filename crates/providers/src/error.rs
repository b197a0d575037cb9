use parley_config::{ProviderKind, ProxyError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("provider \"{name}\" is not supported")]
    UnknownProvider { name: String },

    #[error("provider \"{provider}\" is not configured")]
    NotConfigured { provider: ProviderKind },

    #[error("{provider}: `{field}` is not set")]
    MissingCredentials {
        provider: ProviderKind,
        field: &'static str,
    },

    #[error("proxy configuration error: {0}")]
    Proxy(#[from] ProxyError),

    #[error("{provider} API error HTTP {status}: {body}")]
    Api {
        provider: ProviderKind,
        status: u16,
        body: String,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error comes from configuration rather than a request.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::UnknownProvider { .. }
                | Self::NotConfigured { .. }
                | Self::MissingCredentials { .. }
                | Self::Proxy(_)
        )
    }
}
