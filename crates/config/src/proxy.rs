//! Structural validation of outbound proxy settings.

use {
    secrecy::{ExposeSecret, Secret},
    thiserror::Error,
};

use crate::schema::ProxyConfig;

/// Why an enabled proxy descriptor was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProxyError {
    #[error("proxy host is not set")]
    MissingHost,
    #[error("proxy port is not set")]
    MissingPort,
    #[error("invalid proxy port")]
    InvalidPort,
    #[error("proxy host cannot be blank")]
    BlankHost,
}

/// A validated proxy endpoint.
#[derive(Debug, Clone)]
pub struct ProxyConnection {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<Secret<String>>,
}

impl ProxyConnection {
    /// Proxy URL without credentials.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Build a proxy that routes every request through this endpoint.
    pub fn to_reqwest(&self) -> reqwest::Result<reqwest::Proxy> {
        let proxy = reqwest::Proxy::all(self.url())?;
        Ok(match (&self.user, &self.pass) {
            (Some(user), Some(pass)) => proxy.basic_auth(user, pass.expose_secret()),
            (Some(user), None) => proxy.basic_auth(user, ""),
            _ => proxy,
        })
    }
}

impl ProxyConfig {
    /// Check the descriptor. A disabled proxy is always valid.
    pub fn validate(&self) -> Result<(), ProxyError> {
        if !self.enabled {
            return Ok(());
        }
        let host = match self.host.as_deref() {
            Some(host) if !host.is_empty() => host,
            _ => return Err(ProxyError::MissingHost),
        };
        let Some(port) = self.port.as_ref() else {
            return Err(ProxyError::MissingPort);
        };
        if !port.as_integer().is_some_and(|p| (1..=65535).contains(&p)) {
            return Err(ProxyError::InvalidPort);
        }
        if host.trim().is_empty() {
            return Err(ProxyError::BlankHost);
        }
        Ok(())
    }

    /// Normalized connection, `None` when disabled.
    pub fn to_connection(&self) -> Result<Option<ProxyConnection>, ProxyError> {
        if !self.enabled {
            return Ok(None);
        }
        self.validate()?;
        let port = self
            .port
            .as_ref()
            .and_then(|p| p.as_integer())
            .and_then(|p| u16::try_from(p).ok())
            .ok_or(ProxyError::InvalidPort)?;
        Ok(Some(ProxyConnection {
            host: self.host.as_deref().unwrap_or_default().trim().to_string(),
            port,
            user: self.user.clone().filter(|u| !u.is_empty()),
            pass: self
                .pass
                .clone()
                .filter(|p| !p.expose_secret().is_empty()),
        }))
    }

    /// Display string with credentials masked, for logs.
    #[must_use]
    pub fn format_proxy_info(&self) -> String {
        if !self.enabled {
            return "proxy disabled".to_string();
        }
        let host = self.host.as_deref().unwrap_or_default();
        let port = self.port.as_ref().map(ToString::to_string).unwrap_or_default();
        match self.user.as_deref().filter(|u| !u.is_empty()) {
            Some(user) => format!("{user}:***@{host}:{port}"),
            None => format!("{host}:{port}"),
        }
    }

    /// Whether both authentication fields are present on an enabled proxy.
    #[must_use]
    pub fn needs_authentication(&self) -> bool {
        self.enabled
            && self.user.as_deref().is_some_and(|u| !u.is_empty())
            && self
                .pass
                .as_ref()
                .is_some_and(|p| !p.expose_secret().is_empty())
    }
}
