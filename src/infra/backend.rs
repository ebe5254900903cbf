//! Shared HTTP client for the hosted backend's REST endpoints.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid backend URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("backend URL `{0}` cannot carry a path")]
    CannotBeABase(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Clone, Debug)]
pub struct BackendClient {
    client: Client,
    base: Url,
    anon_key: String,
}

impl BackendClient {
    pub fn new(
        base_url: &str,
        anon_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let mut base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(BackendError::CannotBeABase(base_url.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base,
            anon_key: anon_key.into(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("vastra/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for `segments`, each percent-encoded as one path segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::CannotBeABase(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Request carrying the project key, authorized as `bearer` or as the
    /// anonymous role.
    pub fn request(&self, method: Method, url: Url, bearer: Option<&str>) -> RequestBuilder {
        let token = bearer.unwrap_or(&self.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }
}

/// Failure body of a non-success response, reduced to a readable message.
pub(crate) async fn error_message(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|body| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|field| body.get(*field).and_then(|value| value.as_str()))
                .map(str::to_string)
        })
        .unwrap_or(text);
    (status, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_base_path_and_encode_segments() {
        let client = BackendClient::new("https://shop.example/api", "anon", Duration::from_secs(5))
            .expect("client");

        let url = client
            .endpoint(&["storage", "v1", "object", "product images", "a.jpg"])
            .expect("url");

        assert_eq!(
            url.as_str(),
            "https://shop.example/api/storage/v1/object/product%20images/a.jpg"
        );
    }

    #[test]
    fn rejects_non_hierarchical_base() {
        let err = BackendClient::new("mailto:owner@vastra.in", "anon", Duration::from_secs(5))
            .expect_err("not a base");
        assert!(matches!(err, BackendError::CannotBeABase(_)));
    }
}
