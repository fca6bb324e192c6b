//! HTTP transport for the GraphQL service and model downloads

use std::time::Duration;

use anyhow::{bail, Context, Result};
use assembly_core::{GraphqlService, ServiceError, Transport};
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{RequestBuilder, StatusCode};
use tracing::debug;

use crate::config::ServiceConfig;

pub type Service = GraphqlService<HttpTransport>;

/// [`Transport`] over a shared reqwest client
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    session_url: String,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            session_url: config.session_url(),
            token: config.token.clone(),
        })
    }

    /// The backend reads the token from the `access_token` cookie; the
    /// bearer header is sent as well for proxies that check it
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request
                .bearer_auth(token)
                .header(COOKIE, format!("access_token={}", token)),
            None => request,
        }
    }

    /// Download a model asset
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url = %url, "Downloading model");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;
        if !response.status().is_success() {
            bail!("Failed to fetch {}: HTTP {}", url, response.status());
        }
        let bytes = response.bytes().await.context("Failed to read model body")?;
        Ok(bytes.to_vec())
    }
}

fn network(e: reqwest::Error) -> ServiceError {
    ServiceError::Network(e.to_string())
}

async fn read_text(response: reqwest::Response) -> Result<String, ServiceError> {
    let status = response.status();
    let text = response.text().await.map_err(network)?;
    if status.is_success() {
        Ok(text)
    } else {
        Err(ServiceError::Http {
            status: status.as_u16(),
            message: text,
        })
    }
}

impl Transport for HttpTransport {
    async fn post_graphql(&self, body: String, protected: bool) -> Result<String, ServiceError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if protected {
            request = self.authorized(request);
        }
        let response = request.send().await.map_err(network)?;
        read_text(response).await
    }

    async fn fetch_session(&self) -> Result<Option<String>, ServiceError> {
        let response = self
            .authorized(self.client.get(&self.session_url))
            .send()
            .await
            .map_err(network)?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }
        read_text(response).await.map(Some)
    }
}

pub fn connect(config: &ServiceConfig) -> Result<Service> {
    Ok(GraphqlService::new(HttpTransport::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;

    fn transport(token: Option<&str>) -> HttpTransport {
        let config = ServiceConfig {
            token: token.map(str::to_string),
            ..Default::default()
        };
        HttpTransport::new(&config).unwrap()
    }

    #[test]
    fn test_token_sent_as_cookie_and_bearer() {
        let transport = transport(Some("abc.def"));
        let request = transport
            .authorized(transport.client.get(&transport.session_url))
            .build()
            .unwrap();
        assert_eq!(request.headers()[COOKIE], "access_token=abc.def");
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer abc.def");
    }

    #[test]
    fn test_no_token_sends_no_credentials() {
        let transport = transport(None);
        let request = transport
            .authorized(transport.client.post(&transport.endpoint))
            .build()
            .unwrap();
        assert!(request.headers().get(COOKIE).is_none());
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }
}
