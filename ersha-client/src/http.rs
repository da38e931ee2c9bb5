use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ersha_core::{AuditEntry, Device, DeviceDraft, DeviceId, Page, PageQuery};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{ClientError, CollectionClient, Credentials, StaticToken};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`CollectionClient`] over the inventory REST API.
#[derive(Clone)]
pub struct HttpCollectionClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn Credentials>,
}

// Error bodies are not part of any contract we rely on, so every field is
// optional and we fall back to the raw text.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl HttpCollectionClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            credentials: Arc::new(StaticToken::default()),
        })
    }

    pub fn with_credentials<C: Credentials>(mut self, credentials: C) -> Self {
        self.credentials = Arc::new(credentials);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in the constructor, a base url always has path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        debug!(url = %response.url(), %status, "response received");

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!(url = %response.url(), "request rejected as unauthorized");
            return Err(ClientError::Unauthorized);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(%status, error = %e, "failed to read error body");
                String::new()
            }
        };
        Err(ClientError::Server {
            status: status.as_u16(),
            message: error_message(status, &body),
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.execute(request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body)
        && let Some(message) = parsed.message.or(parsed.error)
        && !message.trim().is_empty()
    {
        return message;
    }

    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

#[async_trait]
impl CollectionClient for HttpCollectionClient {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page<Device>, ClientError> {
        let url = self.endpoint(&["devices"]);
        debug!(%url, page = query.page, size = query.size, "fetching device page");
        self.send_json(self.http.get(url).query(&query.to_params()))
            .await
    }

    async fn fetch_one(&self, id: &DeviceId) -> Result<Device, ClientError> {
        let url = self.endpoint(&["devices", &id.0]);
        self.send_json(self.http.get(url)).await
    }

    async fn create(&self, draft: &DeviceDraft) -> Result<Device, ClientError> {
        let url = self.endpoint(&["devices"]);
        self.send_json(self.http.post(url).json(draft)).await
    }

    async fn update(&self, id: &DeviceId, draft: &DeviceDraft) -> Result<Device, ClientError> {
        let url = self.endpoint(&["devices", &id.0]);
        self.send_json(self.http.put(url).json(draft)).await
    }

    async fn delete(&self, id: &DeviceId) -> Result<(), ClientError> {
        let url = self.endpoint(&["devices", &id.0]);
        self.execute(self.http.delete(url)).await?;
        Ok(())
    }

    async fn fetch_audit_log(&self, id: &DeviceId) -> Result<Vec<AuditEntry>, ClientError> {
        let url = self.endpoint(&["devices", &id.0, "audit"]);
        self.send_json(self.http.get(url)).await
    }
}
