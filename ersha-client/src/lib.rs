mod http;
pub use http::*;
pub mod memory;
pub use memory::InMemoryCollection;

use std::sync::Arc;

use async_trait::async_trait;
use ersha_core::{AuditEntry, Device, DeviceDraft, DeviceId, Page, PageQuery};
use thiserror::Error;

/// Failures surfaced by a [`CollectionClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("session rejected by the server")]
    Unauthorized,
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

impl ClientError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        ClientError::Server {
            status: 404,
            message: format!("{what} not found"),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}

/// The inventory API as the console sees it.
///
/// Every call is a single request/response round trip. Implementations must
/// report any non-success response as an error, with 401-class rejections
/// reported as [`ClientError::Unauthorized`].
#[async_trait]
pub trait CollectionClient: Send + Sync + 'static {
    /// Fetch one page of devices matching `query`.
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page<Device>, ClientError>;

    /// Fetch the current version of a single device.
    async fn fetch_one(&self, id: &DeviceId) -> Result<Device, ClientError>;

    /// Create a device and return the stored record.
    async fn create(&self, draft: &DeviceDraft) -> Result<Device, ClientError>;

    /// Replace the editable fields of a device and return the stored record.
    async fn update(&self, id: &DeviceId, draft: &DeviceDraft) -> Result<Device, ClientError>;

    /// Delete a device.
    async fn delete(&self, id: &DeviceId) -> Result<(), ClientError>;

    /// Fetch the audit log of a device, newest first.
    async fn fetch_audit_log(&self, id: &DeviceId) -> Result<Vec<AuditEntry>, ClientError>;
}

#[async_trait]
impl<C> CollectionClient for Arc<C>
where
    C: CollectionClient + ?Sized,
{
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page<Device>, ClientError> {
        (**self).fetch_page(query).await
    }

    async fn fetch_one(&self, id: &DeviceId) -> Result<Device, ClientError> {
        (**self).fetch_one(id).await
    }

    async fn create(&self, draft: &DeviceDraft) -> Result<Device, ClientError> {
        (**self).create(draft).await
    }

    async fn update(&self, id: &DeviceId, draft: &DeviceDraft) -> Result<Device, ClientError> {
        (**self).update(id, draft).await
    }

    async fn delete(&self, id: &DeviceId) -> Result<(), ClientError> {
        (**self).delete(id).await
    }

    async fn fetch_audit_log(&self, id: &DeviceId) -> Result<Vec<AuditEntry>, ClientError> {
        (**self).fetch_audit_log(id).await
    }
}

/// Source of the credentials attached to every request.
///
/// Storing and refreshing credentials is the job of whoever implements this.
pub trait Credentials: Send + Sync + 'static {
    fn bearer_token(&self) -> Option<String>;
}

/// A fixed token, typically read from configuration or the environment.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl Credentials for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}
