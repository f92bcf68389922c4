//! HTTP implementation of the notification REST API
//!
//! Thin reqwest client over the server's notification endpoints. The client
//! carries a cookie store because the server authenticates via session
//! cookies established elsewhere in the application.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use notisync_core::{
    FetchError, NotificationApi, NotificationId, RawNotification, Result, SyncError, UserId,
};

/// REST client for the notification service
pub struct HttpNotificationApi {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnreadCountResponse {
    unread_count: u64,
}

impl HttpNotificationApi {
    /// Build a client against the given server root, e.g. `http://host:8080/`
    pub fn new(base_url: Url, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(request_timeout)
            .build()
            .map_err(|e| SyncError::config_error(format!("http client: {}", e)))?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| SyncError::config_error(format!("bad endpoint {}: {}", path, e)))
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(SyncError::Fetch(FetchError::Status {
                status: status.as_u16(),
            }))
        }
    }
}

fn request_error(e: reqwest::Error) -> SyncError {
    SyncError::Fetch(FetchError::RequestFailed {
        reason: e.to_string(),
    })
}

fn decode_error(e: reqwest::Error) -> SyncError {
    SyncError::Fetch(FetchError::Decode {
        reason: e.to_string(),
    })
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn fetch_all(&self, user: UserId) -> Result<Vec<RawNotification>> {
        let url = self.endpoint(&format!("api/notifications/{}", user))?;
        debug!(%url, "GET notifications");
        let response = self.client.get(url).send().await.map_err(request_error)?;
        Self::expect_success(response)
            .await?
            .json::<Vec<RawNotification>>()
            .await
            .map_err(decode_error)
    }

    async fn unread_count(&self, user: UserId) -> Result<u64> {
        let url = self.endpoint(&format!("api/notifications/{}/count", user))?;
        let response = self.client.get(url).send().await.map_err(request_error)?;
        let body: UnreadCountResponse = Self::expect_success(response)
            .await?
            .json()
            .await
            .map_err(decode_error)?;
        Ok(body.unread_count)
    }

    async fn mark_read(&self, user: UserId, id: NotificationId) -> Result<()> {
        let url = self.endpoint(&format!("api/notifications/{}/read/{}", id, user))?;
        let response = self.client.put(url).send().await.map_err(request_error)?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn mark_all_read(&self, user: UserId) -> Result<()> {
        let url = self.endpoint(&format!("api/notifications/{}/read-all", user))?;
        let response = self.client.put(url).send().await.map_err(request_error)?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn delete(&self, user: UserId, id: NotificationId) -> Result<()> {
        let url = self.endpoint(&format!("api/notifications/{}/{}", id, user))?;
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(request_error)?;
        Self::expect_success(response).await?;
        Ok(())
    }
}
