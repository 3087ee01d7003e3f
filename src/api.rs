//! Async client for the Omeka S REST API
//!
//! Fetches item and media resources page by page and normalizes them into
//! [`Record`]s. Requests are plain reads against the public API; failed
//! pages surface as errors, failed media fetches for a single item degrade
//! to a skipped item so one flaky resource cannot sink a whole run.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::error::ValidateError;
use crate::model::Record;

/// Resources fetched per page. The API caps page size; 50 keeps the page
/// count low without hitting the cap.
const PER_PAGE: usize = 50;

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL of the API, e.g. `https://omeka.example.org/api`
    pub base_url: String,
    /// Item set to restrict item queries to, if any
    pub item_set_id: Option<u64>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum concurrent media fetches
    pub max_concurrent_requests: usize,
    /// User agent string
    pub user_agent: String,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            item_set_id: None,
            timeout_seconds: 30,
            max_concurrent_requests: 10,
            user_agent: format!("validate-omeka/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Async client over the content API.
pub struct OmekaClient {
    client: Client,
    config: ApiClientConfig,
}

impl OmekaClient {
    /// Create a new client with the given configuration
    pub fn new(config: ApiClientConfig) -> Result<Self, ValidateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(ValidateError::from)?;

        Ok(Self { client, config })
    }

    /// Fetch all items, walking pages until an empty page is returned.
    pub async fn fetch_items(&self) -> Result<Vec<Record>, ValidateError> {
        let mut records = Vec::new();
        let mut page = 1usize;

        loop {
            let mut url = format!(
                "{}/items?per_page={PER_PAGE}&page={page}",
                self.config.base_url
            );
            if let Some(item_set_id) = self.config.item_set_id {
                url.push_str(&format!("&item_set_id={item_set_id}"));
            }

            let payload = self.get_json(&url).await?;
            let Some(entries) = payload.as_array() else {
                break;
            };
            if entries.is_empty() {
                break;
            }
            for entry in entries {
                if let Ok(record) = Record::item_from_value(entry) {
                    records.push(record);
                }
            }
            page += 1;
        }

        Ok(records)
    }

    /// Fetch the media belonging to one item.
    pub async fn fetch_media(&self, item_id: u64) -> Result<Vec<Record>, ValidateError> {
        let url = format!("{}/media?item_id={item_id}", self.config.base_url);
        let payload = self.get_json(&url).await?;
        let entries = payload.as_array().cloned().unwrap_or_default();
        Ok(entries
            .iter()
            .filter_map(|entry| Record::media_from_value(entry).ok())
            .collect())
    }

    /// Fetch media for every item concurrently, bounded by a semaphore.
    ///
    /// Items whose media fetch fails are reported back by id so the caller
    /// can warn about them instead of aborting the run.
    pub async fn fetch_all_media(
        self: &Arc<Self>,
        item_ids: &[u64],
    ) -> Result<(Vec<Record>, Vec<u64>), ValidateError> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_requests));
        let mut handles = Vec::with_capacity(item_ids.len());

        for &item_id in item_ids {
            let client = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| ValidateError::Concurrency {
                        details: format!("Failed to acquire semaphore: {e}"),
                    })?;
                client.fetch_media(item_id).await
            }));
        }

        let mut media = Vec::new();
        let mut failed_items = Vec::new();
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(mut item_media)) => media.append(&mut item_media),
                Ok(Err(_)) => failed_items.push(item_ids[index]),
                Err(join_error) => {
                    return Err(ValidateError::Concurrency {
                        details: format!("Task join error: {join_error}"),
                    });
                }
            }
        }

        Ok((media, failed_items))
    }

    /// Single GET returning parsed JSON, with an explicit timeout wrapper so
    /// slow servers map to a typed timeout error rather than a generic one.
    async fn get_json(&self, url: &str) -> Result<Value, ValidateError> {
        let request_future = self.client.get(url).send();
        let response = timeout(
            Duration::from_secs(self.config.timeout_seconds),
            request_future,
        )
        .await
        .map_err(|_| ValidateError::Timeout {
            url: url.to_string(),
            timeout_seconds: self.config.timeout_seconds,
        })?
        .map_err(ValidateError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ValidateError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(ValidateError::from)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let config = ApiClientConfig {
            base_url: "https://omeka.example.org/api".to_string(),
            ..Default::default()
        };
        assert!(OmekaClient::new(config).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_items_unreachable_host_is_error() {
        let config = ApiClientConfig {
            base_url: "http://127.0.0.1:1/api".to_string(),
            timeout_seconds: 1,
            ..Default::default()
        };
        let client = OmekaClient::new(config).unwrap();
        assert!(client.fetch_items().await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_all_media_reports_failed_items() {
        let config = ApiClientConfig {
            base_url: "http://127.0.0.1:1/api".to_string(),
            timeout_seconds: 1,
            max_concurrent_requests: 2,
            ..Default::default()
        };
        let client = Arc::new(OmekaClient::new(config).unwrap());
        let (media, failed) = client.fetch_all_media(&[1, 2, 3]).await.unwrap();
        assert!(media.is_empty());
        assert_eq!(failed, vec![1, 2, 3]);
    }
}
