//! Remote URI reachability checks
//!
//! Optional network pass over every URI-typed field occurrence. Results are
//! memoized in a concurrent cache so a URI referenced by hundreds of records
//! is probed exactly once per run, even when many records hit it at the same
//! time. Probe outcomes become findings on the referencing records; a dead
//! link never aborts the run.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Client, Method, StatusCode, redirect};
use tokio::sync::Semaphore;

use crate::engine::{FieldFinding, Severity};
use crate::error::ValidateError;
use crate::model::{Record, ValueKind};

/// Redirect hops followed manually before giving up.
const MAX_REDIRECTS: usize = 10;

/// Severity assigned to reachability problems other than a definite 404.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriCheckSeverity {
    Error,
    Warning,
}

/// Configuration for the URI checker
#[derive(Debug, Clone)]
pub struct UriCheckConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum concurrent probes
    pub max_concurrent_requests: usize,
    /// Whether cross-domain redirects produce findings
    pub check_redirects: bool,
    /// Severity for non-404 failures; 404 is always an error
    pub severity: UriCheckSeverity,
    /// Maximum number of cached probe results
    pub cache_capacity: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for UriCheckConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            max_concurrent_requests: 10,
            check_redirects: false,
            severity: UriCheckSeverity::Warning,
            cache_capacity: 10_000,
            user_agent: format!("validate-omeka/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Outcome of probing one URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriStatus {
    Ok,
    /// Reachable, but only after leaving the original domain.
    CrossDomainRedirect { final_url: String },
    NotFound,
    ClientError(u16),
    ServerError(u16),
    TooManyRedirects,
    Unreachable(String),
}

/// Probes URIs over HTTP with a shared result cache.
pub struct UriChecker {
    client: Client,
    cache: Cache<String, UriStatus>,
    config: UriCheckConfig,
}

impl UriChecker {
    pub fn new(config: UriCheckConfig) -> Result<Self, ValidateError> {
        // Redirects are followed manually so cross-domain hops are visible.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(ValidateError::from)?;

        let cache = Cache::builder().max_capacity(config.cache_capacity).build();

        Ok(Self {
            client,
            cache,
            config,
        })
    }

    /// Probe a URI, consulting the cache first.
    ///
    /// Concurrent callers asking for the same URI wait for the single
    /// in-flight probe instead of issuing duplicates.
    pub async fn check(&self, url: &str) -> UriStatus {
        self.cache
            .get_with(url.to_string(), self.probe(url.to_string()))
            .await
    }

    /// Follow redirects manually, preferring HEAD and falling back to GET
    /// when a server rejects HEAD outright.
    async fn probe(&self, url: String) -> UriStatus {
        let origin_host = host_of(&url);
        let mut current = url;

        for _ in 0..MAX_REDIRECTS {
            let response = match self.request(Method::HEAD, &current).await {
                Ok(response) => {
                    // Some servers refuse HEAD but serve GET fine.
                    if response.status() == StatusCode::METHOD_NOT_ALLOWED
                        || response.status() == StatusCode::NOT_IMPLEMENTED
                    {
                        match self.request(Method::GET, &current).await {
                            Ok(response) => response,
                            Err(reason) => return UriStatus::Unreachable(reason),
                        }
                    } else {
                        response
                    }
                }
                Err(reason) => return UriStatus::Unreachable(reason),
            };

            let status = response.status();
            if status.is_redirection() {
                let Some(next) = redirect_target(&response) else {
                    return UriStatus::Unreachable(format!(
                        "redirect without Location header from {current}"
                    ));
                };
                current = next;
                continue;
            }

            return match status {
                StatusCode::NOT_FOUND => UriStatus::NotFound,
                s if s.is_success() => {
                    if host_of(&current) != origin_host {
                        UriStatus::CrossDomainRedirect { final_url: current }
                    } else {
                        UriStatus::Ok
                    }
                }
                s if s.is_client_error() => UriStatus::ClientError(s.as_u16()),
                s => UriStatus::ServerError(s.as_u16()),
            };
        }

        UriStatus::TooManyRedirects
    }

    async fn request(&self, method: Method, url: &str) -> Result<reqwest::Response, String> {
        self.client
            .request(method, url)
            .send()
            .await
            .map_err(|e| e.to_string())
    }

    /// Check every http(s) URI occurrence across `records`, bounded by a
    /// semaphore, and turn failures into findings.
    pub async fn check_records(
        self: &Arc<Self>,
        records: &[Record],
    ) -> Result<Vec<FieldFinding>, ValidateError> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_requests));
        let mut handles = Vec::new();

        for record in records {
            for (field_name, occurrences) in &record.fields {
                for (index, occurrence) in occurrences.iter().enumerate() {
                    if occurrence.kind != ValueKind::Uri {
                        continue;
                    }
                    let url = occurrence.value.clone();
                    if !(url.starts_with("http://") || url.starts_with("https://")) {
                        continue;
                    }
                    let checker = Arc::clone(self);
                    let semaphore = Arc::clone(&semaphore);
                    let kind = record.kind;
                    let id = record.id;
                    let field = field_name.clone();
                    handles.push(tokio::spawn(async move {
                        let _permit = semaphore.acquire().await.map_err(|e| {
                            ValidateError::Concurrency {
                                details: format!("Failed to acquire semaphore: {e}"),
                            }
                        })?;
                        let status = checker.check(&url).await;
                        Ok::<_, ValidateError>(
                            checker.finding_for(kind, id, field, index, &url, status),
                        )
                    }));
                }
            }
        }

        let mut findings = Vec::new();
        for joined in futures::future::join_all(handles).await {
            let result = joined.map_err(|join_error| ValidateError::Concurrency {
                details: format!("Task join error: {join_error}"),
            })?;
            if let Some(finding) = result? {
                findings.push(finding);
            }
        }
        Ok(findings)
    }

    fn finding_for(
        &self,
        resource_kind: crate::model::ResourceKind,
        resource_id: u64,
        field_name: String,
        occurrence_index: usize,
        url: &str,
        status: UriStatus,
    ) -> Option<FieldFinding> {
        let configured = match self.config.severity {
            UriCheckSeverity::Error => Severity::Error,
            UriCheckSeverity::Warning => Severity::Warning,
        };
        let (severity, message) = match status {
            UriStatus::Ok => return None,
            UriStatus::CrossDomainRedirect { final_url } => {
                if !self.config.check_redirects {
                    return None;
                }
                (
                    Severity::Warning,
                    format!("URI redirects to a different domain: {url} -> {final_url}"),
                )
            }
            // A definite 404 is a broken reference regardless of settings.
            UriStatus::NotFound => (Severity::Error, format!("URI not found (404): {url}")),
            UriStatus::ClientError(code) => {
                (configured, format!("URI returned HTTP {code}: {url}"))
            }
            UriStatus::ServerError(code) => {
                (configured, format!("URI returned HTTP {code}: {url}"))
            }
            UriStatus::TooManyRedirects => {
                (configured, format!("URI exceeded redirect limit: {url}"))
            }
            UriStatus::Unreachable(reason) => {
                (configured, format!("URI unreachable: {url} ({reason})"))
            }
        };
        Some(FieldFinding {
            resource_kind,
            resource_id,
            field_name,
            occurrence_index: Some(occurrence_index),
            severity,
            message,
        })
    }
}

/// Resolve the Location header of a redirect response, made absolute against
/// the redirecting URL.
fn redirect_target(response: &reqwest::Response) -> Option<String> {
    let location = response.headers().get(reqwest::header::LOCATION)?;
    let location = location.to_str().ok()?;
    if location.starts_with("http://") || location.starts_with("https://") {
        Some(location.to_string())
    } else {
        response.url().join(location).ok().map(|u| u.to_string())
    }
}

fn host_of(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let host = rest.split(['/', '?', '#']).next()?;
    Some(host.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldValue, ResourceKind};
    use std::collections::BTreeMap;

    #[test]
    fn test_host_extraction() {
        assert_eq!(
            host_of("https://Example.COM/path?q=1"),
            Some("example.com".to_string())
        );
        assert_eq!(
            host_of("http://example.com"),
            Some("example.com".to_string())
        );
        assert_eq!(host_of("urn:isbn:123"), None);
    }

    #[test]
    fn test_404_is_always_error() {
        let checker = UriChecker::new(UriCheckConfig {
            severity: UriCheckSeverity::Warning,
            ..Default::default()
        })
        .unwrap();
        let finding = checker
            .finding_for(
                ResourceKind::Item,
                1,
                "dcterms:isPartOf".to_string(),
                0,
                "https://example.com/gone",
                UriStatus::NotFound,
            )
            .unwrap();
        assert_eq!(finding.severity, Severity::Error);
        assert!(finding.message.contains("404"));
    }

    #[test]
    fn test_server_error_uses_configured_severity() {
        let checker = UriChecker::new(UriCheckConfig {
            severity: UriCheckSeverity::Warning,
            ..Default::default()
        })
        .unwrap();
        let finding = checker
            .finding_for(
                ResourceKind::Media,
                7,
                "dcterms:license".to_string(),
                0,
                "https://example.com/500",
                UriStatus::ServerError(503),
            )
            .unwrap();
        assert_eq!(finding.severity, Severity::Warning);

        let strict = UriChecker::new(UriCheckConfig {
            severity: UriCheckSeverity::Error,
            ..Default::default()
        })
        .unwrap();
        let finding = strict
            .finding_for(
                ResourceKind::Media,
                7,
                "dcterms:license".to_string(),
                0,
                "https://example.com/500",
                UriStatus::ServerError(503),
            )
            .unwrap();
        assert_eq!(finding.severity, Severity::Error);
    }

    #[test]
    fn test_redirect_finding_gated_by_config() {
        let status = UriStatus::CrossDomainRedirect {
            final_url: "https://other.example.net/".to_string(),
        };

        let silent = UriChecker::new(UriCheckConfig {
            check_redirects: false,
            ..Default::default()
        })
        .unwrap();
        assert!(
            silent
                .finding_for(
                    ResourceKind::Item,
                    1,
                    "dcterms:isPartOf".to_string(),
                    0,
                    "https://example.com/",
                    status.clone(),
                )
                .is_none()
        );

        let checking = UriChecker::new(UriCheckConfig {
            check_redirects: true,
            ..Default::default()
        })
        .unwrap();
        let finding = checking
            .finding_for(
                ResourceKind::Item,
                1,
                "dcterms:isPartOf".to_string(),
                0,
                "https://example.com/",
                status,
            )
            .unwrap();
        assert_eq!(finding.severity, Severity::Warning);
        assert!(finding.message.contains("different domain"));
    }

    #[test]
    fn test_ok_status_produces_no_finding() {
        let checker = UriChecker::new(UriCheckConfig::default()).unwrap();
        assert!(
            checker
                .finding_for(
                    ResourceKind::Item,
                    1,
                    "dcterms:license".to_string(),
                    0,
                    "https://example.com/",
                    UriStatus::Ok,
                )
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_becomes_finding_not_abort() {
        let checker = Arc::new(
            UriChecker::new(UriCheckConfig {
                timeout_seconds: 1,
                ..Default::default()
            })
            .unwrap(),
        );
        let mut fields = BTreeMap::new();
        fields.insert(
            "dcterms:isPartOf".to_string(),
            vec![FieldValue::uri("http://127.0.0.1:1/dead")],
        );
        let record = Record {
            kind: ResourceKind::Item,
            id: 1,
            title: Some("t".to_string()),
            is_public: true,
            has_thumbnails: true,
            has_media_refs: true,
            filename: None,
            parent_item: None,
            fields,
        };
        let findings = checker
            .check_records(std::slice::from_ref(&record))
            .await
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("URI unreachable"));
    }

    #[tokio::test]
    async fn test_non_http_uris_are_skipped() {
        let checker = Arc::new(UriChecker::new(UriCheckConfig::default()).unwrap());
        let mut fields = BTreeMap::new();
        fields.insert(
            "dcterms:isPartOf".to_string(),
            vec![FieldValue::uri("urn:isbn:978-3-16-148410-0")],
        );
        let record = Record {
            kind: ResourceKind::Item,
            id: 1,
            title: Some("t".to_string()),
            is_public: true,
            has_thumbnails: true,
            has_media_refs: true,
            filename: None,
            parent_item: None,
            fields,
        };
        let findings = checker
            .check_records(std::slice::from_ref(&record))
            .await
            .unwrap();
        assert!(findings.is_empty());
    }
}
