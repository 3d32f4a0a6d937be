//! Typed client for the museum's public collection API.

use crate::acquisition::rate_limiter::RateLimiter;
use crate::ingest::Record;
use anyhow::{bail, Context, Result};
use reqwest::{header, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const BASE_URL: &str = "https://collectionapi.metmuseum.org/public/collection/v1";

/// The API rejects default client UAs, so requests go out looking like a
/// browser.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const REQUESTS_PER_SECOND: u64 = 20;

/// A department as the API publishes it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiDepartment {
    #[serde(rename = "departmentId")]
    pub department_id: i64,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct DepartmentsResponse {
    departments: Vec<ApiDepartment>,
}

#[derive(Debug, Deserialize)]
struct ObjectIdsResponse {
    /// Null when a department has no objects.
    #[serde(rename = "objectIDs")]
    object_ids: Option<Vec<i64>>,
}

/// Outcome of fetching one object record.
#[derive(Debug)]
pub enum ObjectFetch {
    /// The object's full record.
    Record(Box<Record>),
    /// The API refuses to serve this object.
    Forbidden,
    /// The API is throttling us; back off before retrying.
    RateLimited,
}

/// Rate-limited HTTP client for the collection API.
pub struct CollectionClient {
    http: reqwest::Client,
    base_url: String,
    limiter: RateLimiter,
}

impl CollectionClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    /// Point the client at a different API root. Tests use this to talk to
    /// a local mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build http client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            limiter: RateLimiter::per_second(REQUESTS_PER_SECOND),
        })
    }

    /// Every department the collection publishes.
    pub async fn departments(&self) -> Result<Vec<ApiDepartment>> {
        self.limiter.wait().await;
        let url = format!("{}/departments", self.base_url);
        debug!("fetching {url}");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("department list request failed")?
            .error_for_status()
            .context("department list request rejected")?;

        let body: DepartmentsResponse = response
            .json()
            .await
            .context("malformed department list response")?;
        Ok(body.departments)
    }

    /// All object ids belonging to one department.
    pub async fn object_ids(&self, department_id: i64) -> Result<Vec<i64>> {
        self.limiter.wait().await;
        let url = format!("{}/objects?departmentIds={department_id}", self.base_url);
        debug!("fetching {url}");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("object id request for department {department_id} failed"))?
            .error_for_status()
            .with_context(|| format!("object id request for department {department_id} rejected"))?;

        let body: ObjectIdsResponse = response
            .json()
            .await
            .with_context(|| format!("malformed object id response for department {department_id}"))?;
        Ok(body.object_ids.unwrap_or_default())
    }

    /// One object's record, distinguishing refusals and throttling from
    /// hard failures.
    pub async fn object(&self, object_id: i64) -> Result<ObjectFetch> {
        self.limiter.wait().await;
        let url = format!("{}/objects/{object_id}", self.base_url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request for object {object_id} failed"))?;

        match response.status() {
            StatusCode::FORBIDDEN => Ok(ObjectFetch::Forbidden),
            StatusCode::TOO_MANY_REQUESTS => Ok(ObjectFetch::RateLimited),
            status if status.is_success() => {
                let record: Record = response
                    .json()
                    .await
                    .with_context(|| format!("malformed record for object {object_id}"))?;
                Ok(ObjectFetch::Record(Box::new(record)))
            }
            status => bail!("object {object_id} returned {status}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> CollectionClient {
        CollectionClient::with_base_url(server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_departments_parse() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/departments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "departments": [
                    {"departmentId": 6, "displayName": "Asian Art"},
                    {"departmentId": 11, "displayName": "European Paintings"}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let departments = client.departments().await.unwrap();

        assert_eq!(departments.len(), 2);
        assert_eq!(departments[0].department_id, 6);
        assert_eq!(departments[1].display_name, "European Paintings");
    }

    #[tokio::test]
    async fn test_object_ids_null_reads_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/objects"))
            .and(query_param("departmentIds", "99"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 0,
                "objectIDs": null
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let ids = client.object_ids(99).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_object_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/objects/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "objectID": 1,
                "title": "Cypresses"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/objects/2"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/objects/3"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/objects/4"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        match client.object(1).await.unwrap() {
            ObjectFetch::Record(record) => assert_eq!(record["title"], json!("Cypresses")),
            other => panic!("expected record, got {other:?}"),
        }
        assert!(matches!(
            client.object(2).await.unwrap(),
            ObjectFetch::Forbidden
        ));
        assert!(matches!(
            client.object(3).await.unwrap(),
            ObjectFetch::RateLimited
        ));
        assert!(client.object(4).await.is_err());
    }
}
