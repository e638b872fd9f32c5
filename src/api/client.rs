//! Azure DevOps API client implementation.
//!
//! This module provides the client for the work item tracking REST API.
//! Each method issues exactly one request and fails on the first error it
//! meets; nothing is retried.

use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::auth::Auth;
use super::error::{ApiError, Result};
use super::types::{PatchOperation, WiqlRequest, WiqlResponse, WorkItemId};
use crate::config::Connection;
use crate::wiql::WiqlQuery;

/// Content type required by the work item update endpoint.
const JSON_PATCH: &str = "application/json-patch+json";

/// The Azure DevOps work item client.
#[derive(Debug)]
pub struct DevOpsClient {
    /// The HTTP client.
    client: Client,
    /// `{base}/{organization}/{project}`, with segments percent-encoded.
    project_url: String,
    /// The `api-version` query parameter.
    api_version: String,
    /// Authentication credentials.
    auth: Auth,
}

impl DevOpsClient {
    /// Create a client for the organization and project of a connection.
    ///
    /// Does not contact the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the organization or project is empty or the HTTP
    /// client cannot be built.
    #[instrument(skip(connection, auth), fields(organization = %connection.organization, project = %connection.project))]
    pub fn new(connection: &Connection, auth: Auth) -> Result<Self> {
        let project_url = build_project_url(
            &connection.base_url,
            &connection.organization,
            &connection.project,
        )?;
        let client = Self::build_http_client()?;

        info!("Created work item client");
        Ok(Self {
            client,
            project_url,
            api_version: connection.api_version.clone(),
            auth,
        })
    }

    /// Build the HTTP client.
    ///
    /// No request timeout is set; the transport defaults apply.
    fn build_http_client() -> Result<Client> {
        Client::builder()
            .user_agent(concat!("witsweep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Transport)
    }

    /// URL of the WIQL query endpoint.
    pub fn wiql_url(&self) -> String {
        format!(
            "{}/_apis/wit/wiql?api-version={}",
            self.project_url, self.api_version
        )
    }

    /// URL of a single work item.
    pub fn work_item_url(&self, id: WorkItemId) -> String {
        format!(
            "{}/_apis/wit/workitems/{}?api-version={}",
            self.project_url, id, self.api_version
        )
    }

    /// Run a WIQL query and return the matching work item IDs.
    ///
    /// Calls `POST _apis/wit/wiql`. IDs are returned in server order.
    #[instrument(skip(self, query))]
    pub async fn query_work_items(&self, query: &WiqlQuery) -> Result<Vec<WorkItemId>> {
        let body = WiqlRequest {
            query: query.to_string(),
        };
        debug!(wiql = %body.query, "Querying work items");

        let response = self
            .client
            .post(self.wiql_url())
            .header(header::AUTHORIZATION, self.auth.header_value())
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let result: WiqlResponse = self.handle_response(response).await?;
        let ids = result.ids();
        debug!("Query matched {} work items", ids.len());
        Ok(ids)
    }

    /// Apply field-patch instructions to a work item.
    ///
    /// Calls `PATCH _apis/wit/workitems/{id}`. The response body is not
    /// inspected beyond the status code.
    #[instrument(skip(self, operations))]
    pub async fn update_work_item(
        &self,
        id: WorkItemId,
        operations: &[PatchOperation],
    ) -> Result<()> {
        // The content type must be set before `json`, which only fills it in
        // when absent.
        let response = self
            .client
            .patch(self.work_item_url(id))
            .header(header::AUTHORIZATION, self.auth.header_value())
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, JSON_PATCH)
            .json(operations)
            .send()
            .await?;

        Self::check_status(response).await?;
        debug!("Work item updated");
        Ok(())
    }

    /// Set a work item's state to `Closed`.
    pub async fn close_work_item(&self, id: WorkItemId) -> Result<()> {
        self.update_work_item(id, &[PatchOperation::close()]).await
    }

    /// Check for `200 OK` and parse the JSON body.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let response = Self::check_status(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::Decode(format!("Failed to parse response: {}", e)))
    }

    /// Fail unless the response status is exactly `200 OK`.
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(response);
        }

        let url = response.url().to_string();
        let error_body = response.text().await.unwrap_or_default();
        debug!("Error response body: {}", error_body);
        Err(error_from_response(status, &url, &error_body))
    }
}

/// Create an error from a non-200 response.
///
/// Azure DevOps error bodies carry a `message` field; the URL is used when
/// there is none.
fn error_from_response(status: StatusCode, url: &str, body: &str) -> ApiError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json.get("message")?.as_str().map(str::to_string))
        .filter(|m| !m.is_empty());

    match message {
        Some(message) => ApiError::from_status(status, &message),
        None => ApiError::from_status(status, url),
    }
}

/// Build `{base}/{organization}/{project}` with trailing slashes removed from
/// the base and both segments percent-encoded.
fn build_project_url(base_url: &str, organization: &str, project: &str) -> Result<String> {
    let base = base_url.trim_end_matches('/');
    if !base.starts_with("https://") && !base.starts_with("http://") {
        return Err(ApiError::InvalidUrl(format!(
            "'{}' must start with http:// or https://",
            base_url
        )));
    }
    if !base.starts_with("https://") && !base.contains("localhost") {
        warn!("URL does not use HTTPS: {}. This is insecure for production use.", base);
    }

    let organization = organization.trim();
    let project = project.trim();
    if organization.is_empty() {
        return Err(ApiError::InvalidUrl("organization cannot be empty".to_string()));
    }
    if project.is_empty() {
        return Err(ApiError::InvalidUrl("project cannot be empty".to_string()));
    }

    Ok(format!(
        "{}/{}/{}",
        base,
        urlencoding::encode(organization),
        urlencoding::encode(project)
    ))
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    use super::*;
    use crate::sweep::{Outcome, SweepMode, Sweeper};

    fn connection() -> Connection {
        Connection {
            base_url: "https://dev.azure.com/".to_string(),
            organization: "Olopo".to_string(),
            project: "ERP".to_string(),
            api_version: "7.0".to_string(),
        }
    }

    #[test]
    fn test_wiql_url() {
        let client = DevOpsClient::new(&connection(), Auth::new("pat")).unwrap();
        assert_eq!(
            client.wiql_url(),
            "https://dev.azure.com/Olopo/ERP/_apis/wit/wiql?api-version=7.0"
        );
    }

    #[test]
    fn test_work_item_url() {
        let client = DevOpsClient::new(&connection(), Auth::new("pat")).unwrap();
        assert_eq!(
            client.work_item_url(101),
            "https://dev.azure.com/Olopo/ERP/_apis/wit/workitems/101?api-version=7.0"
        );
    }

    #[test]
    fn test_project_url_encodes_segments() {
        let url = build_project_url("https://dev.azure.com", "Olopo", "My Project").unwrap();
        assert_eq!(url, "https://dev.azure.com/Olopo/My%20Project");
    }

    #[test]
    fn test_project_url_rejects_empty_project() {
        let err = build_project_url("https://dev.azure.com", "Olopo", "  ").unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn test_project_url_rejects_missing_scheme() {
        let err = build_project_url("dev.azure.com", "Olopo", "ERP").unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn test_error_from_response_uses_message() {
        let body = r#"{"$id":"1","message":"TF401232: Work item 205 does not exist.","typeKey":"WorkItemUnauthorizedAccessException"}"#;
        let err = error_from_response(StatusCode::NOT_FOUND, "https://x", body);
        match err {
            ApiError::UnexpectedStatus { status, context } => {
                assert_eq!(status, 404);
                assert!(context.contains("TF401232"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_from_response_falls_back_to_url() {
        let err = error_from_response(StatusCode::UNAUTHORIZED, "https://x/wiql", "<html/>");
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("https://x/wiql"));
    }

    /// Serve one canned `(status, body)` response per connection, in order,
    /// and return the raw requests that were received.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (Connection, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut stream).await);

                let response = format!(
                    "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
            requests
        });

        let connection = Connection {
            base_url: format!("http://127.0.0.1:{}", port),
            ..connection()
        };
        (connection, handle)
    }

    /// Read one request: headers, then `Content-Length` bytes of body.
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_sweep_sends_expected_requests() {
        let (connection, server) = serve(vec![
            (200, r#"{"workItems":[{"id":101},{"id":205}]}"#),
            (200, r#"{"id":101}"#),
            (404, r#"{"message":"TF401232: Work item 205 does not exist."}"#),
        ])
        .await;
        let client = DevOpsClient::new(&connection, Auth::new("pat")).unwrap();

        let report = Sweeper::new(&client, SweepMode::Close)
            .run(&WiqlQuery::assigned_and_open("stanly"))
            .await
            .unwrap();

        assert_eq!(report.outcomes[0].outcome, Outcome::Closed);
        assert_eq!(report.outcomes[1].id, 205);
        assert!(matches!(
            report.outcomes[1].outcome,
            Outcome::Failed { status: Some(404), .. }
        ));

        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 3);

        let search = requests[0].to_lowercase();
        assert!(search.starts_with("post /olopo/erp/_apis/wit/wiql?api-version=7.0 http/1.1"));
        assert!(search.contains("authorization: basic onbhda=="));
        assert!(search.contains("content-type: application/json\r\n"));
        assert!(requests[0].contains(r#"{"query":"SELECT [System.Id] FROM workitems WHERE [System.AssignedTo] CONTAINS 'stanly'"#));

        for (request, id) in requests[1..].iter().zip([101, 205]) {
            let lower = request.to_lowercase();
            assert!(lower.starts_with(&format!(
                "patch /olopo/erp/_apis/wit/workitems/{}?api-version=7.0 http/1.1",
                id
            )));
            assert!(lower.contains("authorization: basic onbhda=="));
            assert_eq!(lower.matches("content-type:").count(), 1);
            assert!(lower.contains("content-type: application/json-patch+json"));
            assert!(request.ends_with(r#"[{"op":"add","path":"/fields/System.State","value":"Closed"}]"#));
        }
    }

    #[tokio::test]
    async fn test_other_success_status_is_unexpected() {
        let (connection, server) = serve(vec![(201, r#"{"id":999}"#)]).await;
        let client = DevOpsClient::new(&connection, Auth::new("pat")).unwrap();

        let err = client.close_work_item(999).await.unwrap_err();

        assert!(matches!(err, ApiError::UnexpectedStatus { status: 201, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unparseable_body_is_decode_error() {
        let (connection, server) = serve(vec![(200, "not json")]).await;
        let client = DevOpsClient::new(&connection, Auth::new("pat")).unwrap();

        let err = client
            .query_work_items(&WiqlQuery::assigned_and_open("stanly"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Decode(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let connection = Connection {
            base_url: format!("http://127.0.0.1:{}", port),
            ..connection()
        };
        let client = DevOpsClient::new(&connection, Auth::new("pat")).unwrap();

        let err = client
            .query_work_items(&WiqlQuery::assigned_and_open("stanly"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(err.status(), None);
    }
}
