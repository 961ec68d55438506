use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::db::report_store::StoreError;
use crate::session::Session;

pub const REST_PATH: &str = "rest/v1";
pub const AUTH_PATH: &str = "auth/v1";
pub const RETURN_REPRESENTATION: &str = "return=representation";
pub const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=representation";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    code: Option<Value>,
    details: Option<String>,
    hint: Option<String>,
}

/// Thin request builder for a Supabase-style deployment.
#[derive(Clone, Debug)]
pub struct PostgrestClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

fn build_url(base: &str, prefix: &str, path: &str) -> String {
    let trimmed_base = base.trim_end_matches('/');
    let trimmed_path = path.trim_start_matches('/');
    format!("{}/{}/{}", trimmed_base, prefix, trimmed_path)
}

impl PostgrestClient {
    pub fn new(client: Client, base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            anon_key: anon_key.into(),
        }
    }

    fn authorize(&self, session: &Session, builder: RequestBuilder) -> RequestBuilder {
        let bearer = session.access_token.as_deref().unwrap_or(&self.anon_key);
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// Request against `/rest/v1/<table>`.
    pub fn table(&self, session: &Session, method: Method, table: &str) -> RequestBuilder {
        let url = build_url(&self.base_url, REST_PATH, table);
        debug!(%method, %url, "store request");
        self.authorize(session, self.client.request(method, url))
    }

    /// Request against `/auth/v1/<path>`.
    pub fn auth(&self, session: &Session, method: Method, path: &str) -> RequestBuilder {
        let url = build_url(&self.base_url, AUTH_PATH, path);
        debug!(%method, %url, "auth request");
        self.authorize(session, self.client.request(method, url))
    }
}

fn error_from_body(status: StatusCode, body: &str) -> StoreError {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|err| {
            err.message
                .as_ref()
                .or(err.msg.as_ref())
                .or(err.error_description.as_ref())
                .or(err.error.as_ref())
        })
        .map(|msg| msg.trim().to_string())
        .filter(|msg| !msg.is_empty())
        .or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .unwrap_or_else(|| "store request failed".to_string());

    let (code, details, hint) = match parsed {
        Some(err) => (
            err.code.and_then(|code| match code {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            }),
            err.details,
            err.hint,
        ),
        None => (None, None, None),
    };

    StoreError::Api {
        status,
        message,
        code,
        details,
        hint,
    }
}

/// Sends the request once and decodes a JSON body. No retries.
pub async fn send_request<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, StoreError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(error_from_body(status, &body));
    }

    let body = response.text().await?;
    serde_json::from_str::<T>(&body).map_err(|err| StoreError::InvalidResponse(err.to_string()))
}

/// Like [`send_request`] but expects an array and returns its first row,
/// failing with `NotFound` when the filter matched nothing.
pub async fn send_expect_row<T: DeserializeOwned>(
    request: RequestBuilder,
    entity: &str,
) -> Result<T, StoreError> {
    let rows: Vec<T> = send_request(request).await?;
    rows.into_iter()
        .next()
        .ok_or_else(|| StoreError::NotFound(entity.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_url_joins_segments() {
        assert_eq!(
            build_url("https://example.supabase.co/", REST_PATH, "/reports"),
            "https://example.supabase.co/rest/v1/reports"
        );
        assert_eq!(
            build_url("http://localhost:54321", AUTH_PATH, "user"),
            "http://localhost:54321/auth/v1/user"
        );
    }

    #[test]
    fn postgrest_error_body_is_mapped() {
        let body = json!({
            "code": "23503",
            "details": "Key is not present in table \"reports\".",
            "hint": null,
            "message": "insert or update on table \"comments\" violates foreign key constraint"
        })
        .to_string();

        match error_from_body(StatusCode::CONFLICT, &body) {
            StoreError::Api {
                status,
                message,
                code,
                details,
                hint,
            } => {
                assert_eq!(status, StatusCode::CONFLICT);
                assert!(message.contains("foreign key"));
                assert_eq!(code.as_deref(), Some("23503"));
                assert!(details.is_some());
                assert!(hint.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn auth_error_body_with_numeric_code_is_mapped() {
        let body = json!({ "code": 401, "msg": "invalid JWT" }).to_string();
        match error_from_body(StatusCode::UNAUTHORIZED, &body) {
            StoreError::Api { message, code, .. } => {
                assert_eq!(message, "invalid JWT");
                assert_eq!(code.as_deref(), Some("401"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn plain_text_error_body_becomes_message() {
        match error_from_body(StatusCode::BAD_GATEWAY, "  upstream down ") {
            StoreError::Api { message, code, .. } => {
                assert_eq!(message, "upstream down");
                assert!(code.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }

        match error_from_body(StatusCode::BAD_GATEWAY, "") {
            StoreError::Api { message, .. } => assert_eq!(message, "store request failed"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn requests_carry_api_key_and_session_token() {
        let server = httpmock::MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/rest/v1/reports")
                .header("apikey", "anon-key")
                .header("authorization", "Bearer user-jwt");
            then.status(200)
                .header("content-type", "application/json")
                .body("[]");
        });

        let client = PostgrestClient::new(Client::new(), server.url(""), "anon-key");
        let session = Session::anonymous().with_access_token("user-jwt");
        let rows: Vec<Value> = send_request(client.table(&session, Method::GET, "reports"))
            .await
            .expect("rows");

        mock.assert();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn anonymous_requests_fall_back_to_anon_key() {
        let server = httpmock::MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/rest/v1/profiles")
                .header("authorization", "Bearer anon-key");
            then.status(200)
                .header("content-type", "application/json")
                .body("[]");
        });

        let client = PostgrestClient::new(Client::new(), server.url(""), "anon-key");
        let result = send_expect_row::<Value>(
            client.table(&Session::anonymous(), Method::GET, "profiles"),
            "profile",
        )
        .await;

        mock.assert();
        match result {
            Err(StoreError::NotFound(entity)) => assert_eq!(entity, "profile"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn truncated_success_body_is_an_http_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n[")
                .await
                .expect("write");
        });

        let client = PostgrestClient::new(Client::new(), format!("http://{addr}"), "anon-key");
        let result: Result<Vec<Value>, _> =
            send_request(client.table(&Session::anonymous(), Method::GET, "reports")).await;

        server.await.expect("server task");
        assert!(
            matches!(result, Err(StoreError::Http(_))),
            "unexpected result: {result:?}"
        );
    }

    #[tokio::test]
    async fn malformed_success_body_is_invalid_response() {
        let server = httpmock::MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/rest/v1/reports");
            then.status(200).body("not json");
        });

        let client = PostgrestClient::new(Client::new(), server.url(""), "anon-key");
        let result: Result<Vec<Value>, _> =
            send_request(client.table(&Session::anonymous(), Method::GET, "reports")).await;

        assert!(matches!(result, Err(StoreError::InvalidResponse(_))));
    }
}
