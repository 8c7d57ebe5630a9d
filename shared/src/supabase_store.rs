//! Comment store backed by a hosted Supabase project (PostgREST + GoTrue).
//!
//! Every request is sent with the caller's access token when there is one, so
//! the project's row-level security policies decide what a write may touch.

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::{
    comments::{Comment, CommentStatus, NewCommentRow, Principal},
    comments_store::{CommentStore, IdentityProvider},
    config::SupabaseConfig,
    error::StoreError,
};

/// [`CommentStore`] and [`IdentityProvider`] over one Supabase project.
#[derive(Clone)]
pub struct SupabaseCommentStore {
    client: Client,
    config: SupabaseConfig,
}

/// Ids may come back as uuid text or bigint depending on the table
/// definition; both are treated as opaque strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(value) => value,
            RawId::Number(value) => value.to_string(),
        }
    }
}

/// Row exactly as PostgREST returns it. Converted into [`Comment`] before
/// leaving this module.
#[derive(Debug, Deserialize)]
struct CommentRow {
    id: RawId,
    article_id: RawId,
    #[serde(default)]
    author_name: Option<String>,
    #[serde(default)]
    author_email: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    content: String,
    status: String,
    #[serde(default)]
    parent_id: Option<RawId>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = StoreError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<CommentStatus>()
            .map_err(|err| StoreError::Decode(err.to_string()))?;
        Ok(Comment {
            id: row.id.into_string(),
            article_id: row.article_id.into_string(),
            author_name: row.author_name,
            author_email: row.author_email,
            user_id: row.user_id,
            content: row.content,
            status,
            parent_id: row.parent_id.map(RawId::into_string),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

impl SupabaseCommentStore {
    /// Builds the HTTP client with the configured request timeout.
    pub fn new(config: SupabaseConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| StoreError::Transport(format!("failed to build http client: {err}")))?;
        Ok(Self {
            client,
            config,
        })
    }

    /// Settings this store was built with.
    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, self.config.comments_table)
    }

    fn request(&self, method: Method, url: String, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.config.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
    }

    fn table_request(&self, method: Method, principal: Option<&Principal>) -> RequestBuilder {
        let token = principal.and_then(|principal| principal.access_token.as_deref());
        self.request(method, self.table_url(), token)
    }
}

async fn read_body(resp: Response) -> Result<String, StoreError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|err| StoreError::Transport(format!("failed to read response body: {err}")))?;
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(StoreError::Forbidden(body));
    }
    if !status.is_success() {
        return Err(StoreError::Http {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

async fn read_comments(resp: Response) -> Result<Vec<Comment>, StoreError> {
    let body = read_body(resp).await?;
    let rows: Vec<CommentRow> =
        serde_json::from_str(&body).map_err(|err| StoreError::Decode(err.to_string()))?;
    rows.into_iter().map(Comment::try_from).collect()
}

#[async_trait]
impl CommentStore for SupabaseCommentStore {
    async fn select_approved(&self, article_id: &str) -> Result<Vec<Comment>, StoreError> {
        debug!("selecting approved comments for article {article_id}");
        let resp = self
            .table_request(Method::GET, None)
            .query(&[
                ("select", "*".to_string()),
                ("article_id", format!("eq.{article_id}")),
                ("status", format!("eq.{}", CommentStatus::Approved)),
                ("order", "created_at.asc".to_string()),
            ])
            .send()
            .await?;
        read_comments(resp).await
    }

    async fn insert(
        &self,
        row: NewCommentRow,
        principal: Option<&Principal>,
    ) -> Result<Comment, StoreError> {
        debug!("inserting comment for article {}", row.article_id);
        let resp = self
            .table_request(Method::POST, principal)
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;
        read_comments(resp)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no row".to_string()))
    }

    async fn update_content(
        &self,
        comment_id: &str,
        content: &str,
        principal: &Principal,
    ) -> Result<Option<Comment>, StoreError> {
        debug!("updating comment {comment_id} as {}", principal.user_id);
        let resp = self
            .table_request(Method::PATCH, Some(principal))
            .query(&[("id", format!("eq.{comment_id}"))])
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await?;
        Ok(read_comments(resp).await?.into_iter().next())
    }

    async fn delete(&self, comment_id: &str, principal: &Principal) -> Result<bool, StoreError> {
        debug!("deleting comment {comment_id} as {}", principal.user_id);
        let resp = self
            .table_request(Method::DELETE, Some(principal))
            .query(&[("id", format!("eq.{comment_id}"))])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        Ok(!read_comments(resp).await?.is_empty())
    }
}

#[async_trait]
impl IdentityProvider for SupabaseCommentStore {
    async fn lookup(&self, access_token: &str) -> Result<Option<Principal>, StoreError> {
        let url = format!("{}/auth/v1/user", self.config.url);
        let resp = self
            .request(Method::GET, url, Some(access_token))
            .send()
            .await?;
        let body = match read_body(resp).await {
            Ok(body) => body,
            Err(StoreError::Forbidden(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        let user: AuthUser =
            serde_json::from_str(&body).map_err(|err| StoreError::Decode(err.to_string()))?;
        Ok(Some(Principal::new(user.id)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use super::SupabaseCommentStore;
    use crate::{
        comments::{CommentStatus, NewCommentRow, Principal},
        comments_store::{CommentStore, IdentityProvider},
        config::SupabaseConfig,
        error::StoreError,
    };

    fn store_for(server: &MockServer) -> SupabaseCommentStore {
        SupabaseCommentStore::new(SupabaseConfig::new(server.uri(), "anon-key")).unwrap()
    }

    fn row_json(id: &str, parent_id: Option<&str>, user_id: Option<&str>) -> serde_json::Value {
        json!({
            "id": id,
            "article_id": "how-to-register-a-business",
            "author_name": "Ngozi",
            "author_email": null,
            "user_id": user_id,
            "content": "Thank you for this",
            "status": "approved",
            "parent_id": parent_id,
            "created_at": "2024-05-01T08:00:00.123456+00:00"
        })
    }

    #[tokio::test]
    async fn select_sends_status_and_order_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/comments"))
            .and(query_param("article_id", "eq.how-to-register-a-business"))
            .and(query_param("status", "eq.approved"))
            .and(query_param("order", "created_at.asc"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                row_json("1", None, None),
                row_json("2", Some("1"), None),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let rows = store_for(&server)
            .select_approved("how-to-register-a-business")
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].parent_id.as_deref(), Some("1"));
        assert_eq!(rows[0].status, CommentStatus::Approved);
    }

    #[tokio::test]
    async fn numeric_ids_are_decoded_as_text() {
        let server = MockServer::start().await;
        let mut row = row_json("ignored", None, None);
        row["id"] = json!(42);
        row["parent_id"] = json!(7);
        Mock::given(method("GET"))
            .and(path("/rest/v1/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
            .mount(&server)
            .await;

        let rows = store_for(&server).select_approved("a1").await.unwrap();
        assert_eq!(rows[0].id, "42");
        assert_eq!(rows[0].parent_id.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn unknown_status_is_a_decode_error() {
        let server = MockServer::start().await;
        let mut row = row_json("1", None, None);
        row["status"] = json!("flagged");
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
            .mount(&server)
            .await;

        let err = store_for(&server).select_approved("a1").await.unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn insert_forwards_session_token_and_row() {
        let server = MockServer::start().await;
        let mut created = row_json("9", None, Some("user-1"));
        created["status"] = json!("pending");
        Mock::given(method("POST"))
            .and(path("/rest/v1/comments"))
            .and(header("authorization", "Bearer user-token"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!({
                "article_id": "how-to-register-a-business",
                "author_name": null,
                "author_email": null,
                "user_id": "user-1",
                "content": "Thank you for this",
                "status": "pending",
                "parent_id": null
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([created])))
            .expect(1)
            .mount(&server)
            .await;

        let principal = Principal::new("user-1").with_access_token("user-token");
        let comment = store_for(&server)
            .insert(
                NewCommentRow {
                    article_id: "how-to-register-a-business".to_string(),
                    author_name: None,
                    author_email: None,
                    user_id: Some("user-1".to_string()),
                    content: "Thank you for this".to_string(),
                    status: CommentStatus::Pending,
                    parent_id: None,
                },
                Some(&principal),
            )
            .await
            .unwrap();

        assert_eq!(comment.id, "9");
        assert_eq!(comment.status, CommentStatus::Pending);
    }

    #[tokio::test]
    async fn update_filtered_by_policy_affects_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/comments"))
            .and(query_param("id", "eq.5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let principal = Principal::new("user-2").with_access_token("other-token");
        let outcome = store_for(&server)
            .update_content("5", "edited", &principal)
            .await;
        assert_eq!(outcome, Ok(None));
    }

    #[tokio::test]
    async fn forbidden_delete_maps_to_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/comments"))
            .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
            .mount(&server)
            .await;

        let principal = Principal::new("user-2").with_access_token("other-token");
        let err = store_for(&server).delete("5", &principal).await.unwrap_err();
        assert_eq!(err, StoreError::Forbidden("permission denied".to_string()));
    }

    #[tokio::test]
    async fn server_error_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let principal = Principal::new("user-1").with_access_token("token");
        let err = store_for(&server).delete("5", &principal).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Http {
                status: 503,
                body: "maintenance".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn identity_lookup_resolves_user_or_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer live-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "user-1", "email": "ada@example.ng"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer stale-token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let principal = store.lookup("live-token").await.unwrap().unwrap();
        assert_eq!(principal.user_id, "user-1");
        assert_eq!(store.lookup("stale-token").await, Ok(None));
    }

    #[tokio::test]
    async fn truncated_body_is_a_transport_error() {
        use tokio::{
            io::{AsyncReadExt, AsyncWriteExt},
            net::TcpListener,
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0_u8; 4096];
            let _ = socket.read(&mut buf).await;
            let head = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                        content-length: 500\r\n\r\n[{\"id\":";
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        let store =
            SupabaseCommentStore::new(SupabaseConfig::new(format!("http://{addr}"), "anon-key"))
                .unwrap();
        let err = store.select_approved("a1").await.unwrap_err();

        assert!(matches!(err, StoreError::Transport(_)), "{err:?}");
    }
}
