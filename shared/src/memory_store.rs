//! In-process comment store that mimics the hosted backend's row-level
//! ownership policy. Backs tests and local runs without a hosted project.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::{
    comments::{Comment, CommentStatus, NewCommentRow, Principal},
    comments_store::{CommentStore, IdentityProvider},
    error::StoreError,
};

/// Comments plus a token → user table. Writes only touch rows whose
/// `user_id` equals the acting principal's, like an ownership policy would.
#[derive(Default)]
pub struct InMemoryCommentStore {
    rows: RwLock<Vec<Comment>>,
    tokens: RwLock<HashMap<String, String>>,
    last_created_at: RwLock<Option<DateTime<Utc>>>,
    calls: AtomicUsize,
    fail_next: RwLock<Option<StoreError>>,
}

impl InMemoryCommentStore {
    /// Empty store with no registered tokens.
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts rows in as-is, bypassing the lifecycle rules. Stands in for the
    /// back office when a test needs approved or rejected comments.
    pub async fn seed(&self, comments: impl IntoIterator<Item = Comment>) {
        let mut rows = self.rows.write().await;
        let mut last = self.last_created_at.write().await;
        for comment in comments {
            if last.as_ref().map_or(true, |previous| comment.created_at > *previous) {
                *last = Some(comment.created_at);
            }
            rows.push(comment);
        }
    }

    /// Sets a row's status directly.
    pub async fn set_status(&self, comment_id: &str, status: CommentStatus) -> bool {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|row| row.id == comment_id) {
            Some(row) => {
                row.status = status;
                true
            },
            None => false,
        }
    }

    /// Makes `access_token` resolve to `user_id` on identity lookups.
    pub async fn register_token(
        &self,
        access_token: impl Into<String>,
        user_id: impl Into<String>,
    ) {
        self.tokens
            .write()
            .await
            .insert(access_token.into(), user_id.into());
    }

    /// Makes the next store call fail with `err`.
    pub async fn fail_next_call(&self, err: StoreError) {
        *self.fail_next.write().await = Some(err);
    }

    /// Snapshot of every row, any status.
    pub async fn rows(&self) -> Vec<Comment> {
        self.rows.read().await.clone()
    }

    /// One row by id, any status.
    pub async fn get(&self, comment_id: &str) -> Option<Comment> {
        self.rows
            .read()
            .await
            .iter()
            .find(|row| row.id == comment_id)
            .cloned()
    }

    /// Number of store calls made so far, identity lookups excluded.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn begin_call(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_next.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Strictly increasing timestamps keep ordering stable when inserts land
    /// within the same clock tick.
    async fn next_created_at(&self) -> DateTime<Utc> {
        let mut last = self.last_created_at.write().await;
        let now = Utc::now();
        let stamp = match *last {
            Some(previous) if now <= previous => previous + Duration::milliseconds(1),
            _ => now,
        };
        *last = Some(stamp);
        stamp
    }
}

fn owns(row: &Comment, principal: &Principal) -> bool {
    row.user_id.as_deref() == Some(principal.user_id.as_str())
}

#[async_trait]
impl CommentStore for InMemoryCommentStore {
    async fn select_approved(&self, article_id: &str) -> Result<Vec<Comment>, StoreError> {
        self.begin_call().await?;
        let mut approved: Vec<Comment> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| row.article_id == article_id && row.status == CommentStatus::Approved)
            .cloned()
            .collect();
        approved.sort_by(|left, right| left.created_at.cmp(&right.created_at));
        Ok(approved)
    }

    async fn insert(
        &self,
        row: NewCommentRow,
        principal: Option<&Principal>,
    ) -> Result<Comment, StoreError> {
        self.begin_call().await?;
        // Insert policy: a signed-in user may only create rows as themselves,
        // anonymous rows carry no user id.
        let acting = principal.map(|principal| principal.user_id.as_str());
        if row.user_id.as_deref() != acting {
            return Err(StoreError::Forbidden("user_id does not match session".to_string()));
        }

        let comment = Comment {
            id: uuid::Uuid::new_v4().to_string(),
            article_id: row.article_id,
            author_name: row.author_name,
            author_email: row.author_email,
            user_id: row.user_id,
            content: row.content,
            status: row.status,
            parent_id: row.parent_id,
            created_at: self.next_created_at().await,
        };
        self.rows.write().await.push(comment.clone());
        Ok(comment)
    }

    async fn update_content(
        &self,
        comment_id: &str,
        content: &str,
        principal: &Principal,
    ) -> Result<Option<Comment>, StoreError> {
        self.begin_call().await?;
        let mut rows = self.rows.write().await;
        let updated = rows
            .iter_mut()
            .find(|row| row.id == comment_id && owns(row, principal))
            .map(|row| {
                row.content = content.to_string();
                row.clone()
            });
        Ok(updated)
    }

    async fn delete(&self, comment_id: &str, principal: &Principal) -> Result<bool, StoreError> {
        self.begin_call().await?;
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| !(row.id == comment_id && owns(row, principal)));
        Ok(rows.len() != before)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryCommentStore {
    async fn lookup(&self, access_token: &str) -> Result<Option<Principal>, StoreError> {
        Ok(self
            .tokens
            .read()
            .await
            .get(access_token)
            .map(|user_id| Principal::new(user_id.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryCommentStore;
    use crate::{
        comments::{CommentStatus, NewCommentRow, Principal},
        comments_store::{CommentStore, IdentityProvider},
        error::StoreError,
    };

    fn row(user_id: Option<&str>) -> NewCommentRow {
        NewCommentRow {
            article_id: "a1".to_string(),
            author_name: None,
            author_email: None,
            user_id: user_id.map(str::to_string),
            content: "Nice guide".to_string(),
            status: CommentStatus::Pending,
            parent_id: None,
        }
    }

    #[tokio::test]
    async fn inserts_get_increasing_timestamps() {
        let store = InMemoryCommentStore::new();
        let first = store.insert(row(None), None).await.unwrap();
        let second = store.insert(row(None), None).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(second.created_at > first.created_at);
    }

    #[tokio::test]
    async fn insert_as_someone_else_is_forbidden() {
        let store = InMemoryCommentStore::new();
        let principal = Principal::new("user-1");

        let err = store.insert(row(Some("user-2")), Some(&principal)).await;
        assert!(matches!(err, Err(StoreError::Forbidden(_))));
        assert!(store.rows().await.is_empty());
    }

    #[tokio::test]
    async fn select_only_returns_approved_rows_of_article() {
        let store = InMemoryCommentStore::new();
        let kept = store.insert(row(None), None).await.unwrap();
        let pending = store.insert(row(None), None).await.unwrap();
        store.set_status(&kept.id, CommentStatus::Approved).await;

        let approved = store.select_approved("a1").await.unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, kept.id);
        assert_ne!(approved[0].id, pending.id);
        assert!(store.select_approved("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_only_touch_owned_rows() {
        let store = InMemoryCommentStore::new();
        let owner = Principal::new("owner");
        let stranger = Principal::new("stranger");
        let created = store.insert(row(Some("owner")), Some(&owner)).await.unwrap();

        assert_eq!(store.update_content(&created.id, "hijack", &stranger).await, Ok(None));
        assert!(!store.delete(&created.id, &stranger).await.unwrap());

        let updated = store
            .update_content(&created.id, "Edited", &owner)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.content, "Edited");
        assert!(store.delete(&created.id, &owner).await.unwrap());
        assert!(store.get(&created.id).await.is_none());
    }

    #[tokio::test]
    async fn injected_failure_applies_once() {
        let store = InMemoryCommentStore::new();
        store
            .fail_next_call(StoreError::Transport("offline".to_string()))
            .await;

        assert!(store.select_approved("a1").await.is_err());
        assert!(store.select_approved("a1").await.is_ok());
        assert_eq!(store.call_count(), 2);
    }

    #[tokio::test]
    async fn registered_tokens_resolve() {
        let store = InMemoryCommentStore::new();
        store.register_token("tok", "user-9").await;

        let principal = store.lookup("tok").await.unwrap().unwrap();
        assert_eq!(principal.user_id, "user-9");
        assert_eq!(store.lookup("nope").await, Ok(None));
    }
}
