//! Comment lifecycle: validated reads and writes against the row store.
//!
//! Each operation issues exactly one store call (plus at most one identity
//! lookup) and is never retried here. Callers re-fetch after a write.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    comment_tree::{build_comment_tree, count_nodes},
    comments::{
        normalize_optional_text, Comment, CommentDraft, CommentNode, CommentStatus, NewCommentRow,
        Principal, MAX_COMMENT_CHARS,
    },
    comments_store::{CommentStore, SessionProvider},
    error::{CommentError, StoreError},
};

/// Forest plus the failure notice, for callers that always render something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentListing {
    /// Reply forest; empty when the fetch failed.
    pub comments: Vec<CommentNode>,
    /// Number of comments in the forest, replies included.
    pub total: usize,
    /// Reader-facing notice when the fetch failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Entry point for every comment read and write. Cheap to clone; holds the
/// injected store and the session of the current caller.
#[derive(Clone)]
pub struct CommentManager {
    store: Arc<dyn CommentStore>,
    session: Arc<dyn SessionProvider>,
}

impl CommentManager {
    /// Manager acting as whoever `session` resolves to.
    pub fn new(store: Arc<dyn CommentStore>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            store,
            session,
        }
    }

    /// Approved comments of an article as a reply forest.
    pub async fn list_approved(&self, article_id: &str) -> Result<Vec<CommentNode>, CommentError> {
        let comments = self
            .store
            .select_approved(article_id.trim())
            .await
            .map_err(|err| {
                warn!("failed to fetch comments for article {article_id}: {err}");
                CommentError::Fetch(err)
            })?;
        Ok(build_comment_tree(comments))
    }

    /// Like [`CommentManager::list_approved`], but a failed fetch becomes an
    /// empty forest carrying the reader-facing notice.
    pub async fn list_approved_or_empty(&self, article_id: &str) -> CommentListing {
        match self.list_approved(article_id).await {
            Ok(comments) => CommentListing {
                total: count_nodes(&comments),
                comments,
                error: None,
            },
            Err(err) => CommentListing {
                comments: Vec::new(),
                total: 0,
                error: Some(err.user_message()),
            },
        }
    }

    /// Submits a new comment. It is always stored as pending.
    pub async fn post(&self, draft: CommentDraft) -> Result<Comment, CommentError> {
        let article_id = draft.article_id.trim().to_string();
        if article_id.is_empty() {
            return Err(CommentError::validation("article reference is required"));
        }
        let content = validate_content(&draft.content)?;
        let author_email = normalize_optional_text(draft.author_email);
        if let Some(email) = author_email.as_deref() {
            validate_email(email)?;
        }

        let principal = self.principal().await?;
        let row = NewCommentRow {
            article_id,
            author_name: normalize_optional_text(draft.author_name),
            author_email,
            user_id: principal.as_ref().map(|principal| principal.user_id.clone()),
            content,
            status: CommentStatus::Pending,
            parent_id: normalize_optional_text(draft.parent_id),
        };

        let created = self
            .store
            .insert(row, principal.as_ref())
            .await
            .map_err(|err| {
                warn!("failed to insert comment: {err}");
                CommentError::Store(err)
            })?;
        info!(
            "comment {} submitted for article {} (reply_to={:?})",
            created.id, created.article_id, created.parent_id
        );
        Ok(created)
    }

    /// Replaces the body of a comment owned by the current principal.
    pub async fn update(&self, comment_id: &str, content: &str) -> Result<Comment, CommentError> {
        let principal = self.require_principal().await?;
        let content = validate_content(content)?;

        match self
            .store
            .update_content(comment_id, &content, &principal)
            .await
        {
            Ok(Some(updated)) => {
                info!("comment {comment_id} edited by {}", principal.user_id);
                Ok(updated)
            },
            Ok(None) | Err(StoreError::Forbidden(_)) => {
                warn!("edit of comment {comment_id} by {} rejected", principal.user_id);
                Err(CommentError::Authorization)
            },
            Err(err) => {
                warn!("failed to edit comment {comment_id}: {err}");
                Err(CommentError::Store(err))
            },
        }
    }

    /// Removes a comment owned by the current principal. Replies are left in
    /// place and surface as roots on the next fetch.
    pub async fn delete(&self, comment_id: &str) -> Result<(), CommentError> {
        let principal = self.require_principal().await?;

        match self.store.delete(comment_id, &principal).await {
            Ok(true) => {
                info!("comment {comment_id} deleted by {}", principal.user_id);
                Ok(())
            },
            Ok(false) | Err(StoreError::Forbidden(_)) => {
                warn!("delete of comment {comment_id} by {} rejected", principal.user_id);
                Err(CommentError::Authorization)
            },
            Err(err) => {
                warn!("failed to delete comment {comment_id}: {err}");
                Err(CommentError::Store(err))
            },
        }
    }

    async fn principal(&self) -> Result<Option<Principal>, CommentError> {
        self.session.current_principal().await.map_err(|err| {
            warn!("failed to resolve session: {err}");
            CommentError::Store(err)
        })
    }

    async fn require_principal(&self) -> Result<Principal, CommentError> {
        self.principal().await?.ok_or(CommentError::AuthRequired)
    }
}

fn validate_content(raw: &str) -> Result<String, CommentError> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(CommentError::validation("comment cannot be empty"));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(CommentError::validation(format!(
            "comment cannot be longer than {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(content.to_string())
}

fn validate_email(email: &str) -> Result<(), CommentError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !email.chars().any(char::is_whitespace)
        },
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CommentError::validation("email address is not valid"))
    }
}
