//! Comment data model shared by the store, the lifecycle manager and the
//! presentation surfaces.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored status of a comment awaiting moderation.
pub const COMMENT_STATUS_PENDING: &str = "pending";
/// Stored status of a comment visible to readers.
pub const COMMENT_STATUS_APPROVED: &str = "approved";
/// Stored status of a comment hidden by a moderator.
pub const COMMENT_STATUS_REJECTED: &str = "rejected";

/// Upper bound on comment body length, counted in characters.
pub const MAX_COMMENT_CHARS: usize = 5000;

/// Moderation state of a comment. Only [`CommentStatus::Approved`] comments
/// are ever shown to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    /// Freshly submitted, awaiting moderation.
    Pending,
    /// Visible to readers.
    Approved,
    /// Hidden by a moderator.
    Rejected,
}

impl CommentStatus {
    /// Wire representation used by the row store.
    pub fn as_str(self) -> &'static str {
        match self {
            CommentStatus::Pending => COMMENT_STATUS_PENDING,
            CommentStatus::Approved => COMMENT_STATUS_APPROVED,
            CommentStatus::Rejected => COMMENT_STATUS_REJECTED,
        }
    }

    /// Moves a moderation capability is allowed to make. Nothing in this
    /// crate performs them; approval is owned by the back office.
    pub fn can_transition_to(self, next: CommentStatus) -> bool {
        matches!(
            (self, next),
            (CommentStatus::Pending, CommentStatus::Approved | CommentStatus::Rejected)
        )
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status string from the store is not one we know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown comment status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for CommentStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            COMMENT_STATUS_PENDING => Ok(CommentStatus::Pending),
            COMMENT_STATUS_APPROVED => Ok(CommentStatus::Approved),
            COMMENT_STATUS_REJECTED => Ok(CommentStatus::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One stored remark on one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Store-assigned identifier, opaque to this crate.
    pub id: String,
    /// Article (guide) the comment belongs to.
    pub article_id: String,
    /// Display name given at submission, if any.
    pub author_name: Option<String>,
    /// Contact address given at submission, if any.
    pub author_email: Option<String>,
    /// Owning account; `None` for anonymous comments.
    pub user_id: Option<String>,
    /// Comment body.
    pub content: String,
    /// Moderation state.
    pub status: CommentStatus,
    /// Comment this one replies to; `None` for top-level comments.
    pub parent_id: Option<String>,
    /// Store-assigned creation time.
    pub created_at: DateTime<Utc>,
}

/// What a reader submits. Status and `user_id` are deliberately absent: the
/// lifecycle manager decides both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDraft {
    /// Article being commented on. Required.
    pub article_id: String,
    /// Comment body. Trimmed and length-checked before insert.
    pub content: String,
    /// Optional display name.
    #[serde(default)]
    pub author_name: Option<String>,
    /// Optional contact address.
    #[serde(default)]
    pub author_email: Option<String>,
    /// Comment being replied to. Blank counts as none.
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Row handed to [`crate::comments_store::CommentStore::insert`]. The store
/// fills in `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCommentRow {
    /// See [`Comment::article_id`].
    pub article_id: String,
    /// See [`Comment::author_name`].
    pub author_name: Option<String>,
    /// See [`Comment::author_email`].
    pub author_email: Option<String>,
    /// Acting principal's user id, or `None` when anonymous.
    pub user_id: Option<String>,
    /// Validated, trimmed body.
    pub content: String,
    /// Always [`CommentStatus::Pending`] for reader submissions.
    pub status: CommentStatus,
    /// See [`Comment::parent_id`].
    pub parent_id: Option<String>,
}

/// Comment plus its nested replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentNode {
    /// The comment itself, serialized inline.
    #[serde(flatten)]
    pub comment: Comment,
    /// Direct replies, in input order.
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Leaf node with no replies yet.
    pub fn new(comment: Comment) -> Self {
        Self {
            comment,
            replies: Vec::new(),
        }
    }

    /// Shorthand for `self.comment.id`.
    pub fn id(&self) -> &str {
        &self.comment.id
    }
}

// Frees replies from a heap stack; drop glue alone recurses once per level.
impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.replies);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.replies);
        }
    }
}

/// Authenticated identity acting on the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Account id as known to the row store.
    pub user_id: String,
    /// Session token forwarded to the hosted store so its row-level policy
    /// sees the same user. Never serialized back out.
    #[serde(skip_serializing, default)]
    pub access_token: Option<String>,
}

impl Principal {
    /// Principal without a forwarded token.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: None,
        }
    }

    /// Attaches the session token that writes are sent with.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

pub(crate) fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [CommentStatus::Pending, CommentStatus::Approved, CommentStatus::Rejected] {
            assert_eq!(status.as_str().parse::<CommentStatus>(), Ok(status));
        }
        assert_eq!(
            "spam".parse::<CommentStatus>(),
            Err(UnknownStatus("spam".to_string()))
        );
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&CommentStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }

    #[test]
    fn only_pending_comments_can_be_moderated() {
        assert!(CommentStatus::Pending.can_transition_to(CommentStatus::Approved));
        assert!(CommentStatus::Pending.can_transition_to(CommentStatus::Rejected));
        assert!(!CommentStatus::Approved.can_transition_to(CommentStatus::Pending));
        assert!(!CommentStatus::Rejected.can_transition_to(CommentStatus::Approved));
        assert!(!CommentStatus::Pending.can_transition_to(CommentStatus::Pending));
    }

    #[test]
    fn principal_token_is_not_serialized() {
        let principal = Principal::new("user-1").with_access_token("secret");
        let json = serde_json::to_string(&principal).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn normalize_optional_text_drops_blank_values() {
        assert_eq!(normalize_optional_text(Some("  ".to_string())), None);
        assert_eq!(normalize_optional_text(Some(" Ada ".to_string())), Some("Ada".to_string()));
        assert_eq!(normalize_optional_text(None), None);
    }
}
