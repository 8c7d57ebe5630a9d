//! Seams between the lifecycle manager and the hosted backend.
//!
//! The manager never talks to a concrete client; it is handed an
//! `Arc<dyn CommentStore>` and an `Arc<dyn SessionProvider>` so tests can
//! substitute fakes.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    comments::{Comment, NewCommentRow, Principal},
    error::StoreError,
};

/// Row store holding comments. Ownership rules for writes are evaluated by the
/// store itself; implementations must not second-guess them.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Approved comments of one article, ascending by `created_at`.
    async fn select_approved(&self, article_id: &str) -> Result<Vec<Comment>, StoreError>;

    /// Inserts one row and returns it with the store-assigned `id` and
    /// `created_at`.
    async fn insert(
        &self,
        row: NewCommentRow,
        principal: Option<&Principal>,
    ) -> Result<Comment, StoreError>;

    /// Updates `content` of one row. `Ok(None)` means no row was affected,
    /// i.e. the ownership policy filtered it out or it does not exist.
    async fn update_content(
        &self,
        comment_id: &str,
        content: &str,
        principal: &Principal,
    ) -> Result<Option<Comment>, StoreError>;

    /// Deletes one row. `Ok(false)` means no row was affected.
    async fn delete(&self, comment_id: &str, principal: &Principal) -> Result<bool, StoreError>;
}

/// Looks up who owns an access token.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` for expired or unknown tokens.
    async fn lookup(&self, access_token: &str) -> Result<Option<Principal>, StoreError>;
}

/// The acting principal of the current request, if any.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// `Ok(None)` when nobody is signed in. May consult the identity service.
    async fn current_principal(&self) -> Result<Option<Principal>, StoreError>;
}

/// Session fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct FixedSession(Option<Principal>);

impl FixedSession {
    /// Nobody signed in.
    pub fn anonymous() -> Self {
        Self(None)
    }

    /// Always acts as `principal`.
    pub fn signed_in(principal: Principal) -> Self {
        Self(Some(principal))
    }
}

#[async_trait]
impl SessionProvider for FixedSession {
    async fn current_principal(&self) -> Result<Option<Principal>, StoreError> {
        Ok(self.0.clone())
    }
}

/// Session derived from a bearer token. The identity service is only
/// consulted when a token is present and a caller actually asks.
#[derive(Clone)]
pub struct TokenSession {
    identity: Arc<dyn IdentityProvider>,
    access_token: Option<String>,
}

impl TokenSession {
    /// Blank tokens are treated as absent.
    pub fn new(identity: Arc<dyn IdentityProvider>, access_token: Option<String>) -> Self {
        let access_token = access_token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());
        Self {
            identity,
            access_token,
        }
    }
}

#[async_trait]
impl SessionProvider for TokenSession {
    async fn current_principal(&self) -> Result<Option<Principal>, StoreError> {
        let Some(token) = self.access_token.as_deref() else {
            return Ok(None);
        };
        let principal = self.identity.lookup(token).await?;
        if principal.is_none() {
            tracing::debug!("access token did not resolve to a principal");
        }
        Ok(principal.map(|principal| principal.with_access_token(token)))
    }
}
