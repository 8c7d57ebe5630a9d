//! Typed failures surfaced by the comment lifecycle.

use thiserror::Error;

/// Failure of a single round trip to the row store or identity service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Network-level failure before a response arrived.
    #[error("store unreachable: {0}")]
    Transport(String),
    /// The store's row-level policy refused the request.
    #[error("store rejected request: {0}")]
    Forbidden(String),
    /// Any other non-success response.
    #[error("store returned {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw response body, for logs only.
        body: String,
    },
    /// The response could not be decoded into a known row shape.
    #[error("unexpected store response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

/// Everything a lifecycle operation can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommentError {
    /// Input rejected before any store call.
    #[error("invalid comment: {0}")]
    Validation(String),
    /// Edit or delete attempted without a signed-in principal.
    #[error("sign in required")]
    AuthRequired,
    /// The store refused the write or no owned row matched.
    #[error("not permitted")]
    Authorization,
    /// Reading the approved comments failed.
    #[error("failed to load comments")]
    Fetch(#[source] StoreError),
    /// A write or session lookup failed in transit.
    #[error("comment store request failed")]
    Store(#[source] StoreError),
}

impl CommentError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        CommentError::Validation(message.into())
    }

    /// Notice suitable for showing to a reader.
    pub fn user_message(&self) -> String {
        match self {
            CommentError::Validation(message) => message.clone(),
            CommentError::AuthRequired => "sign in required".to_string(),
            CommentError::Authorization => "not permitted".to_string(),
            CommentError::Fetch(_) => "comments could not be loaded, please try again".to_string(),
            CommentError::Store(_) => "something went wrong, please try again".to_string(),
        }
    }

    /// Store failures are worth retrying; everything else needs the caller to
    /// change something first.
    pub fn is_transient(&self) -> bool {
        matches!(self, CommentError::Fetch(_) | CommentError::Store(_))
    }
}

/// Missing or malformed runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
    /// A variable is set but unusable.
    #[error("environment variable {name} is invalid: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// What was wrong with its value.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::{CommentError, StoreError};

    #[test]
    fn user_messages_hide_store_details() {
        let err = CommentError::Store(StoreError::Http {
            status: 500,
            body: "relation \"comments\" does not exist".to_string(),
        });
        assert!(!err.user_message().contains("relation"));
        assert!(err.is_transient());
    }

    #[test]
    fn auth_errors_have_fixed_notices() {
        assert_eq!(CommentError::AuthRequired.user_message(), "sign in required");
        assert_eq!(CommentError::Authorization.user_message(), "not permitted");
        assert!(!CommentError::AuthRequired.is_transient());
    }

    #[test]
    fn store_error_is_reported_once_as_source() {
        let err = CommentError::Fetch(StoreError::Transport("timed out".to_string()));
        assert_eq!(err.to_string(), "failed to load comments");
        assert_eq!(
            std::error::Error::source(&err).map(ToString::to_string),
            Some("store unreachable: timed out".to_string())
        );

        let chain = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(chain.matches("timed out").count(), 1);
    }
}
