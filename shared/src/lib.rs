//! Comment threads for the HowTo Naija article site.
//!
//! Approved comments are fetched from the hosted row store, rebuilt into a
//! reply forest and handed to whatever renders them. Writes go through
//! [`comment_service::CommentManager`], which enforces validation, the
//! always-pending rule and owner-only edits.

pub mod comment_service;
pub mod comment_tree;
pub mod comments;
pub mod comments_store;
pub mod config;
pub mod error;
pub mod logging;
pub mod memory_store;
pub mod supabase_store;

pub use comment_service::{CommentListing, CommentManager};
pub use comment_tree::build_comment_tree;
pub use comments::{Comment, CommentDraft, CommentNode, CommentStatus, Principal};
pub use error::{CommentError, StoreError};
