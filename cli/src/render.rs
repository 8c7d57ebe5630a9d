//! Offline tree building from exported rows and plain-text rendering.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use howto_shared::{build_comment_tree, Comment, CommentNode, CommentStatus};

const INDENT: &str = "  ";
const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Reads a JSON array of comment rows as exported from the store.
pub fn load_rows(path: &Path) -> Result<Vec<Comment>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read comment rows from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse comment rows in {}", path.display()))
}

/// Applies the same contract the live store gives the tree builder: approved
/// rows only, oldest first.
pub fn build_approved_forest(rows: Vec<Comment>) -> Vec<CommentNode> {
    let mut approved: Vec<Comment> = rows
        .into_iter()
        .filter(|comment| comment.status == CommentStatus::Approved)
        .collect();
    approved.sort_by_key(|comment| comment.created_at);
    build_comment_tree(approved)
}

/// One line per comment, replies indented under their parent.
pub fn render_text(forest: &[CommentNode]) -> String {
    if forest.is_empty() {
        return "No comments yet.\n".to_string();
    }

    let mut out = String::new();
    let mut stack: Vec<(usize, &CommentNode)> =
        forest.iter().rev().map(|node| (0, node)).collect();
    while let Some((depth, node)) = stack.pop() {
        out.push_str(&INDENT.repeat(depth));
        out.push_str(&render_line(node));
        out.push('\n');
        stack.extend(node.replies.iter().rev().map(|reply| (depth + 1, reply)));
    }
    out
}

fn render_line(node: &CommentNode) -> String {
    let comment = &node.comment;
    let author = comment
        .author_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(ANONYMOUS_AUTHOR);
    let content = comment.content.split_whitespace().collect::<Vec<_>>().join(" ");
    format!(
        "- {author} [{}] {}: {content}",
        comment.id,
        comment.created_at.format("%Y-%m-%d %H:%M")
    )
}
