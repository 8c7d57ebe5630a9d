//! Flat list → reply forest.
//!
//! The input is expected to be pre-filtered to approved comments and sorted by
//! `created_at`; the builder trusts that order and never re-sorts. Placement
//! depends only on input order, so the output is deterministic.

use std::collections::HashMap;

use crate::comments::{Comment, CommentNode};

const UNVISITED: u8 = 0;
const ON_PATH: u8 = 1;
const DONE: u8 = 2;

/// Builds the reply forest for one article.
///
/// A comment becomes a root when its `parent_id` is unset, points at an id
/// that is not in the input, or points at itself. A comment is never dropped:
/// if following parents would close a loop, the earliest comment of that loop
/// is promoted to root.
///
/// Construction is iterative, so pathological reply chains do not grow the
/// stack.
pub fn build_comment_tree(comments: Vec<Comment>) -> Vec<CommentNode> {
    let total = comments.len();
    if total == 0 {
        return Vec::new();
    }

    // Pass 1: index every id. The first occurrence of a duplicated id wins.
    let mut index_by_id: HashMap<&str, usize> = HashMap::with_capacity(total);
    for (idx, comment) in comments.iter().enumerate() {
        index_by_id.entry(comment.id.as_str()).or_insert(idx);
    }

    // Pass 2: resolve parents by index.
    let mut parent: Vec<Option<usize>> = comments
        .iter()
        .enumerate()
        .map(|(idx, comment)| {
            comment
                .parent_id
                .as_deref()
                .filter(|&parent_id| parent_id != comment.id)
                .and_then(|parent_id| index_by_id.get(parent_id).copied())
                .filter(|&parent_idx| parent_idx != idx)
        })
        .collect();
    drop(index_by_id);

    break_parent_cycles(&mut parent);

    let mut roots = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); total];
    for (idx, parent_idx) in parent.iter().enumerate() {
        match parent_idx {
            Some(parent_idx) => children[*parent_idx].push(idx),
            None => roots.push(idx),
        }
    }

    // Pre-order over the arena; walking it backwards guarantees every child is
    // materialised before its parent.
    let mut order = Vec::with_capacity(total);
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(idx) = stack.pop() {
        order.push(idx);
        stack.extend(children[idx].iter().rev().copied());
    }

    let mut pending: Vec<Option<Comment>> = comments.into_iter().map(Some).collect();
    let mut built: Vec<Option<CommentNode>> = (0..total).map(|_| None).collect();
    for &idx in order.iter().rev() {
        let Some(comment) = pending[idx].take() else {
            continue;
        };
        let replies = children[idx]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[idx] = Some(CommentNode {
            comment,
            replies,
        });
    }

    roots
        .into_iter()
        .filter_map(|idx| built[idx].take())
        .collect()
}

/// Cuts every loop in the parent graph by detaching the lowest-index member.
/// Each node has at most one parent, so each walk visits a node once overall.
fn break_parent_cycles(parent: &mut [Option<usize>]) {
    let mut state = vec![UNVISITED; parent.len()];
    let mut path = Vec::new();

    for start in 0..parent.len() {
        if state[start] != UNVISITED {
            continue;
        }

        path.clear();
        let mut cursor = Some(start);
        while let Some(idx) = cursor {
            match state[idx] {
                DONE => break,
                ON_PATH => {
                    if let Some(pos) = path.iter().position(|&member| member == idx) {
                        if let Some(&breaker) = path[pos..].iter().min() {
                            parent[breaker] = None;
                        }
                    }
                    break;
                },
                _ => {
                    state[idx] = ON_PATH;
                    path.push(idx);
                    cursor = parent[idx];
                },
            }
        }

        for &idx in &path {
            state[idx] = DONE;
        }
    }
}

/// Total number of nodes in a forest, replies included.
pub fn count_nodes(forest: &[CommentNode]) -> usize {
    let mut count = 0;
    let mut stack: Vec<&CommentNode> = forest.iter().collect();
    while let Some(node) = stack.pop() {
        count += 1;
        stack.extend(node.replies.iter());
    }
    count
}

/// Depth of the deepest node; roots are depth 1 and an empty forest is 0.
pub fn max_depth(forest: &[CommentNode]) -> usize {
    let mut deepest = 0;
    let mut stack: Vec<(&CommentNode, usize)> = forest.iter().map(|node| (node, 1)).collect();
    while let Some((node, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        stack.extend(node.replies.iter().map(|reply| (reply, depth + 1)));
    }
    deepest
}
