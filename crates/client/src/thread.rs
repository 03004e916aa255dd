//! Nesting of the flat comment list returned by the server.

use std::collections::HashMap;

use crate::types::Comment;

/// A comment and its replies, in server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    pub comment: Comment,
    pub depth: usize,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// This node and all descendants, depth-first.
    pub fn walk(&self) -> Vec<&CommentNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.replies.iter().rev());
        }
        out
    }
}

// Reply chains can be arbitrarily deep; unlink them without recursing.
impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

struct Slot {
    idx: usize,
    depth: usize,
    children: Vec<usize>,
}

/// Build the reply tree.
///
/// Roots are comments without a parent. A comment whose parent is not in
/// `comments` is dropped, and each comment is placed at most once even if the
/// server repeats an id. Runs in constant stack space whatever the depth.
pub fn build_thread(comments: &[Comment]) -> Vec<CommentNode> {
    let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (idx, c) in comments.iter().enumerate() {
        match c.parent_id.as_deref().filter(|p| !p.is_empty()) {
            Some(parent) => children.entry(parent).or_default().push(idx),
            None => roots.push(idx),
        }
    }

    // Pre-order layout: every child slot comes after its parent's.
    let mut placed = vec![false; comments.len()];
    let mut slots: Vec<Slot> = Vec::new();
    let mut root_slots = Vec::new();
    let mut stack: Vec<(usize, usize, Option<usize>)> =
        roots.into_iter().rev().map(|idx| (idx, 0, None)).collect();
    while let Some((idx, depth, parent)) = stack.pop() {
        if std::mem::replace(&mut placed[idx], true) {
            continue;
        }
        let slot = slots.len();
        slots.push(Slot {
            idx,
            depth,
            children: Vec::new(),
        });
        match parent {
            Some(p) => slots[p].children.push(slot),
            None => root_slots.push(slot),
        }
        if let Some(ids) = children.get(comments[idx].id.as_str()) {
            stack.extend(ids.iter().rev().map(|&child| (child, depth + 1, Some(slot))));
        }
    }

    // Assemble bottom-up so replies are complete before their parent.
    let mut built: Vec<Option<CommentNode>> = Vec::with_capacity(slots.len());
    built.resize_with(slots.len(), || None);
    for (slot, entry) in slots.iter().enumerate().rev() {
        let replies = entry
            .children
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[slot] = Some(CommentNode {
            comment: comments[entry.idx].clone(),
            depth: entry.depth,
            replies,
        });
    }

    root_slots
        .into_iter()
        .filter_map(|slot| built[slot].take())
        .collect()
}
