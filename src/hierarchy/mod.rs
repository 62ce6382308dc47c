//! Directory grouping over the flat feed table.
//!
//! Feeds stay a flat list; the tree is an arena of feeds plus a lookup from
//! parent id to child ids. Root-level feeds are indexed under `None`.

use std::collections::{HashMap, HashSet};

use crate::domain::Feed;

#[derive(Debug, Clone, Default)]
pub struct FeedTree {
    feeds: Vec<Feed>,
    index: HashMap<i64, usize>,
    children: HashMap<Option<i64>, Vec<i64>>,
}

impl FeedTree {
    pub fn new(feeds: Vec<Feed>) -> Self {
        let index: HashMap<i64, usize> = feeds
            .iter()
            .enumerate()
            .map(|(pos, feed)| (feed.id, pos))
            .collect();

        let mut children: HashMap<Option<i64>, Vec<i64>> = HashMap::new();
        for feed in &feeds {
            // A dangling parent reference puts the feed back at the root.
            let parent = feed.parent_id.filter(|p| index.contains_key(p));
            children.entry(parent).or_default().push(feed.id);
        }

        Self {
            feeds,
            index,
            children,
        }
    }

    pub fn get(&self, id: i64) -> Option<&Feed> {
        self.index.get(&id).map(|&pos| &self.feeds[pos])
    }

    pub fn feeds(&self) -> &[Feed] {
        &self.feeds
    }

    pub fn roots(&self) -> &[i64] {
        self.children.get(&None).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn children(&self, id: i64) -> &[i64] {
        self.children
            .get(&Some(id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Own unread items for a leaf, sum over children for a directory.
    pub fn unread_count(&self, id: i64) -> usize {
        let mut visited = HashSet::new();
        self.unread_inner(id, &mut visited)
    }

    fn unread_inner(&self, id: i64, visited: &mut HashSet<i64>) -> usize {
        if !visited.insert(id) {
            return 0;
        }
        match self.get(id) {
            Some(feed) if !feed.is_directory() => feed.unread_count(),
            Some(_) => self
                .children(id)
                .iter()
                .map(|&child| self.unread_inner(child, visited))
                .sum(),
            None => 0,
        }
    }

    pub fn total_unread(&self) -> usize {
        self.roots().iter().map(|&id| self.unread_count(id)).sum()
    }

    /// Every leaf in the subtree rooted at `id`, `id` included when it is a leaf.
    pub fn leaves_under(&self, id: i64) -> Vec<i64> {
        let mut leaves = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            match self.get(current) {
                Some(feed) if !feed.is_directory() => leaves.push(current),
                Some(_) => stack.extend(self.children(current).iter().rev()),
                None => {}
            }
        }

        leaves
    }

    /// Depth-first walk yielding `(depth, feed)`, used for tree listings.
    pub fn walk(&self) -> Vec<(usize, &Feed)> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<(usize, i64)> = self.roots().iter().rev().map(|&id| (0, id)).collect();

        while let Some((depth, id)) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(feed) = self.get(id) {
                out.push((depth, feed));
                stack.extend(self.children(id).iter().rev().map(|&c| (depth + 1, c)));
            }
        }

        out
    }
}
