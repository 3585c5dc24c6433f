//! Subscriber registry.
//!
//! Registrations live in a trie that mirrors the shape of the subscribed
//! paths: every node holds the subscribers registered exactly at its path
//! plus one child per next segment. A node is pruned as soon as neither it
//! nor any descendant holds a registration.
//!
//! ```text
//! root [s1]
//! └── "a" [s2]
//!     ├── "b" [s3]
//!     └── "d"
//!         └── 0 [s4]
//! ```
//!
//! A change at `a.d` reaches `s1` and `s2` (ancestors), nothing at `a.d`
//! itself, and `s4` (descendant). `s3` sits in a sibling subtree.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use pathstore_path::{Path, Segment};

use crate::Notification;

/// A registered callback. Identity (`Rc` pointer) is what dedups a callback
/// registered at several paths touched by the same change.
pub type Subscriber = Rc<dyn Fn(&Notification)>;

/// Identifies one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct Entry {
    id: SubscriptionId,
    callback: Subscriber,
}

#[derive(Clone, Default)]
struct Node {
    entries: Vec<Entry>,
    children: IndexMap<Segment, Node>,
}

impl Node {
    fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.children.is_empty()
    }

    fn remove(&mut self, path: &[Segment], id: SubscriptionId) -> bool {
        let Some((head, rest)) = path.split_first() else {
            let before = self.entries.len();
            self.entries.retain(|entry| entry.id != id);
            return self.entries.len() != before;
        };
        let head = slot(head);
        let Some(child) = self.children.get_mut(&head) else {
            return false;
        };
        let removed = child.remove(rest, id);
        if removed && child.is_empty() {
            self.children.shift_remove(&head);
        }
        removed
    }

    fn collect_subtree(&self, out: &mut Collector) {
        for child in self.children.values() {
            out.extend(&child.entries);
            child.collect_subtree(out);
        }
    }

    fn collect_paths(&self, prefix: &mut Vec<Segment>, out: &mut Vec<(Path, usize)>) {
        if !self.entries.is_empty() {
            out.push((Path::from(prefix.as_slice()), self.entries.len()));
        }
        for (segment, child) in &self.children {
            prefix.push(segment.clone());
            child.collect_paths(prefix, out);
            prefix.pop();
        }
    }
}

/// Trie key for a segment. `Key("0")` and `Index(0)` address the same slot
/// and must share a node.
fn slot(segment: &Segment) -> Segment {
    match segment {
        Segment::Key(key) => Segment::from_token(key),
        Segment::Index(idx) => Segment::Index(*idx),
    }
}

/// Accumulates callbacks, skipping any already seen.
#[derive(Default)]
struct Collector {
    seen: HashSet<*const ()>,
    out: Vec<Subscriber>,
}

impl Collector {
    fn extend(&mut self, entries: &[Entry]) {
        for entry in entries {
            let key = Rc::as_ptr(&entry.callback) as *const ();
            if self.seen.insert(key) {
                self.out.push(Rc::clone(&entry.callback));
            }
        }
    }
}

/// Trie of subscribers keyed by path segment.
#[derive(Clone, Default)]
pub struct Registry {
    root: Node,
    next_id: u64,
    len: usize,
}

impl Registry {
    /// Registry with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `callback` to the list at `path`.
    pub fn register(&mut self, path: &Path, callback: Subscriber) -> SubscriptionId {
        self.next_id = self.next_id.saturating_add(1);
        let id = SubscriptionId(self.next_id);
        let mut node = &mut self.root;
        for segment in path {
            node = node.children.entry(slot(segment)).or_default();
        }
        node.entries.push(Entry { id, callback });
        self.len += 1;
        id
    }

    /// Removes exactly one registration. Returns `false` when it is already
    /// gone, which is not an error.
    pub fn unregister(&mut self, path: &Path, id: SubscriptionId) -> bool {
        let removed = self.root.remove(path.segments(), id);
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Every subscriber a change at `path` must reach, each once.
    ///
    /// Ancestors come first in root-to-leaf order, then the subscribers at
    /// `path`, then the whole subtree below it depth-first.
    pub fn subscribers_for(&self, path: &Path) -> Vec<Subscriber> {
        let mut collector = Collector::default();
        let mut node = &self.root;
        collector.extend(&node.entries);
        for segment in path {
            match node.children.get(&slot(segment)) {
                Some(child) => node = child,
                None => return collector.out,
            }
            collector.extend(&node.entries);
        }
        node.collect_subtree(&mut collector);
        collector.out
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of registrations exactly at `path`.
    pub fn count_at(&self, path: &Path) -> usize {
        let mut node = &self.root;
        for segment in path {
            match node.children.get(&slot(segment)) {
                Some(child) => node = child,
                None => return 0,
            }
        }
        node.entries.len()
    }

    /// Every path holding at least one registration, with its count.
    pub fn paths(&self) -> Vec<(Path, usize)> {
        let mut out = Vec::new();
        self.root.collect_paths(&mut Vec::new(), &mut out);
        out
    }

    /// Number of trie nodes below the root.
    pub fn node_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            node.children.values().map(|child| 1 + count(child)).sum()
        }
        count(&self.root)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (path, count) in self.paths() {
            map.entry(&path.to_pointer(), &count);
        }
        map.finish()
    }
}
