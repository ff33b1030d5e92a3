//! Call-tree reconstruction
//!
//! Turns the flat, parent-referencing event list of one request into an
//! ordered hierarchy.
//!
//! ## Design
//!
//! 1. **Index**: one pass maps event id → slot. A repeated id keeps its
//!    first occurrence; later copies are reported as duplicates.
//! 2. **Link**: a second pass classifies every event as a root (no parent),
//!    a child (parent present) or an orphan (parent absent). Orphans are
//!    not attached and are not an error.
//! 3. **Order**: siblings are sorted by ascending `start`. Untimed siblings
//!    follow the timed ones in arrival order. The comparator is a total
//!    order (`f64::total_cmp`) so sorting never panics.
//! 4. **Assemble**: trees are built bottom-up with an explicit stack, so a
//!    long parent chain cannot overflow the call stack. `TraceTree` also
//!    drops, clones, compares and serializes iteratively.
//!
//! Events that are neither reachable from a root nor from an orphan sit on
//! a parent cycle and are reported by id.
//!
//! Identical input always yields an identical structure.

use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use tracedb_core::TraceEvent;

// ========== TraceTree ==========

/// An event with its ordered children
///
/// Serializes flat, in display order, as `[{"depth": 0, "event": {..}}, ..]`.
pub struct TraceTree {
    /// The event at this node
    pub event: TraceEvent,
    /// Direct children, ascending by `start`
    pub children: Vec<TraceTree>,
}

impl TraceTree {
    fn leaf(event: TraceEvent) -> Self {
        Self {
            event,
            children: Vec::new(),
        }
    }

    /// Depth-first traversal in display order, yielding `(depth, event)`
    ///
    /// The node itself has depth 0.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: vec![(0, self)],
        }
    }

    /// Number of events in this tree
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Number of levels; a leaf has depth 1
    pub fn depth(&self) -> usize {
        self.iter().map(|(depth, _)| depth + 1).max().unwrap_or(1)
    }

    /// Find an event by id
    pub fn find(&self, id: &str) -> Option<&TraceEvent> {
        self.iter().map(|(_, e)| e).find(|e| e.id == id)
    }
}

/// Move every open node deeper than `depth - 1` into its parent
fn close_to(root: &mut TraceTree, open: &mut Vec<TraceTree>, depth: usize) {
    while open.len() >= depth {
        let Some(done) = open.pop() else { break };
        match open.last_mut() {
            Some(parent) => parent.children.push(done),
            None => root.children.push(done),
        }
    }
}

impl Clone for TraceTree {
    fn clone(&self) -> Self {
        let mut root = TraceTree::leaf(self.event.clone());
        // open[i] is the node currently being filled at depth i + 1
        let mut open: Vec<TraceTree> = Vec::new();
        for (depth, event) in self.iter().skip(1) {
            close_to(&mut root, &mut open, depth);
            open.push(TraceTree::leaf(event.clone()));
        }
        close_to(&mut root, &mut open, 1);
        root
    }
}

impl PartialEq for TraceTree {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl fmt::Debug for TraceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|(depth, event)| (depth, &event.id)))
            .finish()
    }
}

#[derive(Serialize)]
struct FlatNode<'a> {
    depth: usize,
    event: &'a TraceEvent,
}

impl Serialize for TraceTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(|(depth, event)| FlatNode { depth, event }))
    }
}

impl Drop for TraceTree {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Depth-first iterator over a [`TraceTree`]
#[derive(Debug)]
pub struct Iter<'a> {
    stack: Vec<(usize, &'a TraceTree)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (usize, &'a TraceEvent);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, &node.event))
    }
}

// ========== Root Selection ==========

/// How many root events a request has
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootSelection {
    /// Exactly one root
    Single,
    /// More than one root; the last one in input order is selected
    Multiple(usize),
    /// No event without a parent
    Empty,
}

impl RootSelection {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            RootSelection::Single => "single",
            RootSelection::Multiple(_) => "multiple",
            RootSelection::Empty => "none",
        }
    }
}

// ========== TraceForest ==========

/// Every tree reconstructible from one request's events, plus diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct TraceForest {
    roots: Vec<TraceTree>,
    detached: Vec<TraceTree>,
    cycles: Vec<String>,
    duplicates: Vec<String>,
    event_count: usize,
}

/// Sibling order: timed by `start` ascending, then untimed
fn start_order(a: &TraceEvent, b: &TraceEvent) -> Ordering {
    match (a.start, b.start) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl TraceForest {
    /// Reconstruct all trees from a flat list of events
    pub fn build(events: Vec<TraceEvent>) -> Self {
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        let mut slots: Vec<Option<TraceEvent>> = Vec::with_capacity(events.len());
        let mut duplicates = Vec::new();

        for event in events {
            if index.contains_key(&event.id) {
                duplicates.push(event.id);
                continue;
            }
            index.insert(event.id.clone(), slots.len());
            slots.push(Some(event));
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];
        let mut root_slots = Vec::new();
        let mut orphan_slots = Vec::new();
        for (slot, event) in slots.iter().enumerate() {
            let Some(event) = event else { continue };
            match event.parent_id.as_deref() {
                None => root_slots.push(slot),
                Some(parent) => match index.get(parent) {
                    Some(&parent_slot) => children[parent_slot].push(slot),
                    None => orphan_slots.push(slot),
                },
            }
        }

        for siblings in children.iter_mut() {
            siblings.sort_by(|&a, &b| match (&slots[a], &slots[b]) {
                (Some(a), Some(b)) => start_order(a, b),
                _ => Ordering::Equal,
            });
        }

        let event_count = slots.len();
        let roots: Vec<TraceTree> = root_slots
            .into_iter()
            .filter_map(|slot| assemble(slot, &children, &mut slots))
            .collect();
        let detached: Vec<TraceTree> = orphan_slots
            .into_iter()
            .filter_map(|slot| assemble(slot, &children, &mut slots))
            .collect();

        // Anything not consumed by assembly is on, or hangs off, a cycle
        let cycles = slots.into_iter().flatten().map(|e| e.id).collect();

        Self {
            roots,
            detached,
            cycles,
            duplicates,
            event_count,
        }
    }

    /// Trees rooted at events without a parent, in input order
    pub fn roots(&self) -> &[TraceTree] {
        &self.roots
    }

    /// Subtrees whose top event references a parent that is not present
    pub fn detached(&self) -> &[TraceTree] {
        &self.detached
    }

    /// Ids of events unreachable because of a parent cycle
    pub fn cycle_ids(&self) -> &[String] {
        &self.cycles
    }

    /// Ids that appeared more than once; later copies were ignored
    pub fn duplicate_ids(&self) -> &[String] {
        &self.duplicates
    }

    /// Distinct events in the input
    pub fn event_count(&self) -> usize {
        self.event_count
    }

    /// Shape of the root set
    pub fn root_selection(&self) -> RootSelection {
        match self.roots.len() {
            0 => RootSelection::Empty,
            1 => RootSelection::Single,
            n => RootSelection::Multiple(n),
        }
    }

    /// The root used for display: the last root in input order
    pub fn selected_root(&self) -> Option<&TraceTree> {
        self.roots.last()
    }

    /// Take the selected root
    pub fn into_selected_root(mut self) -> Option<TraceTree> {
        self.roots.pop()
    }

    /// Events not reachable from the selected root
    pub fn unattached_count(&self) -> usize {
        let attached = self.selected_root().map_or(0, TraceTree::node_count);
        self.event_count - attached
    }
}

/// Build the subtree under `top` bottom-up, moving events out of `slots`
fn assemble(
    top: usize,
    children: &[Vec<usize>],
    slots: &mut [Option<TraceEvent>],
) -> Option<TraceTree> {
    let mut stack: Vec<(usize, usize)> = vec![(top, 0)];
    let mut built: Vec<TraceTree> = Vec::new();

    while let Some(frame) = stack.last_mut() {
        let (slot, next_child) = *frame;
        if next_child < children[slot].len() {
            frame.1 += 1;
            stack.push((children[slot][next_child], 0));
            continue;
        }

        stack.pop();
        let kids = built.split_off(built.len().saturating_sub(children[slot].len()));
        if let Some(event) = slots[slot].take() {
            built.push(TraceTree {
                event,
                children: kids,
            });
        }
    }

    built.pop()
}

/// Reconstruct the call tree of one request
///
/// Returns the root tree, or `None` if no event lacks a parent. With more
/// than one root the last one in input order is returned; use
/// [`TraceForest`] to detect that case.
pub fn build_tree(events: Vec<TraceEvent>) -> Option<TraceTree> {
    TraceForest::build(events).into_selected_root()
}
