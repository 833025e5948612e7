//! # Memtable
//!
//! An in-memory, sorted, mutable write buffer backed by a skip list.
//!
//! The memtable is the first point of contact for every write operation. It
//! buffers recent mutations in sorted key order so they can later be flushed
//! to immutable on-disk tables (flush policy is the engine's concern, not
//! ours — we only expose [`SkipList::approx_size`] to inform it).
//!
//! ## Key properties
//! - **Sorted order**: entries are always in ascending byte order of key,
//!   regardless of insertion order.
//! - **Expected O(log n)** search and insertion via probabilistic levels.
//! - **Single node per key**: inserting an existing key overwrites its value
//!   in place; the list never holds duplicates.
//! - **Seekable iteration**: a cursor supports `seek_to_first` and
//!   `seek(target)` in addition to forward traversal.
//!
//! ## Example
//! ```rust
//! use memtable::SkipList;
//!
//! let mut list = SkipList::new();
//! list.put(b"hello".to_vec(), b"world".to_vec());
//! assert_eq!(list.get(b"hello"), Some(b"world".as_slice()));
//!
//! let mut it = list.iter();
//! it.seek_to_first();
//! assert!(it.valid());
//! assert_eq!(it.key(), b"hello");
//! ```
//!
//! ## Concurrency
//! The skip list has no internal locking. It is single-writer: a `put`
//! racing any other access could expose a partially spliced node, so callers
//! must serialize mutation externally (Rust's `&mut self` requirement
//! enforces this within safe code).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Maximum number of levels a node can participate in.
pub const MAX_LEVEL: usize = 12;

/// Probability that a node is promoted one level higher during insertion.
const LEVEL_PROBABILITY: f64 = 0.5;

/// A single node in the skip list.
///
/// Nodes live in a contiguous arena (`SkipList::nodes`) and link to each
/// other by arena index rather than by reference, which keeps level splicing
/// a plain `O(1)` index write with no shared mutable aliasing.
#[derive(Debug)]
struct Node {
    key: Vec<u8>,
    value: Vec<u8>,
    /// One forward link per level this node participates in. `None` marks
    /// the end of the chain at that level.
    forward: Vec<Option<usize>>,
}

/// A probabilistic ordered map from byte keys to byte values.
///
/// Each node is assigned a random height drawn from a geometric distribution
/// (coin flips at probability 0.5, capped at [`MAX_LEVEL`]). Level 0 is a
/// sorted linked list containing every entry; each higher level skips over a
/// subset of the level below, giving expected-logarithmic search.
///
/// ```text
/// Level 2:  HEAD ──────────────► c ─────────────► NIL
/// Level 1:  HEAD ──► a ────────► c ──► d ───────► NIL
/// Level 0:  HEAD ──► a ──► b ──► c ──► d ──► e ──► NIL
/// ```
///
/// Keys are compared as raw bytes: lexicographically, with the shorter key
/// sorting first on a tie. The head node at arena index 0 is a sentinel and
/// its key is never compared.
#[derive(Debug)]
pub struct SkipList {
    /// Node arena. Index 0 is the sentinel head.
    nodes: Vec<Node>,
    /// Current effective height, `1..=MAX_LEVEL`. Levels at or above this
    /// are empty chains hanging off the head.
    level: usize,
    len: usize,
    approx_size: usize,
    rng: StdRng,
}

impl SkipList {
    /// Creates an empty skip list seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates an empty skip list with a fixed RNG seed.
    ///
    /// Level assignment is the only source of nondeterminism in the list, so
    /// two lists built with the same seed and the same sequence of `put`
    /// calls end up structurally identical. Intended for tests and
    /// reproducible benchmarks.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let head = Node {
            key: Vec::new(),
            value: Vec::new(),
            forward: vec![None; MAX_LEVEL],
        };
        Self {
            nodes: vec![head],
            level: 1,
            len: 0,
            approx_size: 0,
            rng,
        }
    }

    /// Draws a random height for a new node: start at 1, keep flipping a
    /// fair coin, stop on the first tails or at [`MAX_LEVEL`].
    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < MAX_LEVEL && self.rng.gen_bool(LEVEL_PROBABILITY) {
            level += 1;
        }
        level
    }

    /// Returns the arena index of the last node whose key is strictly less
    /// than `key` (the head if no such node exists).
    ///
    /// Standard skip-list descent: walk forward greedily at the highest
    /// active level, drop a level when the next key is no longer `< key`,
    /// repeat down to level 0.
    fn prev_node(&self, key: &[u8]) -> usize {
        let mut curr = 0;
        for lvl in (0..self.level).rev() {
            while let Some(next) = self.nodes[curr].forward[lvl] {
                if self.nodes[next].key.as_slice() < key {
                    curr = next;
                } else {
                    break;
                }
            }
        }
        curr
    }

    /// Looks up a key, returning its value if present.
    ///
    /// A missing key is an expected outcome and is reported as `None`,
    /// never as an error.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let prev = self.prev_node(key);
        match self.nodes[prev].forward[0] {
            Some(idx) if self.nodes[idx].key.as_slice() == key => {
                Some(self.nodes[idx].value.as_slice())
            }
            _ => None,
        }
    }

    /// Inserts a key-value pair, overwriting in place if the key exists.
    ///
    /// An overwrite touches only the existing node's value: no new node is
    /// allocated, no links move, and `len` is unchanged. A fresh key gets a
    /// node of random height spliced into every level it participates in,
    /// raising the list's effective height if needed.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        // Same descent as get, but record the last node visited at each
        // level — those are the splice points for a new node.
        let mut update = [0usize; MAX_LEVEL];
        let mut curr = 0;
        for lvl in (0..self.level).rev() {
            while let Some(next) = self.nodes[curr].forward[lvl] {
                if self.nodes[next].key < key {
                    curr = next;
                } else {
                    break;
                }
            }
            update[lvl] = curr;
        }

        if let Some(idx) = self.nodes[curr].forward[0] {
            if self.nodes[idx].key == key {
                // Update existing node in place.
                let new_len = value.len();
                let old = std::mem::replace(&mut self.nodes[idx].value, value);
                self.approx_size = self
                    .approx_size
                    .saturating_sub(old.len())
                    .saturating_add(new_len);
                return;
            }
        }

        let new_level = self.random_level();
        if new_level > self.level {
            // Newly exposed levels splice directly off the head.
            update[self.level..new_level].fill(0);
            self.level = new_level;
        }

        let idx = self.nodes.len();
        let mut forward = vec![None; new_level];
        for (lvl, link) in forward.iter_mut().enumerate() {
            *link = self.nodes[update[lvl]].forward[lvl];
        }

        self.approx_size = self
            .approx_size
            .saturating_add(key.len())
            .saturating_add(value.len());
        self.nodes.push(Node { key, value, forward });

        for lvl in 0..new_level {
            self.nodes[update[lvl]].forward[lvl] = Some(idx);
        }
        self.len += 1;
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the approximate byte size of all keys and values stored.
    ///
    /// Tracks key bytes + value bytes but not node or link overhead. An
    /// embedding engine uses this to decide when to flush.
    pub fn approx_size(&self) -> usize {
        self.approx_size
    }

    /// Creates a seekable cursor over the list.
    ///
    /// The cursor starts unpositioned; call [`SkipListIter::seek_to_first`],
    /// [`SkipListIter::seek`], or [`SkipListIter::next`] to position it.
    /// Mutating the list while a cursor exists is prevented by the borrow.
    pub fn iter(&self) -> SkipListIter<'_> {
        SkipListIter {
            list: self,
            curr: None,
        }
    }

    /// Returns a plain [`Iterator`] over `(key, value)` pairs in ascending
    /// key order, for callers that just want to drain the list (e.g. a
    /// flush routine).
    pub fn entries(&self) -> Entries<'_> {
        Entries {
            list: self,
            curr: self.nodes[0].forward[0],
        }
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

/// A seekable cursor over a [`SkipList`], in ascending key order.
///
/// The cursor either references a live entry (`valid() == true`) or sits
/// off the end / unpositioned. [`key`](SkipListIter::key) and
/// [`value`](SkipListIter::value) may only be called while valid.
#[derive(Debug)]
pub struct SkipListIter<'a> {
    list: &'a SkipList,
    curr: Option<usize>,
}

impl<'a> SkipListIter<'a> {
    /// Positions the cursor at the lowest-keyed entry, or invalidates it if
    /// the list is empty.
    pub fn seek_to_first(&mut self) {
        self.curr = self.list.nodes[0].forward[0];
    }

    /// Positions the cursor at the first entry whose key is `>= target`,
    /// or invalidates it if no such entry exists.
    pub fn seek(&mut self, target: &[u8]) {
        let prev = self.list.prev_node(target);
        self.curr = self.list.nodes[prev].forward[0];
    }

    /// Advances to the next entry in key order. An unpositioned cursor
    /// moves to the first entry; advancing past the last entry invalidates
    /// the cursor.
    pub fn next(&mut self) {
        self.curr = match self.curr {
            None => self.list.nodes[0].forward[0],
            Some(idx) => self.list.nodes[idx].forward[0],
        };
    }

    /// Returns `true` if the cursor references a live entry.
    pub fn valid(&self) -> bool {
        self.curr.is_some()
    }

    /// Returns the key at the cursor.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is not valid.
    pub fn key(&self) -> &'a [u8] {
        let idx = self.curr.expect("iterator is not positioned on an entry");
        self.list.nodes[idx].key.as_slice()
    }

    /// Returns the value at the cursor.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is not valid.
    pub fn value(&self) -> &'a [u8] {
        let idx = self.curr.expect("iterator is not positioned on an entry");
        self.list.nodes[idx].value.as_slice()
    }
}

/// Plain forward iterator over `(key, value)` pairs, created by
/// [`SkipList::entries`].
#[derive(Debug)]
pub struct Entries<'a> {
    list: &'a SkipList,
    curr: Option<usize>,
}

impl<'a> Iterator for Entries<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.curr?;
        let node = &self.list.nodes[idx];
        self.curr = node.forward[0];
        Some((node.key.as_slice(), node.value.as_slice()))
    }
}
