use std::collections::{HashMap, VecDeque};

use crate::movegen::Move;

/// How a stored score relates to the true value of the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Exact,
    /// The true value is at least the stored score.
    LowerBound,
    /// The true value is at most the stored score.
    UpperBound,
}

impl NodeType {
    /// The same bound seen from the other side of the board.
    pub fn flipped(self) -> Self {
        match self {
            NodeType::Exact => NodeType::Exact,
            NodeType::LowerBound => NodeType::UpperBound,
            NodeType::UpperBound => NodeType::LowerBound,
        }
    }
}

/// Scores are stored from the point of view of the side to move at `hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspositionEntry {
    pub hash: u64,
    pub depth: u32,
    pub score: i32,
    pub node_type: NodeType,
    pub best_move: Option<Move>,
}

#[derive(Debug, Clone)]
struct Slot {
    entry: TranspositionEntry,
    stamp: u64,
}

/// Bounded cache of search results keyed by position hash. When full, the
/// entry stored longest ago is evicted. A capacity of zero disables caching.
#[derive(Debug, Clone)]
pub struct TranspositionTable {
    table: HashMap<u64, Slot>,
    /// Insertion order; pairs whose stamp no longer matches the live slot are stale.
    order: VecDeque<(u64, u64)>,
    size: usize,
    next_stamp: u64,
    hits: u64,
    misses: u64,
}

impl TranspositionTable {
    pub fn new(size: usize) -> Self {
        Self {
            table: HashMap::with_capacity(size.min(1 << 16)),
            order: VecDeque::new(),
            size,
            next_stamp: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Always replaces whatever was stored under `hash`.
    pub fn store(&mut self, hash: u64, entry: TranspositionEntry) {
        if self.size == 0 {
            return;
        }

        self.next_stamp += 1;
        let stamp = self.next_stamp;
        self.table.insert(hash, Slot { entry, stamp });
        self.order.push_back((hash, stamp));

        while self.table.len() > self.size {
            let Some((key, stamp)) = self.order.pop_front() else {
                break;
            };
            if self.table.get(&key).is_some_and(|slot| slot.stamp == stamp) {
                self.table.remove(&key);
            }
        }

        if self.order.len() > 2 * self.size.max(64) {
            let table = &self.table;
            self.order
                .retain(|(key, stamp)| table.get(key).is_some_and(|slot| slot.stamp == *stamp));
        }
    }

    /// Returns a usable score and the stored best move when the entry is deep
    /// enough and its bound decides the `(alpha, beta)` window.
    pub fn probe(
        &mut self,
        hash: u64,
        depth: u32,
        alpha: i32,
        beta: i32,
    ) -> Option<(i32, Option<Move>)> {
        let found = self.table.get(&hash).and_then(|slot| {
            let entry = &slot.entry;
            if entry.depth < depth {
                return None;
            }
            let usable = match entry.node_type {
                NodeType::Exact => true,
                NodeType::LowerBound => entry.score >= beta,
                NodeType::UpperBound => entry.score <= alpha,
            };
            usable.then_some((entry.score, entry.best_move))
        });

        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    pub fn get(&self, hash: u64) -> Option<&TranspositionEntry> {
        self.table.get(&hash).map(|slot| &slot.entry)
    }

    pub fn clear(&mut self) {
        self.table.clear();
        self.order.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.size
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
