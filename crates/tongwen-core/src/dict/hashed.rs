//! Code-point trie whose edges live in a minimal-perfect-hash table.
//!
//! Nodes are numbered breadth-first with the root at 0. Every edge
//! `(parent, label) -> child` occupies exactly one slot of a table sized to
//! the edge count; the slot is found with a hash-and-displace function
//! (one displacement seed per bucket of ~4 edges), and the stored
//! `parent`/`label` pair rejects lookups for edges that do not exist.
//! There are no empty slots, which keeps the footprint below the
//! double-array form at the cost of a slower build.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::DictError;

const NO_VALUE: u32 = u32::MAX;
const BUCKET_SIZE: usize = 4;
const MAX_SALTS: u32 = 16;
const MAX_SEED: u32 = 1 << 22;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashedTrie {
    salt: u32,
    seeds: Vec<u32>,
    /// Slot-indexed edge table.
    parents: Vec<u32>,
    labels: Vec<u32>,
    children: Vec<u32>,
    /// Node-indexed value ids, `NO_VALUE` for non-terminal nodes.
    values: Vec<u32>,
    num_keys: u32,
}

#[inline]
fn mix(parent: u32, label: u32, seed: u32) -> u64 {
    let mut x = (((parent as u64) << 32) | label as u64)
        ^ (seed as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

#[inline]
fn bucket_of(parent: u32, label: u32, salt: u32, buckets: usize) -> usize {
    (mix(parent, label, salt << 24) % buckets as u64) as usize
}

#[inline]
fn slot_of(parent: u32, label: u32, salt: u32, seed: u32, edges: usize) -> usize {
    (mix(parent, label, (salt << 24) ^ seed.wrapping_add(1)) % edges as u64) as usize
}

struct Edge {
    parent: u32,
    label: u32,
    child: u32,
}

impl HashedTrie {
    /// Build from keys sorted in byte order without duplicates. The value
    /// id of each key is its index in `keys`.
    pub fn build(keys: &[&str]) -> Result<Self, DictError> {
        let (edges, values) = Self::layout(keys);
        if edges.is_empty() {
            return Ok(Self {
                salt: 0,
                seeds: Vec::new(),
                parents: Vec::new(),
                labels: Vec::new(),
                children: Vec::new(),
                values,
                num_keys: keys.len() as u32,
            });
        }
        for salt in 0..MAX_SALTS {
            if let Some(trie) = Self::try_place(&edges, &values, salt, keys.len() as u32) {
                return Ok(trie);
            }
        }
        Err(DictError::Build(format!(
            "no perfect hash found for {} edges",
            edges.len()
        )))
    }

    /// Breadth-first node numbering over the sorted keys.
    fn layout(keys: &[&str]) -> (Vec<Edge>, Vec<u32>) {
        // Each level maps (parent, label) to the key range below it; a
        // BTreeMap keeps siblings ordered so numbering is deterministic.
        let mut edges = Vec::new();
        let mut values = vec![NO_VALUE];
        let mut frontier: Vec<(u32, usize, usize, usize)> = vec![(0, 0, keys.len(), 0)];
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for (node, lo, hi, depth) in frontier {
                let mut groups: BTreeMap<char, (usize, usize)> = BTreeMap::new();
                for (i, key) in keys.iter().enumerate().take(hi).skip(lo) {
                    let rest = &key[depth..];
                    match rest.chars().next() {
                        None => values[node as usize] = i as u32,
                        Some(c) => {
                            let group = groups.entry(c).or_insert((i, i));
                            group.1 = i + 1;
                        }
                    }
                }
                for (c, (glo, ghi)) in groups {
                    let child = values.len() as u32;
                    values.push(NO_VALUE);
                    edges.push(Edge {
                        parent: node,
                        label: c as u32,
                        child,
                    });
                    next.push((child, glo, ghi, depth + c.len_utf8()));
                }
            }
            frontier = next;
        }
        (edges, values)
    }

    fn try_place(edges: &[Edge], values: &[u32], salt: u32, num_keys: u32) -> Option<Self> {
        let n = edges.len();
        let bucket_count = n.div_ceil(BUCKET_SIZE);
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); bucket_count];
        for (i, e) in edges.iter().enumerate() {
            buckets[bucket_of(e.parent, e.label, salt, bucket_count)].push(i);
        }
        let mut order: Vec<usize> = (0..bucket_count).collect();
        order.sort_by_key(|&b| std::cmp::Reverse(buckets[b].len()));

        let mut seeds = vec![0u32; bucket_count];
        let mut taken = vec![false; n];
        let mut slots = Vec::with_capacity(BUCKET_SIZE * 2);
        for b in order {
            let members = &buckets[b];
            if members.is_empty() {
                break;
            }
            let mut placed = false;
            for seed in 0..MAX_SEED {
                slots.clear();
                let fits = members.iter().all(|&i| {
                    let slot = slot_of(edges[i].parent, edges[i].label, salt, seed, n);
                    if taken[slot] || slots.contains(&slot) {
                        return false;
                    }
                    slots.push(slot);
                    true
                });
                if fits {
                    for &slot in &slots {
                        taken[slot] = true;
                    }
                    seeds[b] = seed;
                    placed = true;
                    break;
                }
            }
            if !placed {
                return None;
            }
        }

        let mut parents = vec![0u32; n];
        let mut labels = vec![0u32; n];
        let mut children = vec![0u32; n];
        for e in edges {
            let b = bucket_of(e.parent, e.label, salt, bucket_count);
            let slot = slot_of(e.parent, e.label, salt, seeds[b], n);
            parents[slot] = e.parent;
            labels[slot] = e.label;
            children[slot] = e.child;
        }
        Some(Self {
            salt,
            seeds,
            parents,
            labels,
            children,
            values: values.to_vec(),
            num_keys,
        })
    }

    pub fn len(&self) -> usize {
        self.num_keys as usize
    }

    pub fn is_empty(&self) -> bool {
        self.num_keys == 0
    }

    pub fn edge_count(&self) -> usize {
        self.children.len()
    }

    #[inline]
    fn child(&self, node: u32, c: char) -> Option<u32> {
        let n = self.children.len();
        if n == 0 || self.seeds.is_empty() {
            return None;
        }
        let label = c as u32;
        let b = bucket_of(node, label, self.salt, self.seeds.len());
        let slot = slot_of(node, label, self.salt, *self.seeds.get(b)?, n);
        if self.parents[slot] == node && self.labels[slot] == label {
            Some(self.children[slot])
        } else {
            None
        }
    }

    #[inline]
    fn value(&self, node: u32) -> Option<u32> {
        match self.values.get(node as usize) {
            Some(&v) if v != NO_VALUE => Some(v),
            _ => None,
        }
    }

    pub fn exact_match(&self, key: &str) -> Option<u32> {
        let mut node = 0;
        for c in key.chars() {
            node = self.child(node, c)?;
        }
        self.value(node)
    }

    /// Longest key that is a prefix of `text`, as `(byte_len, value_id)`.
    pub fn longest_prefix(&self, text: &str) -> Option<(usize, u32)> {
        let mut best = None;
        let mut node = 0;
        for (i, c) in text.char_indices() {
            node = match self.child(node, c) {
                Some(next) => next,
                None => break,
            };
            if let Some(id) = self.value(node) {
                best = Some((i + c.len_utf8(), id));
            }
        }
        best
    }

    /// All keys that are prefixes of `text`, shortest first.
    pub fn common_prefix_search(&self, text: &str) -> Vec<(usize, u32)> {
        let mut out = Vec::new();
        let mut node = 0;
        for (i, c) in text.char_indices() {
            node = match self.child(node, c) {
                Some(next) => next,
                None => break,
            };
            if let Some(id) = self.value(node) {
                out.push((i + c.len_utf8(), id));
            }
        }
        out
    }

    /// Every `(key, value_id)` pair, ordered by value id.
    ///
    /// Keys are rebuilt by following parent links, so this is linear in
    /// the table size regardless of which keys are wanted.
    pub fn keys(&self) -> Result<Vec<(String, u32)>, DictError> {
        let node_count = self.values.len();
        let mut incoming: Vec<Option<(u32, char)>> = vec![None; node_count];
        for slot in 0..self.children.len() {
            let child = self.children[slot] as usize;
            let label = char::from_u32(self.labels[slot]).ok_or(DictError::InvalidUtf8)?;
            if child == 0 || child >= node_count || incoming[child].is_some() {
                return Err(DictError::Corrupt(format!("node {child} has bad incoming edge")));
            }
            incoming[child] = Some((self.parents[slot], label));
        }

        let mut out = Vec::with_capacity(self.len());
        for (node, &value) in self.values.iter().enumerate() {
            if value == NO_VALUE {
                continue;
            }
            let mut chars = Vec::new();
            let mut cur = node;
            while cur != 0 {
                if chars.len() >= node_count {
                    return Err(DictError::Corrupt("cycle in hashed trie parents".into()));
                }
                let (parent, c) = incoming
                    .get(cur)
                    .copied()
                    .flatten()
                    .ok_or_else(|| DictError::Corrupt(format!("node {cur} is unreachable")))?;
                chars.push(c);
                cur = parent as usize;
            }
            out.push((chars.into_iter().rev().collect(), value));
        }
        out.sort_by_key(|(_, id)| *id);
        Ok(out)
    }

    /// Structural check after deserialization; returns the keys.
    pub(crate) fn validate(&self, value_count: usize) -> Result<Vec<(String, u32)>, DictError> {
        let n = self.children.len();
        if self.parents.len() != n || self.labels.len() != n {
            return Err(DictError::Corrupt("edge table length mismatch".into()));
        }
        if self.values.len() != n + 1 {
            return Err(DictError::Corrupt("node table length mismatch".into()));
        }
        if self.values[0] != NO_VALUE {
            return Err(DictError::Corrupt("root node is marked as a key".into()));
        }
        if self.seeds.len() != n.div_ceil(BUCKET_SIZE)
            || self.salt >= MAX_SALTS
            || self.seeds.iter().any(|&s| s >= MAX_SEED)
        {
            return Err(DictError::Corrupt("hash parameters out of range".into()));
        }
        for slot in 0..n {
            if self.parents[slot] as usize > n || self.children[slot] as usize > n {
                return Err(DictError::Corrupt(format!("edge slot {slot} out of range")));
            }
            let c = char::from_u32(self.labels[slot]).ok_or(DictError::InvalidUtf8)?;
            // Every stored edge must be reachable through the hash.
            if self.child(self.parents[slot], c) != Some(self.children[slot]) {
                return Err(DictError::Corrupt(format!("edge slot {slot} misplaced")));
            }
        }
        let keys = self.keys()?;
        if keys.len() != self.len() || keys.len() != value_count {
            return Err(DictError::Corrupt(format!(
                "key count mismatch: trie has {}, header says {}, values {}",
                keys.len(),
                self.len(),
                value_count
            )));
        }
        for (expected, (_, id)) in keys.iter().enumerate() {
            if *id as usize != expected {
                return Err(DictError::Corrupt(format!("unexpected value id {id}")));
            }
        }
        Ok(keys)
    }
}
