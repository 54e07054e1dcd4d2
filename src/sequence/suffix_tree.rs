//! Ukkonen suffix tree over a symbol sequence
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]; suffix links
//! and child edges are plain indices, so the link graph needs no shared
//! ownership. Leaf edges are created with an [`EdgeEnd::Open`] end that is
//! resolved against the single `leaf_end` value of the build state, which is
//! how every growing leaf is extended in O(1) per phase.
//!
//! The text is the input symbols followed by one terminal letter that differs
//! from every symbol, so each suffix ends in its own leaf.

use crate::glyph::SymbolId;
use crate::sequence::{compare_mined, MinedPattern, PatternFinder};
use std::collections::{BTreeMap, HashMap};

/// Index of a node in the tree arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

const ROOT: NodeId = NodeId(0);

/// Alphabet of the tree text: real symbols plus the terminal sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Letter {
    Symbol(SymbolId),
    Terminal,
}

/// Exclusive end of an edge label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeEnd {
    /// Leaf edge, grows with the shared leaf end
    Open,
    Closed(usize),
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    start: usize,
    end: EdgeEnd,
    dest: NodeId,
}

impl Edge {
    fn end_at(&self, leaf_end: usize) -> usize {
        match self.end {
            EdgeEnd::Open => leaf_end,
            EdgeEnd::Closed(end) => end,
        }
    }

    fn len(&self, leaf_end: usize) -> usize {
        self.end_at(leaf_end) - self.start
    }
}

#[derive(Debug, Clone, Default)]
struct Node {
    children: BTreeMap<Letter, Edge>,
    suffix_link: Option<NodeId>,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Construction cursor threaded through every extension
#[derive(Debug, Clone, Copy)]
struct BuildState {
    active_node: NodeId,
    /// Text index of the first letter on the active edge
    active_edge: usize,
    active_length: usize,
    /// Suffixes of the current prefix not yet inserted explicitly
    remaining: usize,
    /// Shared end of all open leaf edges
    leaf_end: usize,
}

/// Suffix tree with per-node leaf counts
///
/// # Example
/// ```
/// use glyphmine::sequence::SuffixTree;
///
/// let tree = SuffixTree::build(&[1, 2, 1, 2, 3]);
/// assert_eq!(tree.search(&[1, 2]), 2);
/// assert_eq!(tree.repeated_substrings(2)[0].symbols, vec![1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct SuffixTree {
    text: Vec<Letter>,
    nodes: Vec<Node>,
    leaf_end: usize,
    /// String depth of each node
    depth: Vec<usize>,
    /// Resolved end of the edge entering each node
    path_end: Vec<usize>,
    leaf_counts: Vec<usize>,
}

impl SuffixTree {
    pub fn build(symbols: &[SymbolId]) -> Self {
        let mut text: Vec<Letter> = symbols.iter().map(|&s| Letter::Symbol(s)).collect();
        text.push(Letter::Terminal);

        let mut tree = SuffixTree {
            text,
            nodes: vec![Node::default()],
            leaf_end: 0,
            depth: Vec::new(),
            path_end: Vec::new(),
            leaf_counts: Vec::new(),
        };

        let mut state = BuildState {
            active_node: ROOT,
            active_edge: 0,
            active_length: 0,
            remaining: 0,
            leaf_end: 0,
        };

        for pos in 0..tree.text.len() {
            tree.extend(&mut state, pos);
        }

        assert_eq!(state.remaining, 0, "terminal letter left suffixes implicit");
        tree.leaf_end = state.leaf_end;
        tree.annotate();

        tracing::debug!(
            sequence_len = symbols.len(),
            nodes = tree.nodes.len(),
            "suffix tree built"
        );

        tree
    }

    fn alloc(&mut self) -> NodeId {
        self.nodes.push(Node::default());
        NodeId(self.nodes.len() - 1)
    }

    /// One Ukkonen phase: add `text[pos]` to every pending suffix
    fn extend(&mut self, state: &mut BuildState, pos: usize) {
        state.leaf_end = pos + 1;
        state.remaining += 1;
        let mut last_internal: Option<NodeId> = None;
        let letter = self.text[pos];

        while state.remaining > 0 {
            assert!(
                state.active_length < state.remaining,
                "active point deeper than pending suffixes"
            );

            if state.active_length == 0 {
                state.active_edge = pos;
            }

            let edge_letter = self.text[state.active_edge];
            let existing = self.nodes[state.active_node.0]
                .children
                .get(&edge_letter)
                .copied();

            match existing {
                None => {
                    // Rule 2: new leaf straight off the active node
                    let leaf = self.alloc();
                    self.nodes[state.active_node.0].children.insert(
                        edge_letter,
                        Edge {
                            start: pos,
                            end: EdgeEnd::Open,
                            dest: leaf,
                        },
                    );
                    if let Some(node) = last_internal.take() {
                        self.nodes[node.0].suffix_link = Some(state.active_node);
                    }
                }
                Some(edge) => {
                    let edge_len = edge.len(state.leaf_end);
                    if state.active_length >= edge_len {
                        // skip/count: hop to the next node without comparing
                        state.active_edge += edge_len;
                        state.active_length -= edge_len;
                        state.active_node = edge.dest;
                        continue;
                    }

                    let split_point = edge.start + state.active_length;
                    if self.text[split_point] == letter {
                        // Rule 3: already present, phase ends
                        if let Some(node) = last_internal.take() {
                            self.nodes[node.0].suffix_link = Some(state.active_node);
                        }
                        state.active_length += 1;
                        break;
                    }

                    // Rule 2: split the edge and hang a new leaf off the split
                    let split = self.alloc();
                    let leaf = self.alloc();
                    let continuation = self.text[split_point];

                    self.nodes[state.active_node.0].children.insert(
                        edge_letter,
                        Edge {
                            start: edge.start,
                            end: EdgeEnd::Closed(split_point),
                            dest: split,
                        },
                    );
                    let split_node = &mut self.nodes[split.0];
                    split_node.children.insert(
                        letter,
                        Edge {
                            start: pos,
                            end: EdgeEnd::Open,
                            dest: leaf,
                        },
                    );
                    split_node.children.insert(
                        continuation,
                        Edge {
                            start: split_point,
                            end: edge.end,
                            dest: edge.dest,
                        },
                    );

                    if let Some(node) = last_internal {
                        self.nodes[node.0].suffix_link = Some(split);
                    }
                    last_internal = Some(split);
                }
            }

            state.remaining -= 1;
            if state.active_node == ROOT && state.active_length > 0 {
                state.active_length -= 1;
                state.active_edge = pos + 1 - state.remaining;
            } else if state.active_node != ROOT {
                state.active_node = self.nodes[state.active_node.0]
                    .suffix_link
                    .unwrap_or(ROOT);
            }
        }
    }

    /// Compute string depth, entering-edge end and leaf count for every node
    fn annotate(&mut self) {
        let n = self.nodes.len();
        let mut depth = vec![0; n];
        let mut path_end = vec![0; n];
        let mut preorder = Vec::with_capacity(n);
        let mut stack = vec![ROOT];

        while let Some(node) = stack.pop() {
            preorder.push(node);
            for edge in self.nodes[node.0].children.values() {
                let end = edge.end_at(self.leaf_end);
                depth[edge.dest.0] = depth[node.0] + (end - edge.start);
                path_end[edge.dest.0] = end;
                stack.push(edge.dest);
            }
        }

        let mut leaf_counts = vec![0; n];
        for &node in preorder.iter().rev() {
            leaf_counts[node.0] = if self.nodes[node.0].is_leaf() {
                1
            } else {
                self.nodes[node.0]
                    .children
                    .values()
                    .map(|e| leaf_counts[e.dest.0])
                    .sum()
            };
        }

        self.depth = depth;
        self.path_end = path_end;
        self.leaf_counts = leaf_counts;
    }

    /// Number of symbols indexed (the terminal excluded)
    pub fn sequence_len(&self) -> usize {
        self.text.len() - 1
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves, one per suffix including the terminal-only one
    pub fn leaf_count(&self) -> usize {
        self.leaf_counts[ROOT.0]
    }

    /// Leaves below `node`
    pub fn leaves_under(&self, node: NodeId) -> usize {
        self.leaf_counts[node.0]
    }

    /// Start offsets of all suffixes in the subtree of `node`, ascending
    fn suffix_starts(&self, node: NodeId) -> Vec<usize> {
        let mut starts = Vec::with_capacity(self.leaf_counts[node.0]);
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let entry = &self.nodes[current.0];
            if entry.is_leaf() {
                starts.push(self.text.len() - self.depth[current.0]);
            } else {
                stack.extend(entry.children.values().map(|e| e.dest));
            }
        }
        starts.sort_unstable();
        starts
    }

    /// Label of the path from the root to an internal node
    fn path_label(&self, node: NodeId) -> Vec<SymbolId> {
        let end = self.path_end[node.0];
        let start = end - self.depth[node.0];
        self.text[start..end]
            .iter()
            .map(|letter| match letter {
                Letter::Symbol(s) => *s,
                Letter::Terminal => unreachable!("terminal letter on an internal path"),
            })
            .collect()
    }

    /// Repeated substrings ending at an internal node
    ///
    /// Every internal node whose path is at least `min_length` long and which
    /// has two or more leaves below it yields its path label, with the leaf
    /// suffix starts as occurrences. Ordered by length desc, count desc,
    /// tuple asc.
    pub fn repeated_substrings(&self, min_length: usize) -> Vec<MinedPattern> {
        let min_length = min_length.max(1);
        let mut best: HashMap<Vec<SymbolId>, MinedPattern> = HashMap::new();

        for (index, node) in self.nodes.iter().enumerate().skip(1) {
            if node.is_leaf() {
                continue;
            }
            let id = NodeId(index);
            if self.depth[index] < min_length || self.leaf_counts[index] < 2 {
                continue;
            }

            let candidate = MinedPattern::new(self.path_label(id), self.suffix_starts(id));
            match best.get(&candidate.symbols) {
                Some(existing)
                    if (existing.len(), existing.occurrence_count())
                        >= (candidate.len(), candidate.occurrence_count()) => {}
                _ => {
                    best.insert(candidate.symbols.clone(), candidate);
                }
            }
        }

        let mut patterns: Vec<MinedPattern> = best.into_values().collect();
        patterns.sort_by(compare_mined);
        patterns
    }

    /// Exact occurrence count of `pattern`
    ///
    /// Walks from the root; the count is the number of leaves under the edge
    /// where the pattern runs out. Any mismatch means zero.
    pub fn search(&self, pattern: &[SymbolId]) -> usize {
        if pattern.is_empty() {
            return 0;
        }

        let mut node = ROOT;
        let mut matched = 0;

        loop {
            let Some(edge) = self.nodes[node.0]
                .children
                .get(&Letter::Symbol(pattern[matched]))
            else {
                return 0;
            };

            let end = edge.end_at(self.leaf_end);
            let mut k = edge.start;
            while k < end && matched < pattern.len() {
                if self.text[k] != Letter::Symbol(pattern[matched]) {
                    return 0;
                }
                k += 1;
                matched += 1;
            }

            if matched == pattern.len() {
                return self.leaf_counts[edge.dest.0];
            }
            node = edge.dest;
        }
    }
}

impl PatternFinder for SuffixTree {
    fn name(&self) -> &'static str {
        "suffix-tree"
    }

    fn find_patterns(&self, min_length: usize) -> Vec<MinedPattern> {
        self.repeated_substrings(min_length)
    }

    fn search(&self, pattern: &[SymbolId]) -> usize {
        SuffixTree::search(self, pattern)
    }
}
