//! Lattice overlay: exposes the final stack's DecoderState DAG for
//! Viterbi inside-outside scoring and pruned-lattice text output
//! (spec §4.9).
//!
//! No original-source file covered this; the DAG shape follows directly
//! from `decoder_state.rs`'s `back`/`recomb` fields, the way `translit.rs`
//! builds its own graph structures straight from its node types rather
//! than porting one.

use crate::decoder_state::{SentenceArena, StateId};
use std::collections::HashMap;

/// A node in the lattice: either the synthetic root above the final
/// stack, or a wrapped [`StateId`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Node {
    Root,
    State(StateId),
}

/// One edge `to -> from`, i.e. `from` is one step closer to the sentence
/// start than `to`. `phrase_text` is the surface form emitted on this
/// edge for lattice printing.
#[derive(Clone, Debug)]
pub struct Edge {
    pub to: Node,
    pub from: Node,
    pub score: f64,
    pub phrase_text: String,
}

/// Floors an edge score so that degenerate feature output (`-inf`, `NaN`)
/// cannot make inside/outside pruning ill-defined.
fn floor_score(score: f64, min_score: f64) -> f64 {
    if score.is_finite() {
        score.max(min_score)
    } else {
        min_score
    }
}

pub struct Lattice {
    edges: Vec<Edge>,
    outgoing: HashMap<Node, Vec<usize>>,
    nodes: Vec<Node>,
}

impl Lattice {
    /// Builds the lattice from the final stack's prime states. Each prime
    /// state contributes an edge to its `back` parent, plus one edge per
    /// recombined sibling to that sibling's own `back` parent (the
    /// sibling's score differential is attributed to the prime node, since
    /// the sibling itself is not retained as a node).
    pub fn build(arena: &SentenceArena, final_states: &[StateId], min_score: f64) -> Self {
        let mut edges = Vec::new();
        let mut outgoing: HashMap<Node, Vec<usize>> = HashMap::new();
        let mut nodes = vec![Node::Root];

        for &id in final_states {
            nodes.push(Node::State(id));
            outgoing
                .entry(Node::Root)
                .or_default()
                .push(push_edge(&mut edges, Node::Root, Node::State(id), 0.0, String::new()));
        }

        let mut seen = std::collections::HashSet::new();
        let mut frontier: Vec<StateId> = final_states.to_vec();
        while let Some(id) = frontier.pop() {
            if !seen.insert(id) {
                continue;
            }
            let state = arena.state(id);
            let own_score = state.score;
            if let Some(back) = state.back {
                nodes.push(Node::State(back));
                let back_score = arena.state(back).score;
                let text = phrase_text(arena, id);
                let idx = push_edge(
                    &mut edges,
                    Node::State(id),
                    Node::State(back),
                    floor_score(own_score - back_score, min_score),
                    text,
                );
                outgoing.entry(Node::State(id)).or_default().push(idx);
                frontier.push(back);
            }
            for &sibling in &state.recomb.clone() {
                let sib_state = arena.state(sibling);
                if let Some(sib_back) = sib_state.back {
                    nodes.push(Node::State(sib_back));
                    let sib_back_score = arena.state(sib_back).score;
                    let text = phrase_text(arena, sibling);
                    let idx = push_edge(
                        &mut edges,
                        Node::State(id),
                        Node::State(sib_back),
                        floor_score(sib_state.score - sib_back_score, min_score),
                        text,
                    );
                    outgoing.entry(Node::State(id)).or_default().push(idx);
                    frontier.push(sib_back);
                }
            }
        }

        Self { edges, outgoing, nodes }
    }

    /// Two-colour DFS from the dummy root, emitting each node only after
    /// every node reachable from it has been emitted. Panics if a cycle is
    /// found (decoder states can never cycle back through `back`).
    pub fn states_in_inside_order(&self) -> Vec<Node> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }
        let mut mark: HashMap<Node, Mark> = HashMap::new();
        let mut order = Vec::new();

        fn visit(node: Node, lattice: &Lattice, mark: &mut HashMap<Node, Mark>, order: &mut Vec<Node>) {
            match mark.get(&node).copied().unwrap_or(Mark::Unvisited) {
                Mark::Done => return,
                Mark::InProgress => panic!("lattice contains a cycle"),
                Mark::Unvisited => {}
            }
            mark.insert(node, Mark::InProgress);
            if let Some(out) = lattice.outgoing.get(&node) {
                for &idx in out {
                    visit(lattice.edges[idx].from, lattice, mark, order);
                }
            }
            mark.insert(node, Mark::Done);
            order.push(node);
        }

        visit(Node::Root, self, &mut mark, &mut order);
        order
    }

    /// Viterbi best score reaching each node from the leaves (i.e. the
    /// best-scoring path from the sentence start up to this node).
    pub fn inside(&self) -> HashMap<Node, f64> {
        // A node with no outgoing edges (a leaf, i.e. a sentence-initial
        // state) has inside score 0; otherwise it's the max over outgoing
        // edges of (inside(from) + edge score). `states_in_inside_order`
        // guarantees every `from` is computed before its `to`.
        let mut computed: HashMap<Node, f64> = HashMap::new();
        for node in self.states_in_inside_order() {
            let best = match self.outgoing.get(&node) {
                None => 0.0,
                Some(idxs) if idxs.is_empty() => 0.0,
                Some(idxs) => idxs
                    .iter()
                    .map(|&i| {
                        let e = &self.edges[i];
                        computed.get(&e.from).copied().unwrap_or(0.0) + e.score
                    })
                    .fold(f64::NEG_INFINITY, f64::max),
            };
            computed.insert(node, best);
        }
        computed
    }

    /// Viterbi best completion following each node, given `inside` scores.
    pub fn outside(&self, inside: &HashMap<Node, f64>) -> HashMap<Node, f64> {
        let mut outside: HashMap<Node, f64> = HashMap::new();
        outside.insert(Node::Root, 0.0);
        for node in self.states_in_inside_order().into_iter().rev() {
            for &idx in self.outgoing.get(&node).into_iter().flatten() {
                let e = &self.edges[idx];
                let candidate = outside.get(&node).copied().unwrap_or(f64::NEG_INFINITY) + e.score;
                let entry = outside.entry(e.from).or_insert(f64::NEG_INFINITY);
                if candidate > *entry {
                    *entry = candidate;
                }
            }
        }
        let _ = inside;
        outside
    }

    /// Per-edge best total-path score: `inside(from) + edge.score +
    /// outside(to)`. Checks that every leaf's outside score matches the
    /// root's inside score within relative tolerance `1e-8`, per spec §4.9.
    pub fn inside_outside(&self) -> Vec<f64> {
        let inside = self.inside();
        let outside = self.outside(&inside);
        let root_inside = inside.get(&Node::Root).copied().unwrap_or(0.0);

        for node in &self.nodes {
            if self.outgoing.get(node).map_or(true, |v| v.is_empty()) {
                let leaf_outside = outside.get(node).copied().unwrap_or(f64::NEG_INFINITY);
                let tolerance = 1e-8 * root_inside.abs().max(1.0);
                assert!(
                    (leaf_outside - root_inside).abs() <= tolerance,
                    "lattice consistency check failed: outside(leaf)={leaf_outside} vs inside(root)={root_inside}"
                );
            }
        }

        self.edges
            .iter()
            .map(|e| {
                inside.get(&e.from).copied().unwrap_or(0.0) + e.score + outside.get(&e.to).copied().unwrap_or(0.0)
            })
            .collect()
    }

    /// Emits a pruned text lattice keeping the top `density * len` edges
    /// by inside-outside score, in the `(to_id (from_id "phrase" score))`
    /// line format, escaping `"` and `\` in phrase text.
    pub fn print_pruned_lattice(&self, density: f64, len: u32) -> String {
        let scores = self.inside_outside();
        let mut by_score: Vec<usize> = (0..self.edges.len()).collect();
        by_score.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(std::cmp::Ordering::Equal));

        let keep = ((density * len as f64).ceil() as usize).min(self.edges.len());
        let mut kept: Vec<usize> = by_score.into_iter().take(keep).collect();
        kept.sort();

        let mut out = String::new();
        for idx in kept {
            let e = &self.edges[idx];
            out.push_str(&format!(
                "({} ({} \"{}\" {}))\n",
                node_label(e.to),
                node_label(e.from),
                escape_phrase(&e.phrase_text),
                e.score
            ));
        }
        out
    }
}

fn node_label(node: Node) -> String {
    match node {
        Node::Root => "FINAL".to_string(),
        Node::State(id) => id.0.to_string(),
    }
}

fn escape_phrase(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn phrase_text(arena: &SentenceArena, id: StateId) -> String {
    arena
        .trans_of(id)
        .last_phrase
        .phrase
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_edge(edges: &mut Vec<Edge>, to: Node, from: Node, score: f64, phrase_text: String) -> usize {
    edges.push(Edge { to, from, score, phrase_text });
    edges.len() - 1
}
