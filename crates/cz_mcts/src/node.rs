// Copyright 2024 The chess-zero Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The MCTS tree, kept as an arena of `Node`s addressed by index (§9's
//! stated preference over the teacher's `Arc<UnsafeCell<Node>>` pool --
//! this spec's coarse-grained, single-driver-thread concurrency model has
//! no need for fine-grained concurrent tree probing).

use chess::Color;

/// One vertex of the search tree. `action` and `mover` describe the edge
/// from the parent: `mover` is the side to move *at the parent*, i.e. the
/// side that played `action` to reach this node -- it is what the PUCT
/// value-sign convention is keyed on, per §3. The root has neither.
#[derive(Clone, Debug)]
pub struct Node {
    pub action: Option<usize>,
    pub mover: Option<Color>,
    pub parent: Option<usize>,
    pub prior: f32,
    pub visits: u32,
    pub value_sum: f32,
    pub children: Vec<usize>,
    pub terminal: bool,
}

impl Node {
    fn root() -> Self {
        Node {
            action: None,
            mover: None,
            parent: None,
            prior: 1.0,
            visits: 0,
            value_sum: 0.0,
            children: Vec::new(),
            terminal: false,
        }
    }

    fn child(parent: usize, action: usize, mover: Color, prior: f32, terminal: bool) -> Self {
        Node {
            action: Some(action),
            mover: Some(mover),
            parent: Some(parent),
            prior,
            visits: 0,
            value_sum: 0.0,
            children: Vec::new(),
            terminal,
        }
    }

    /// `w/n` when `n>0`, else `0`, as §3 defines a node's mean value.
    pub fn mean_value(&self) -> f32 {
        if self.visits > 0 {
            self.value_sum / self.visits as f32
        } else {
            0.0
        }
    }

    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }
}

/// An arena-backed MCTS tree. Index `0` is always the root; the tree is
/// acyclic and owned top-down, so dropping it frees every node at once --
/// there are no back-pointers to maintain beyond the `parent` index used
/// to sever a subtree during tree reuse (`Tree::retarget_as_root`).
pub struct Tree {
    nodes: Vec<Node>,
}

pub const ROOT: usize = 0;

impl Tree {
    pub fn new() -> Self {
        Tree { nodes: vec![Node::root()] }
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    /// Creates children for `leaf` from `(action, prior)` pairs, each
    /// tagged with whether the resulting position is itself terminal
    /// (§4.2(c): "Terminal leaves are not expanded", so a terminal child
    /// stays childless forever once created).
    pub fn expand(&mut self, leaf: usize, mover: Color, priors: &[(usize, f32, bool)]) {
        debug_assert!(!self.nodes[leaf].is_expanded());
        for &(action, prior, is_terminal) in priors {
            let child_idx = self.nodes.len();
            self.nodes.push(Node::child(leaf, action, mover, prior, is_terminal));
            self.nodes[leaf].children.push(child_idx);
        }
    }

    /// PUCT score of `child` under `parent`, per §4.2(a).
    pub fn puct_score(&self, parent: usize, child: usize, c_base: f64, c_init: f64) -> f64 {
        let parent_visits = self.nodes[parent].visits as f64;
        let child_visits = self.nodes[child].visits as f64;
        let c = ((parent_visits + c_base + 1.0) / c_base).ln() + c_init;
        let exploration = c * self.nodes[child].prior as f64 * parent_visits.sqrt() / (1.0 + child_visits);
        let q = if self.nodes[child].visits > 0 { -(self.nodes[child].mean_value() as f64) } else { 0.0 };
        exploration + q
    }

    /// The child of `parent` maximizing `puct_score`, ties broken by
    /// iteration order (first occurrence wins).
    pub fn select_child(&self, parent: usize, c_base: f64, c_init: f64) -> usize {
        let children = &self.nodes[parent].children;
        debug_assert!(!children.is_empty());

        let mut best = children[0];
        let mut best_score = self.puct_score(parent, best, c_base, c_init);
        for &candidate in &children[1..] {
            let score = self.puct_score(parent, candidate, c_base, c_init);
            if score > best_score {
                best = candidate;
                best_score = score;
            }
        }
        best
    }

    /// Backs up `value` (from the leaf's own side-to-move perspective)
    /// along `path`, negating the sign at each level going up (§4.2(d)).
    pub fn backup(&mut self, path: &[usize], leaf_value: f32) {
        let mut value = leaf_value;
        for &idx in path.iter().rev() {
            self.nodes[idx].visits += 1;
            self.nodes[idx].value_sum += value;
            value = -value;
        }
    }

    /// Blends Dirichlet noise into `node`'s children's priors (§4.2's
    /// "Root noise"): `prior <- (1-eps)*prior + eps*noise`.
    pub fn add_exploration_noise(&mut self, node: usize, noise: &[f64], epsilon: f64) {
        let children = self.nodes[node].children.clone();
        debug_assert_eq!(children.len(), noise.len());
        for (&child, &eta) in children.iter().zip(noise) {
            let prior = self.nodes[child].prior as f64;
            self.nodes[child].prior = ((1.0 - epsilon) * prior + epsilon * eta) as f32;
        }
    }

    /// The child with the most visits, ties broken by index -- both the
    /// move-selection rule and the "PV" child used by competitive search.
    pub fn most_visited_child(&self, node: usize) -> Option<usize> {
        self.nodes[node]
            .children
            .iter()
            .copied()
            .max_by_key(|&child| (self.nodes[child].visits, std::cmp::Reverse(child)))
    }

    /// `pi(a) = n(child_a) / sum(n(child_*))`, the policy training target
    /// (§3's replay record, §4.2's "Move selection").
    pub fn visit_distribution(&self, node: usize) -> Vec<(usize, f32)> {
        let children = &self.nodes[node].children;
        let total: u32 = children.iter().map(|&c| self.nodes[c].visits).sum();
        if total == 0 {
            return Vec::new();
        }
        children
            .iter()
            .map(|&c| {
                let child = &self.nodes[c];
                (child.action.expect("non-root child always has an action"), child.visits as f32 / total as f32)
            })
            .collect()
    }

    /// Severs `child` from its parent and makes it the new root, for tree
    /// reuse after a move commit (§4.2's "Tree reuse"). The rest of the
    /// tree (everything not reachable from `child`) is simply never
    /// indexed again -- the arena trades a dangling tail of dead nodes for
    /// avoiding a traversal-based subtree copy; a fresh `Tree` is
    /// allocated here instead, keeping it bounded.
    pub fn retarget_as_root(&self, child: usize) -> Tree {
        use std::collections::{HashMap, VecDeque};

        let mut remap = HashMap::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(child);

        while let Some(idx) = queue.pop_front() {
            remap.insert(idx, order.len());
            order.push(idx);
            queue.extend(self.nodes[idx].children.iter().copied());
        }

        let mut new_nodes: Vec<Node> = order
            .iter()
            .map(|&idx| {
                let mut node = self.nodes[idx].clone();
                node.parent = node.parent.and_then(|p| remap.get(&p).copied());
                node.children = node.children.iter().map(|c| remap[c]).collect();
                node
            })
            .collect();

        new_nodes[0].action = None;
        new_nodes[0].mover = None;
        new_nodes[0].parent = None;

        Tree { nodes: new_nodes }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Tree::new()
    }
}
