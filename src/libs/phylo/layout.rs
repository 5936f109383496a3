//! Clustered layout of a [`Tree`]: leaves one row apart, depth from branch lengths
//! or from topology.
//!
//! The tree itself is never touched. Collapsing is expressed as a set of node ids whose
//! subtrees are skipped, and the result is a separate map from node id to position, so
//! re-running the layout after any input change is always safe.

use super::node::NodeId;
use super::tree::Tree;
use indexmap::IndexMap;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    /// Distance between two adjacent leaves
    pub row_height: f64,
    /// Extent of the depth axis; the deepest leaf ends here
    pub tree_width: f64,
    /// Scale depth by branch length instead of by topology
    pub show_branch_len: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            row_height: 20.0,
            tree_width: 200.0,
            show_branch_len: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePosition {
    /// Depth axis position, equal to `len`
    pub x: f64,
    /// Rank axis position; row centre for leaves, mean of children otherwise
    pub y: f64,
    /// Scaled cumulative branch length, or the topological position
    pub len: f64,
    /// Leaves under this node in the (collapse-filtered) layout
    pub height: usize,
    /// Edges from the root
    pub depth: usize,
    pub is_leaf: bool,
    /// Has children in the tree, but they are hidden
    pub collapsed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("node {0} is reachable more than once")]
    DuplicateNode(NodeId),
    #[error("node {0} not found")]
    MissingNode(NodeId),
}

#[derive(Debug, Clone, Default)]
pub struct TreeLayout {
    positions: IndexMap<NodeId, NodePosition>,
    leaves: Vec<NodeId>,
    leaf_names: Vec<Option<String>>,
    row_height: f64,
    tree_width: f64,
}

// One node of the collapse-filtered hierarchy. Indices point into the preorder vector.
struct Slot {
    id: NodeId,
    parent: Option<usize>,
    children: Vec<usize>,
    depth: usize,
    branch: f64,
    collapsed: bool,
}

impl TreeLayout {
    /// Lay out `tree`, treating every node in `collapsed` as a leaf.
    ///
    /// ```
    /// use msav::libs::phylo::{LayoutOptions, Tree, TreeLayout};
    /// use std::collections::HashSet;
    ///
    /// let tree = Tree::from_newick("((A:1,B:3)AB:1,C:0.5)root;").unwrap();
    /// let opt = LayoutOptions { row_height: 10.0, tree_width: 100.0, show_branch_len: true };
    /// let layout = TreeLayout::new(&tree, &HashSet::new(), &opt).unwrap();
    ///
    /// assert_eq!(layout.leaf_names(), vec!["C", "A", "B"]);
    /// let b = layout.get(tree.get_node_by_name("B").unwrap()).unwrap();
    /// assert_eq!(b.x, 100.0);
    /// assert_eq!(b.y, 25.0);
    /// ```
    pub fn new(
        tree: &Tree,
        collapsed: &HashSet<NodeId>,
        opt: &LayoutOptions,
    ) -> Result<Self, LayoutError> {
        let Some(root) = tree.get_root() else {
            return Ok(Self {
                row_height: opt.row_height,
                tree_width: opt.tree_width,
                ..Default::default()
            });
        };

        let slots = hierarchy(tree, root, collapsed)?;
        let n = slots.len();

        // leaf counts and edges to the deepest leaf, children before parents
        let mut counts = vec![0usize; n];
        let mut heights = vec![0usize; n];
        for i in (0..n).rev() {
            if slots[i].children.is_empty() {
                counts[i] = 1;
            } else {
                counts[i] = slots[i].children.iter().map(|&c| counts[c]).sum();
                heights[i] = 1 + slots[i]
                    .children
                    .iter()
                    .map(|&c| heights[c])
                    .max()
                    .unwrap_or(0);
            }
        }

        // rank axis
        let mut ys = vec![0.0f64; n];
        let mut leaves = vec![];
        for (i, slot) in slots.iter().enumerate() {
            if slot.children.is_empty() {
                ys[i] = (leaves.len() as f64 + 0.5) * opt.row_height;
                leaves.push(i);
            }
        }
        for i in (0..n).rev() {
            let children = &slots[i].children;
            if !children.is_empty() {
                ys[i] = children.iter().map(|&c| ys[c]).sum::<f64>() / children.len() as f64;
            }
        }

        // depth axis
        let lens = if opt.show_branch_len {
            let mut cumulative = vec![0.0f64; n];
            for i in 1..n {
                let parent = slots[i].parent.unwrap_or(0);
                cumulative[i] = cumulative[parent] + slots[i].branch.max(0.0);
            }
            let max_len = cumulative.iter().copied().fold(0.0, f64::max);
            let k = if max_len > 0.0 {
                opt.tree_width / max_len
            } else {
                0.0
            };
            cumulative.into_iter().map(|c| c * k).collect::<Vec<_>>()
        } else {
            let root_height = heights[0];
            heights
                .iter()
                .map(|&h| {
                    if root_height == 0 {
                        0.0
                    } else {
                        (1.0 - h as f64 / root_height as f64) * opt.tree_width
                    }
                })
                .collect()
        };

        let mut positions = IndexMap::with_capacity(n);
        for (i, slot) in slots.iter().enumerate() {
            positions.insert(
                slot.id,
                NodePosition {
                    x: lens[i],
                    y: ys[i],
                    len: lens[i],
                    height: counts[i],
                    depth: slot.depth,
                    is_leaf: slot.children.is_empty(),
                    collapsed: slot.collapsed,
                },
            );
        }

        let leaf_ids: Vec<NodeId> = leaves.iter().map(|&i| slots[i].id).collect();
        let leaf_names = leaf_ids
            .iter()
            .map(|&id| tree.get_node(id).and_then(|n| n.name.clone()))
            .collect();

        tracing::debug!(
            nodes = n,
            leaves = leaf_ids.len(),
            branch_len = opt.show_branch_len,
            "tree layout complete"
        );

        Ok(Self {
            positions,
            leaves: leaf_ids,
            leaf_names,
            row_height: opt.row_height,
            tree_width: opt.tree_width,
        })
    }

    pub fn get(&self, id: NodeId) -> Option<&NodePosition> {
        self.positions.get(&id)
    }

    /// Positions in preorder of the laid-out hierarchy.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodePosition)> {
        self.positions.iter().map(|(&id, pos)| (id, pos))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Leaves, top to bottom.
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    /// Names of the named leaves, top to bottom. This is the row order of the alignment.
    pub fn leaf_names(&self) -> Vec<&str> {
        self.leaf_names.iter().filter_map(|n| n.as_deref()).collect()
    }

    /// The leaf drawn in the row containing `y`.
    pub fn leaf_at(&self, y: f64) -> Option<NodeId> {
        if self.row_height <= 0.0 || y < 0.0 {
            return None;
        }
        let rank = (y / self.row_height).floor() as usize;
        self.leaves.get(rank).copied()
    }

    pub fn total_height(&self) -> f64 {
        self.leaves.len() as f64 * self.row_height
    }

    pub fn tree_width(&self) -> f64 {
        self.tree_width
    }
}

// Preorder walk from `root` that stops at collapsed nodes and orders siblings by
// ascending branch length. Sorting is stable, so ties keep input order.
fn hierarchy(
    tree: &Tree,
    root: NodeId,
    collapsed: &HashSet<NodeId>,
) -> Result<Vec<Slot>, LayoutError> {
    let mut slots: Vec<Slot> = vec![];
    let mut seen = HashSet::new();
    let mut stack = vec![(root, None::<usize>, 0usize)];

    while let Some((id, parent, depth)) = stack.pop() {
        let node = tree.get_node(id).ok_or(LayoutError::MissingNode(id))?;
        if !seen.insert(id) {
            return Err(LayoutError::DuplicateNode(id));
        }

        let is_collapsed = collapsed.contains(&id) && !node.is_leaf();
        let idx = slots.len();
        slots.push(Slot {
            id,
            parent,
            children: vec![],
            depth,
            // the root's own branch is not drawn
            branch: if parent.is_some() {
                node.branch_length()
            } else {
                0.0
            },
            collapsed: is_collapsed,
        });
        if let Some(p) = parent {
            slots[p].children.push(idx);
        }

        if !is_collapsed {
            let mut children = node.children.clone();
            children.sort_by(|&a, &b| {
                let la = tree.get_node(a).map(|n| n.branch_length()).unwrap_or(0.0);
                let lb = tree.get_node(b).map(|n| n.branch_length()).unwrap_or(0.0);
                la.total_cmp(&lb)
            });
            for &child in children.iter().rev() {
                stack.push((child, Some(idx), depth + 1));
            }
        }
    }

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn lay_out(newick: &str, collapsed: &[&str], show_branch_len: bool) -> (Tree, TreeLayout) {
        let tree = Tree::from_newick(newick).unwrap();
        let collapsed: HashSet<NodeId> = collapsed
            .iter()
            .map(|n| tree.get_node_by_name(n).unwrap())
            .collect();
        let opt = LayoutOptions {
            row_height: 10.0,
            tree_width: 100.0,
            show_branch_len,
        };
        let layout = TreeLayout::new(&tree, &collapsed, &opt).unwrap();
        (tree, layout)
    }

    fn pos<'a>(tree: &Tree, layout: &'a TreeLayout, name: &str) -> &'a NodePosition {
        layout.get(tree.get_node_by_name(name).unwrap()).unwrap()
    }

    #[test]
    fn test_branch_length_scaling() {
        let (tree, layout) = lay_out("((A:1,B:3)AB:1,C:2)root:7;", &[], true);

        // deepest leaf is B at 4 units
        assert_relative_eq!(pos(&tree, &layout, "B").len, 100.0);
        assert_relative_eq!(pos(&tree, &layout, "A").len, 50.0);
        assert_relative_eq!(pos(&tree, &layout, "AB").len, 25.0);
        assert_relative_eq!(pos(&tree, &layout, "C").len, 50.0);
        assert_relative_eq!(pos(&tree, &layout, "root").len, 0.0);
    }

    #[test]
    fn test_sorting_and_ranks() {
        let (tree, layout) = lay_out("((A:1,B:3)AB:1,C:2)root;", &[], true);

        // AB (1) sorts before C (2)
        assert_eq!(layout.leaf_names(), vec!["A", "B", "C"]);
        assert_relative_eq!(pos(&tree, &layout, "A").y, 5.0);
        assert_relative_eq!(pos(&tree, &layout, "B").y, 15.0);
        assert_relative_eq!(pos(&tree, &layout, "C").y, 25.0);
        assert_relative_eq!(pos(&tree, &layout, "AB").y, 10.0);
        assert_relative_eq!(pos(&tree, &layout, "root").y, 17.5);
        assert_relative_eq!(layout.total_height(), 30.0);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let (_, layout) = lay_out("(D,B,C,A);", &[], true);
        assert_eq!(layout.leaf_names(), vec!["D", "B", "C", "A"]);
    }

    #[test]
    fn test_uniform_mode_aligns_leaves() {
        let (tree, layout) = lay_out("((A:1,B:3)AB:1,C:2)root;", &[], false);

        assert_relative_eq!(pos(&tree, &layout, "A").x, 100.0);
        assert_relative_eq!(pos(&tree, &layout, "C").x, 100.0);
        assert_relative_eq!(pos(&tree, &layout, "AB").x, 50.0);
        assert_relative_eq!(pos(&tree, &layout, "root").x, 0.0);
        assert_eq!(pos(&tree, &layout, "A").depth, 2);
    }

    #[test]
    fn test_collapse() {
        let (tree, layout) = lay_out("((A:1,B:3)AB:1,C:2)root;", &["AB"], true);

        assert_eq!(layout.leaves().len(), 2);
        assert_eq!(layout.len(), 3);
        let ab = pos(&tree, &layout, "AB");
        assert!(ab.is_leaf);
        assert!(ab.collapsed);
        assert_eq!(ab.height, 1);
        assert!(layout.get(tree.get_node_by_name("A").unwrap()).is_none());

        // C is now the deepest leaf
        assert_relative_eq!(pos(&tree, &layout, "C").len, 100.0);
        assert_relative_eq!(ab.len, 50.0);

        // the tree is untouched and can be laid out expanded again
        let expanded = TreeLayout::new(&tree, &HashSet::new(), &LayoutOptions::default()).unwrap();
        assert_eq!(expanded.leaves().len(), 3);
    }

    #[test]
    fn test_collapse_leaf_and_root() {
        let (tree, layout) = lay_out("((A,B)AB,C)root;", &["C"], true);
        assert!(!pos(&tree, &layout, "C").collapsed);
        assert_eq!(layout.leaves().len(), 3);

        let (tree, layout) = lay_out("((A,B)AB,C)root;", &["root"], false);
        assert_eq!(layout.len(), 1);
        assert_eq!(pos(&tree, &layout, "root").height, 1);
        assert_relative_eq!(pos(&tree, &layout, "root").x, 0.0);
    }

    #[test]
    fn test_heights() {
        let (tree, layout) = lay_out("(((A,B)X,C)Y,(D,E,F)Z)root;", &[], true);
        assert_eq!(pos(&tree, &layout, "root").height, 6);
        assert_eq!(pos(&tree, &layout, "Y").height, 3);
        assert_eq!(pos(&tree, &layout, "X").height, 2);
        assert_eq!(pos(&tree, &layout, "Z").height, 3);
    }

    #[test]
    fn test_zero_branch_lengths() {
        let (tree, layout) = lay_out("(A,B)root;", &[], true);
        assert_relative_eq!(pos(&tree, &layout, "A").len, 0.0);
        assert_relative_eq!(pos(&tree, &layout, "B").len, 0.0);
    }

    #[test]
    fn test_negative_branch_clamped() {
        let (tree, layout) = lay_out("(A:-1,B:2)root;", &[], true);
        assert_eq!(layout.leaf_names(), vec!["A", "B"]);
        assert_relative_eq!(pos(&tree, &layout, "A").len, 0.0);
        assert_relative_eq!(pos(&tree, &layout, "B").len, 100.0);
    }

    #[test]
    fn test_empty_and_single_node() {
        let layout =
            TreeLayout::new(&Tree::new(), &HashSet::new(), &LayoutOptions::default()).unwrap();
        assert!(layout.is_empty());
        assert_eq!(layout.total_height(), 0.0);
        assert_eq!(layout.leaf_at(5.0), None);

        let (tree, layout) = lay_out("A;", &[], true);
        let a = pos(&tree, &layout, "A");
        assert!(a.is_leaf);
        assert_relative_eq!(a.x, 0.0);
        assert_relative_eq!(layout.total_height(), 10.0);
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut tree = Tree::new();
        let root = tree.add_node();
        let a = tree.add_node();
        tree.set_root(root);
        tree.add_child(root, a).unwrap();
        // a second edge to the same node bypasses add_child's checks
        tree.get_node_mut(root).unwrap().children.push(a);

        let err = TreeLayout::new(&tree, &HashSet::new(), &LayoutOptions::default()).unwrap_err();
        assert_eq!(err, LayoutError::DuplicateNode(a));

        tree.get_node_mut(root).unwrap().children = vec![a, 42];
        let err = TreeLayout::new(&tree, &HashSet::new(), &LayoutOptions::default()).unwrap_err();
        assert_eq!(err, LayoutError::MissingNode(42));
    }

    #[test]
    fn test_leaf_at() {
        let (tree, layout) = lay_out("((A,B)AB,C)root;", &[], true);
        assert_eq!(layout.leaf_at(0.0), tree.get_node_by_name("A"));
        assert_eq!(layout.leaf_at(19.9), tree.get_node_by_name("B"));
        assert_eq!(layout.leaf_at(29.0), tree.get_node_by_name("C"));
        assert_eq!(layout.leaf_at(30.0), None);
        assert_eq!(layout.leaf_at(-1.0), None);
    }

    fn newick_strategy() -> impl Strategy<Value = String> {
        let leaf = (0u32..1000, 0u32..50).prop_map(|(n, l)| format!("L{}:{}", n, l as f64 / 10.0));
        leaf.prop_recursive(5, 64, 5, |inner| {
            (proptest::collection::vec(inner, 1..5), 0u32..50).prop_map(|(children, l)| {
                format!("({}):{}", children.join(","), l as f64 / 10.0)
            })
        })
        .prop_map(|s| format!("({});", s))
    }

    proptest! {
        #[test]
        fn layout_leaf_invariants(newick in newick_strategy(), show in any::<bool>()) {
            let tree = Tree::from_newick(&newick).unwrap();
            let opt = LayoutOptions { row_height: 7.0, tree_width: 150.0, show_branch_len: show };
            let layout = TreeLayout::new(&tree, &HashSet::new(), &opt).unwrap();

            prop_assert_eq!(layout.leaves().len(), tree.get_leaves().len());

            let ys: Vec<f64> = layout.leaves().iter().map(|&id| layout.get(id).unwrap().y).collect();
            prop_assert!(ys.windows(2).all(|w| w[0] < w[1]));

            let max_x = layout.iter().map(|(_, p)| p.x).fold(0.0, f64::max);
            if max_x > 0.0 {
                prop_assert!((max_x - 150.0).abs() < 1e-9);
            }
        }

        #[test]
        fn collapse_removes_descendant_leaves(newick in newick_strategy(), pick in any::<prop::sample::Index>()) {
            let tree = Tree::from_newick(&newick).unwrap();
            let internal: Vec<NodeId> = tree
                .preorder(tree.get_root().unwrap())
                .into_iter()
                .filter(|&id| !tree.get_node(id).unwrap().is_leaf())
                .collect();
            let target = internal[pick.index(internal.len())];

            let full = TreeLayout::new(&tree, &HashSet::new(), &LayoutOptions::default()).unwrap();
            let under = full.get(target).unwrap().height;

            let collapsed = HashSet::from([target]);
            let folded = TreeLayout::new(&tree, &collapsed, &LayoutOptions::default()).unwrap();
            prop_assert_eq!(folded.leaves().len(), full.leaves().len() - under + 1);
        }
    }
}
