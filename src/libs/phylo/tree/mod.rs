pub mod traversal;

use super::error::TreeError;
use super::node::{Node, NodeId};

#[derive(Debug, Default, Clone)]
pub struct Tree {
    /// Arena storage for all nodes
    pub(super) nodes: Vec<Node>,

    /// Optional root ID (a tree might be empty or in construction)
    pub(super) root: Option<NodeId>,
}

impl Tree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new node to the tree. Returns the new node's ID.
    pub fn add_node(&mut self) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(id));
        id
    }

    /// Get number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get root ID
    pub fn get_root(&self) -> Option<NodeId> {
        self.root
    }

    /// Get a reference to a node by ID.
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a mutable reference to a node by ID.
    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Set a node as the root of the tree.
    pub fn set_root(&mut self, id: NodeId) {
        if self.get_node(id).is_some() {
            self.root = Some(id);
        }
    }

    /// Add a child to a parent node.
    /// Updates both parent's `children` list and child's `parent` field.
    pub fn add_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<(), TreeError> {
        if parent_id == child_id {
            return Err(TreeError::LogicError(
                "Cannot add node as child of itself".to_string(),
            ));
        }
        if self.get_node(parent_id).is_none() {
            return Err(TreeError::NodeNotFound(parent_id));
        }
        if self.get_node(child_id).is_none() {
            return Err(TreeError::NodeNotFound(child_id));
        }
        if let Some(old_parent) = self.nodes[child_id].parent {
            return Err(TreeError::LogicError(format!(
                "Node {} already has parent {}",
                child_id, old_parent
            )));
        }

        self.nodes[child_id].parent = Some(parent_id);
        self.nodes[parent_id].children.push(child_id);

        Ok(())
    }

    /// Find the first node with the given name.
    pub fn get_node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.name.as_deref() == Some(name))
            .map(|n| n.id)
    }

    /// IDs of the leaves reachable from the root, left to right.
    pub fn get_leaves(&self) -> Vec<NodeId> {
        match self.root {
            Some(root) => traversal::preorder(self, root)
                .into_iter()
                .filter(|&id| self.nodes[id].is_leaf())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn preorder(&self, start_node: NodeId) -> Vec<NodeId> {
        traversal::preorder(self, start_node)
    }

    /// Read Newick trees from a file.
    pub fn from_file(infile: &str) -> anyhow::Result<Vec<Tree>> {
        let newick = crate::read_to_string(infile)?;
        Ok(Tree::from_newick_multi(newick.as_str())?)
    }
}
