use std::collections::HashMap;

use crate::node::Node;

/// Unique table: every reduced node is stored exactly once.
///
/// Index 0 is a sentry and index 1 is the terminal, so real decision nodes
/// start at index 2.
pub struct Storage {
    nodes: Vec<Node>,
    unique: HashMap<Node, u32>,
}

impl Storage {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(2));
        nodes.push(Node::terminal()); // sentry
        nodes.push(Node::terminal());
        Self {
            nodes,
            unique: HashMap::with_capacity(capacity),
        }
    }

    /// Number of allocated nodes, terminal included.
    pub fn size(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn node(&self, index: u32) -> &Node {
        &self.nodes[index as usize]
    }

    /// Return the index of `node`, allocating it if it is new.
    pub fn put(&mut self, node: Node) -> u32 {
        if let Some(&index) = self.unique.get(&node) {
            return index;
        }
        let index = self.nodes.len();
        assert!(index <= i32::MAX as usize, "Node storage exhausted");
        let index = index as u32;
        self.nodes.push(node);
        self.unique.insert(node, index);
        index
    }
}
