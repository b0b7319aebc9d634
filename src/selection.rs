use crate::graph::NodeId;

/// The host's current node selection, in the order the nodes were picked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionSet {
    nodes: Vec<NodeId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn add(&mut self, id: NodeId) {
        if !self.contains(id) {
            self.nodes.push(id);
        }
    }

    pub fn remove(&mut self, id: NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|&other| other != id);
        self.nodes.len() != before
    }

    pub fn set(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.nodes.clear();
        for id in ids {
            self.add(id);
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}
