use std::collections::HashMap;
use std::fmt;

use super::property::Properties;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

/// Anything whose visibility can be toggled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GraphObject {
    Node(NodeId),
    Link(LinkId),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub key: String,
    pub label: String,
    pub is_group: bool,
    pub visibility: Visibility,
    pub properties: Properties,
    outgoing: Vec<LinkId>,
    incoming: Vec<LinkId>,
    alive: bool,
}

impl Node {
    pub fn outgoing(&self) -> &[LinkId] {
        &self.outgoing
    }

    pub fn incoming(&self) -> &[LinkId] {
        &self.incoming
    }
}

#[derive(Clone, Debug)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
    /// Group membership: `source` is the group, `target` the member.
    pub is_containment: bool,
    pub visibility: Visibility,
    pub properties: Properties,
    alive: bool,
}

/// Directed multigraph with a containment hierarchy layered on top.
///
/// Nodes and links live in arenas and are addressed by index. Removal
/// tombstones the slot so ids held elsewhere never alias a different object.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    links: Vec<Link>,
    by_key: HashMap<String, NodeId>,
    properties: Properties,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing node when `key` is already present.
    pub fn add_node(&mut self, key: &str, label: &str) -> NodeId {
        if let Some(&id) = self.by_key.get(key) {
            return id;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            key: key.to_owned(),
            label: label.to_owned(),
            is_group: false,
            visibility: Visibility::Visible,
            properties: Properties::default(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            alive: true,
        });
        self.by_key.insert(key.to_owned(), id);
        id
    }

    pub fn add_group(&mut self, key: &str, label: &str) -> NodeId {
        let id = self.add_node(key, label);
        self.nodes[id.0].is_group = true;
        id
    }

    pub fn add_link(&mut self, source: NodeId, target: NodeId) -> LinkId {
        self.push_link(source, target, false)
    }

    /// Makes `child` a member of `group`, flagging `group` as a group node.
    pub fn add_containment(&mut self, group: NodeId, child: NodeId) -> LinkId {
        if let Some(node) = self.node_mut(group) {
            node.is_group = true;
        }
        self.push_link(group, child, true)
    }

    fn push_link(&mut self, source: NodeId, target: NodeId, is_containment: bool) -> LinkId {
        let id = LinkId(self.links.len());
        let alive = self.contains_node(source) && self.contains_node(target);
        self.links.push(Link {
            source,
            target,
            is_containment,
            visibility: Visibility::Visible,
            properties: Properties::default(),
            alive,
        });
        if alive {
            self.nodes[source.0].outgoing.push(id);
            self.nodes[target.0].incoming.push(id);
        }
        id
    }

    pub fn remove_node(&mut self, id: NodeId) -> bool {
        if !self.contains_node(id) {
            return false;
        }

        let node = &mut self.nodes[id.0];
        node.alive = false;
        let attached = node
            .outgoing
            .drain(..)
            .chain(node.incoming.drain(..))
            .collect::<Vec<_>>();
        let key = node.key.clone();
        self.by_key.remove(&key);

        for link in attached {
            self.remove_link(link);
        }
        true
    }

    pub fn remove_link(&mut self, id: LinkId) -> bool {
        let Some(link) = self.links.get_mut(id.0).filter(|link| link.alive) else {
            return false;
        };
        link.alive = false;
        let (source, target) = (link.source, link.target);

        if let Some(node) = self.nodes.get_mut(source.0) {
            node.outgoing.retain(|&other| other != id);
        }
        if let Some(node) = self.nodes.get_mut(target.0) {
            node.incoming.retain(|&other| other != id);
        }
        true
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(|node| node.alive)
    }

    pub fn contains_link(&self, id: LinkId) -> bool {
        self.links.get(id.0).is_some_and(|link| link.alive)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).filter(|node| node.alive)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).filter(|node| node.alive)
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.0).filter(|link| link.alive)
    }

    pub fn link_mut(&mut self, id: LinkId) -> Option<&mut Link> {
        self.links.get_mut(id.0).filter(|link| link.alive)
    }

    pub fn node_by_key(&self, key: &str) -> Option<NodeId> {
        self.by_key.get(key).copied()
    }

    /// Live nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.alive)
            .map(|(index, _)| NodeId(index))
    }

    pub fn links(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.links
            .iter()
            .enumerate()
            .filter(|(_, link)| link.alive)
            .map(|(index, _)| LinkId(index))
    }

    pub fn visible_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes()
            .filter(move |&id| self.is_visible(GraphObject::Node(id)))
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    pub fn link_count(&self) -> usize {
        self.links().count()
    }

    pub fn outgoing(&self, id: NodeId) -> &[LinkId] {
        self.node(id).map(Node::outgoing).unwrap_or(&[])
    }

    pub fn incoming(&self, id: NodeId) -> &[LinkId] {
        self.node(id).map(Node::incoming).unwrap_or(&[])
    }

    /// Groups that directly contain `id`.
    pub fn parent_groups(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.incoming(id)
            .iter()
            .filter_map(move |&link| self.link(link))
            .filter(|link| link.is_containment)
            .map(|link| link.source)
    }

    /// Direct members of the group `id` (nodes and nested groups).
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.outgoing(id)
            .iter()
            .filter_map(move |&link| self.link(link))
            .filter(|link| link.is_containment)
            .map(|link| link.target)
    }

    pub fn visibility(&self, object: GraphObject) -> Option<Visibility> {
        match object {
            GraphObject::Node(id) => self.node(id).map(|node| node.visibility),
            GraphObject::Link(id) => self.link(id).map(|link| link.visibility),
        }
    }

    pub fn is_visible(&self, object: GraphObject) -> bool {
        self.visibility(object) == Some(Visibility::Visible)
    }

    pub fn set_visibility(&mut self, object: GraphObject, visibility: Visibility) {
        match object {
            GraphObject::Node(id) => {
                if let Some(node) = self.node_mut(id) {
                    node.visibility = visibility;
                }
            }
            GraphObject::Link(id) => {
                if let Some(link) = self.link_mut(id) {
                    link.visibility = visibility;
                }
            }
        }
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    pub fn object_properties(&self, object: GraphObject) -> Option<&Properties> {
        match object {
            GraphObject::Node(id) => self.node(id).map(|node| &node.properties),
            GraphObject::Link(id) => self.link(id).map(|link| &link.properties),
        }
    }

    pub fn object_properties_mut(&mut self, object: GraphObject) -> Option<&mut Properties> {
        match object {
            GraphObject::Node(id) => self.node_mut(id).map(|node| &mut node.properties),
            GraphObject::Link(id) => self.link_mut(id).map(|link| &mut link.properties),
        }
    }
}
