use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use super::model::{Graph, GraphObject, NodeId, Visibility};
use super::property::Properties;

/// JSON interchange form of a [`Graph`].
///
/// Containment is expressed by `groups` on the member node; links carrying
/// `containment: true` are accepted as well.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
    #[serde(default)]
    pub links: Vec<LinkEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, rename = "isGroup", skip_serializing_if = "is_false")]
    pub is_group: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkEntry {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub containment: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn visibility_of(hidden: bool) -> Visibility {
    if hidden {
        Visibility::Hidden
    } else {
        Visibility::Visible
    }
}

impl GraphDocument {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid graph document JSON")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize graph document")
    }

    pub fn into_graph(self) -> Result<Graph> {
        let mut graph = Graph::new();
        *graph.properties_mut() = self.properties;

        let mut ids: HashMap<String, NodeId> = HashMap::with_capacity(self.nodes.len());
        for entry in &self.nodes {
            if ids.contains_key(&entry.id) {
                return Err(anyhow!("duplicate node id {:?}", entry.id));
            }
            let label = entry.label.as_deref().unwrap_or(&entry.id);
            let id = if entry.is_group {
                graph.add_group(&entry.id, label)
            } else {
                graph.add_node(&entry.id, label)
            };
            graph.set_visibility(GraphObject::Node(id), visibility_of(entry.hidden));
            if let Some(node) = graph.node_mut(id) {
                node.properties = entry.properties.clone();
            }
            ids.insert(entry.id.clone(), id);
        }

        let lookup = |key: &str| {
            ids.get(key)
                .copied()
                .ok_or_else(|| anyhow!("link references unknown node {key:?}"))
        };

        for entry in &self.nodes {
            let child = lookup(&entry.id)?;
            for group in &entry.groups {
                let parent = lookup(group)
                    .with_context(|| format!("invalid group of node {:?}", entry.id))?;
                graph.add_containment(parent, child);
            }
        }

        for entry in self.links {
            let source = lookup(&entry.source)?;
            let target = lookup(&entry.target)?;
            let link = if entry.containment {
                graph.add_containment(source, target)
            } else {
                graph.add_link(source, target)
            };
            graph.set_visibility(GraphObject::Link(link), visibility_of(entry.hidden));
            if let Some(data) = graph.link_mut(link) {
                data.properties = entry.properties;
            }
        }

        Ok(graph)
    }

    /// Captures the live contents of `graph`, including visibility and properties.
    pub fn from_graph(graph: &Graph) -> Self {
        let nodes = graph
            .nodes()
            .filter_map(|id| {
                let node = graph.node(id)?;
                let groups = graph
                    .parent_groups(id)
                    .filter_map(|parent| graph.node(parent))
                    .map(|parent| parent.key.clone())
                    .collect();
                Some(NodeEntry {
                    id: node.key.clone(),
                    label: (node.label != node.key).then(|| node.label.clone()),
                    is_group: node.is_group,
                    groups,
                    hidden: node.visibility == Visibility::Hidden,
                    properties: node.properties.clone(),
                })
            })
            .collect();

        let links = graph
            .links()
            .filter_map(|id| graph.link(id))
            .filter(|link| !link.is_containment)
            .filter_map(|link| {
                Some(LinkEntry {
                    source: graph.node(link.source)?.key.clone(),
                    target: graph.node(link.target)?.key.clone(),
                    containment: false,
                    hidden: link.visibility == Visibility::Hidden,
                    properties: link.properties.clone(),
                })
            })
            .collect();

        Self {
            properties: graph.properties().clone(),
            nodes,
            links,
        }
    }
}
