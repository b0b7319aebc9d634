//! Graph properties the engine reads and mirrors.
//!
//! These names are persisted with saved documents, so they must not change.

use crate::graph::{Graph, GraphObject, NodeId, Properties};

pub const BUTTERFLY_MODE: &str = "ButterflyMode";
pub const NEIGHBORHOOD_DISTANCE: &str = "NeighborhoodDistance";
pub const NEIGHBORHOOD_CENTER: &str = "NeighborhoodCenter";
pub const IS_BUTTERFLY_HIDDEN: &str = "IsButterflyHidden";
pub const LAYER: &str = "Layer";
pub const SURROGATE_OF: &str = "SurrogateOf";

/// Boolean flags are stored only while true.
fn set_flag(properties: &mut Properties, name: &str, on: bool) {
    if on {
        properties.set(name, true);
    } else {
        properties.clear(name);
    }
}

pub trait NeighborhoodSchema {
    fn butterfly_mode(&self) -> bool;
    fn set_butterfly_mode(&mut self, on: bool);

    fn neighborhood_distance(&self) -> Option<i64>;
    fn set_neighborhood_distance(&mut self, distance: u32);
    fn clear_neighborhood_distance(&mut self);

    fn is_neighborhood_center(&self, node: NodeId) -> bool;
    fn set_neighborhood_center(&mut self, node: NodeId, center: bool);
    fn center_nodes(&self) -> Vec<NodeId>;

    fn is_butterfly_hidden(&self, object: GraphObject) -> bool;
    fn set_butterfly_hidden(&mut self, object: GraphObject, hidden: bool);
    fn butterfly_hidden_objects(&self) -> Vec<GraphObject>;

    fn layer(&self, node: NodeId) -> Option<i32>;
    fn set_layer(&mut self, node: NodeId, layer: i32);
    fn clear_layer(&mut self, node: NodeId);

    /// The canonical node a placeholder stands in for, if it still exists.
    fn surrogate_of(&self, node: NodeId) -> Option<NodeId>;
}

impl NeighborhoodSchema for Graph {
    fn butterfly_mode(&self) -> bool {
        self.properties().bool(BUTTERFLY_MODE)
    }

    fn set_butterfly_mode(&mut self, on: bool) {
        set_flag(self.properties_mut(), BUTTERFLY_MODE, on);
    }

    fn neighborhood_distance(&self) -> Option<i64> {
        self.properties().int(NEIGHBORHOOD_DISTANCE)
    }

    fn set_neighborhood_distance(&mut self, distance: u32) {
        self.properties_mut()
            .set(NEIGHBORHOOD_DISTANCE, i64::from(distance));
    }

    fn clear_neighborhood_distance(&mut self) {
        self.properties_mut().clear(NEIGHBORHOOD_DISTANCE);
    }

    fn is_neighborhood_center(&self, node: NodeId) -> bool {
        self.node(node)
            .is_some_and(|data| data.properties.bool(NEIGHBORHOOD_CENTER))
    }

    fn set_neighborhood_center(&mut self, node: NodeId, center: bool) {
        if let Some(data) = self.node_mut(node) {
            set_flag(&mut data.properties, NEIGHBORHOOD_CENTER, center);
        }
    }

    fn center_nodes(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|&id| self.is_neighborhood_center(id))
            .collect()
    }

    fn is_butterfly_hidden(&self, object: GraphObject) -> bool {
        self.object_properties(object)
            .is_some_and(|properties| properties.bool(IS_BUTTERFLY_HIDDEN))
    }

    fn set_butterfly_hidden(&mut self, object: GraphObject, hidden: bool) {
        if let Some(properties) = self.object_properties_mut(object) {
            set_flag(properties, IS_BUTTERFLY_HIDDEN, hidden);
        }
    }

    fn butterfly_hidden_objects(&self) -> Vec<GraphObject> {
        self.nodes()
            .map(GraphObject::Node)
            .chain(self.links().map(GraphObject::Link))
            .filter(|&object| self.is_butterfly_hidden(object))
            .collect()
    }

    fn layer(&self, node: NodeId) -> Option<i32> {
        self.node(node)
            .and_then(|data| data.properties.int(LAYER))
            .and_then(|layer| i32::try_from(layer).ok())
    }

    fn set_layer(&mut self, node: NodeId, layer: i32) {
        if let Some(data) = self.node_mut(node) {
            data.properties.set(LAYER, i64::from(layer));
        }
    }

    fn clear_layer(&mut self, node: NodeId) {
        if let Some(data) = self.node_mut(node) {
            data.properties.clear(LAYER);
        }
    }

    fn surrogate_of(&self, node: NodeId) -> Option<NodeId> {
        let key = self.node(node)?.properties.text(SURROGATE_OF)?;
        self.node_by_key(key)
    }
}
