use std::collections::HashSet;

use crate::error::NeighborhoodError;
use crate::graph::{Graph, NodeId};

use super::cancel::CancelToken;
use super::layers::LayerMap;

/// Pulls the ancestor groups of every retained node into `layers`.
///
/// An ancestor takes the layer of the first descendant that reaches it.
pub(super) fn populate_groups(
    graph: &Graph,
    cancel: &CancelToken,
    layers: &mut LayerMap,
) -> Result<usize, NeighborhoodError> {
    let before = layers.len();
    let retained = layers
        .iter()
        .map(|(&node, &layer)| (node, layer))
        .collect::<Vec<_>>();

    for (node, layer) in retained {
        cancel.check()?;
        add_parents(graph, layers, node, layer);
    }

    Ok(layers.len() - before)
}

fn add_parents(graph: &Graph, layers: &mut LayerMap, node: NodeId, layer: i32) {
    // Containment should be a tree; the visited set guards malformed input.
    let mut visited = HashSet::from([node]);
    let mut pending = vec![node];

    while let Some(current) = pending.pop() {
        for parent in graph.parent_groups(current) {
            layers.entry(parent).or_insert(layer);
            if visited.insert(parent) {
                pending.push(parent);
            }
        }
    }
}
