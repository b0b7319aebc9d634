use std::collections::HashSet;

use tracing::debug;

use crate::error::NeighborhoodError;
use crate::graph::{GraphObject, NodeId};

use super::cancel::CancelToken;
use super::layers::{Direction, LayerMap};
use super::visibility::{Baseline, HidePlan};

/// Stages every link that does not bridge adjacent layers, then drops nodes
/// that lost their connection to the roots.
pub(super) fn trim(
    baseline: &Baseline<'_>,
    cancel: &CancelToken,
    roots: &[NodeId],
    layers: &mut LayerMap,
    plan: &mut HidePlan,
) -> Result<(), NeighborhoodError> {
    let graph = baseline.graph();
    let staged_before = plan.len();

    for (&node, &layer) in layers.iter() {
        cancel.check()?;

        for &link in graph.incoming(node) {
            if !plan.link_in_neighborhood(baseline, link) {
                continue;
            }
            if let Some(source) = Direction::Incoming.far_end(graph, link)
                && let Some(&source_layer) = layers.get(&source)
                && source_layer != layer - 1
            {
                plan.hide(baseline, GraphObject::Link(link), false);
            }
        }

        for &link in graph.outgoing(node) {
            if !plan.link_in_neighborhood(baseline, link) {
                continue;
            }
            if let Some(target) = Direction::Outgoing.far_end(graph, link)
                && let Some(&target_layer) = layers.get(&target)
                && target_layer != layer + 1
            {
                plan.hide(baseline, GraphObject::Link(link), false);
            }
        }
    }

    let mut connected = HashSet::new();
    for &root in roots {
        connected.insert(root);
        reach(baseline, cancel, plan, layers, root, Direction::Outgoing, &mut connected)?;
        reach(baseline, cancel, plan, layers, root, Direction::Incoming, &mut connected)?;
    }

    let before = layers.len();
    layers.retain(|node, _| connected.contains(node));
    debug!(
        trimmed_links = plan.len() - staged_before,
        severed_nodes = before - layers.len(),
        "butterfly trimmed"
    );

    Ok(())
}

/// Collects layered nodes reachable from `root` in one direction through
/// links that survived trimming.
fn reach(
    baseline: &Baseline<'_>,
    cancel: &CancelToken,
    plan: &HidePlan,
    layers: &LayerMap,
    root: NodeId,
    direction: Direction,
    connected: &mut HashSet<NodeId>,
) -> Result<(), NeighborhoodError> {
    let graph = baseline.graph();
    let mut visited = HashSet::new();
    let mut pending = vec![root];

    while let Some(node) = pending.pop() {
        cancel.check()?;
        for &link in direction.links(graph, node) {
            if !plan.link_in_neighborhood(baseline, link) {
                continue;
            }
            let Some(next) = direction.far_end(graph, link) else {
                continue;
            };
            if layers.contains_key(&next) && visited.insert(next) {
                connected.insert(next);
                pending.push(next);
            }
        }
    }

    Ok(())
}
