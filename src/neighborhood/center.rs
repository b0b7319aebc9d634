use crate::graph::{Graph, GraphObject, NodeId};
use crate::selection::SelectionSet;

use super::schema::NeighborhoodSchema;
use super::visibility::Baseline;

/// Finds the node with the most visible links to visible neighbors.
///
/// Ties go to the node enumerated last, and a graph whose visible nodes
/// have no links at all still yields its last visible node.
pub fn find_biggest_hub(graph: &Graph) -> Option<NodeId> {
    biggest_hub(graph, |object| graph.is_visible(object))
}

pub(super) fn biggest_hub(
    graph: &Graph,
    is_visible: impl Fn(GraphObject) -> bool,
) -> Option<NodeId> {
    let mut result = None;
    let mut max = 0usize;

    for node in graph.nodes() {
        if !is_visible(GraphObject::Node(node)) {
            continue;
        }

        let outgoing = graph
            .outgoing(node)
            .iter()
            .filter_map(|&link| Some((link, graph.link(link)?.target)));
        let incoming = graph
            .incoming(node)
            .iter()
            .filter_map(|&link| Some((link, graph.link(link)?.source)));

        let count = outgoing
            .chain(incoming)
            .filter(|&(link, other)| {
                is_visible(GraphObject::Link(link)) && is_visible(GraphObject::Node(other))
            })
            .count();

        if count >= max {
            max = count;
            result = Some(node);
        }
    }

    result
}

/// Replaces placeholders with the node they stand for, drops nodes that no
/// longer exist and removes duplicates while keeping order.
pub(super) fn resolve_roots(graph: &Graph, candidates: &[NodeId]) -> Vec<NodeId> {
    let mut roots = Vec::with_capacity(candidates.len());
    for &candidate in candidates {
        if !graph.contains_node(candidate) {
            continue;
        }
        let root = graph.surrogate_of(candidate).unwrap_or(candidate);
        if !roots.contains(&root) {
            roots.push(root);
        }
    }
    roots
}

/// The center a recomputation should use: the live selection, or the
/// biggest hub when nothing is selected.
pub(super) fn pending_center(baseline: &Baseline<'_>, selection: &SelectionSet) -> Vec<NodeId> {
    let graph = baseline.graph();
    let selected = selection
        .nodes()
        .iter()
        .copied()
        .filter(|&node| graph.contains_node(node))
        .collect::<Vec<_>>();

    if selected.is_empty() {
        let hub = biggest_hub(graph, |object| baseline.is_visible(object));
        return hub.into_iter().collect();
    }

    resolve_roots(graph, &selected)
}

/// True when some selected node is not currently marked as a center.
pub(super) fn is_center_changed(graph: &Graph, selection: &SelectionSet) -> bool {
    selection
        .nodes()
        .iter()
        .any(|&node| !graph.is_neighborhood_center(node))
}

/// Moves the center marks from `previous` to `next`.
pub(super) fn mark_center(graph: &mut Graph, previous: &[NodeId], next: &[NodeId]) {
    for &node in previous {
        graph.set_neighborhood_center(node, false);
    }
    for &node in next {
        graph.set_neighborhood_center(node, true);
    }
}
