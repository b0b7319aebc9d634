use std::collections::{BTreeSet, HashSet};

use tracing::trace;

use crate::graph::{Graph, GraphObject, LinkId, NodeId, Visibility};

use super::layers::LayerMap;
use super::schema::NeighborhoodSchema;

/// Visibility of the graph as it will be once everything the engine hid on
/// the previous pass has been restored.
///
/// Passes are computed against this view so nothing touches the graph until
/// the final commit.
pub(super) struct Baseline<'a> {
    graph: &'a Graph,
    engine_hidden: &'a HashSet<GraphObject>,
}

impl<'a> Baseline<'a> {
    pub(super) fn graph(&self) -> &'a Graph {
        self.graph
    }

    pub(super) fn is_visible(&self, object: GraphObject) -> bool {
        match self.graph.visibility(object) {
            Some(Visibility::Visible) => true,
            Some(Visibility::Hidden) => self.engine_hidden.contains(&object),
            None => false,
        }
    }

    /// A link takes part in neighborhood traversal while it is shown and is
    /// not a containment link.
    pub(super) fn is_traversable(&self, link: LinkId) -> bool {
        self.graph.link(link).is_some_and(|data| !data.is_containment)
            && self.is_visible(GraphObject::Link(link))
    }
}

/// Objects the current pass intends to hide.
#[derive(Debug, Default)]
pub(super) struct HidePlan {
    objects: BTreeSet<GraphObject>,
}

impl HidePlan {
    pub(super) fn contains(&self, object: GraphObject) -> bool {
        self.objects.contains(&object)
    }

    pub(super) fn len(&self) -> usize {
        self.objects.len()
    }

    /// Traversable in the baseline and not staged for hiding by this pass.
    pub(super) fn link_in_neighborhood(&self, baseline: &Baseline<'_>, link: LinkId) -> bool {
        baseline.is_traversable(link) && !self.contains(GraphObject::Link(link))
    }

    /// Stages `object` for hiding. With `cascade`, members of a group are
    /// hidden along with it, recursively.
    ///
    /// Objects already hidden by someone else are never recorded, so a reset
    /// cannot reveal them.
    pub(super) fn hide(&mut self, baseline: &Baseline<'_>, object: GraphObject, cascade: bool) {
        let graph = baseline.graph();
        let mut seen = HashSet::new();
        let mut pending = vec![object];

        while let Some(current) = pending.pop() {
            if !seen.insert(current) {
                continue;
            }
            if baseline.is_visible(current) {
                self.objects.insert(current);
            }
            if cascade
                && let GraphObject::Node(id) = current
                && graph.node(id).is_some_and(|node| node.is_group)
            {
                pending.extend(graph.children(id).map(GraphObject::Node));
            }
        }
    }

    /// Hides every shown node that did not make it into `layers`.
    pub(super) fn hide_outside(&mut self, baseline: &Baseline<'_>, layers: &LayerMap) -> usize {
        let before = self.len();
        for node in baseline.graph().nodes() {
            if !layers.contains_key(&node) && baseline.is_visible(GraphObject::Node(node)) {
                self.hide(baseline, GraphObject::Node(node), true);
            }
        }
        self.len() - before
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = GraphObject> + '_ {
        self.objects.iter().copied()
    }
}

/// Remembers what the engine hid and annotated so it can be undone exactly.
#[derive(Debug, Default)]
pub(super) struct Bookkeeper {
    hidden: HashSet<GraphObject>,
    annotated: Vec<NodeId>,
}

impl Bookkeeper {
    pub(super) fn hidden(&self) -> &HashSet<GraphObject> {
        &self.hidden
    }

    pub(super) fn baseline<'a>(&'a self, graph: &'a Graph) -> Baseline<'a> {
        Baseline {
            graph,
            engine_hidden: &self.hidden,
        }
    }

    /// Restores everything hidden by the engine and clears layer annotations.
    pub(super) fn reset(&mut self, graph: &mut Graph) -> usize {
        let restored = self.hidden.len();
        for object in self.hidden.drain() {
            graph.set_butterfly_hidden(object, false);
            graph.set_visibility(object, Visibility::Visible);
        }
        for node in self.annotated.drain(..) {
            graph.clear_layer(node);
        }
        restored
    }

    /// Full reset followed by applying `plan` and annotating `layers`.
    pub(super) fn commit(&mut self, graph: &mut Graph, plan: &HidePlan, layers: &LayerMap) {
        let restored = self.reset(graph);
        for object in plan.iter() {
            graph.set_butterfly_hidden(object, true);
            graph.set_visibility(object, Visibility::Hidden);
            self.hidden.insert(object);
        }
        for (&node, &layer) in layers {
            graph.set_layer(node, layer);
            self.annotated.push(node);
        }
        trace!(
            restored,
            hidden = self.hidden.len(),
            annotated = self.annotated.len(),
            "committed visibility"
        );
    }

    /// Adopts hide marks left in a freshly loaded graph so the next pass can
    /// restore them.
    pub(super) fn recover(&mut self, graph: &Graph) {
        self.hidden = graph.butterfly_hidden_objects().into_iter().collect();
        self.annotated = graph
            .nodes()
            .filter(|&node| graph.layer(node).is_some())
            .collect();
    }

    pub(super) fn forget(&mut self) {
        self.hidden.clear();
        self.annotated.clear();
    }
}
