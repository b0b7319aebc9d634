use std::collections::{BTreeMap, HashSet};

use tracing::trace;

use crate::error::NeighborhoodError;
use crate::graph::{Graph, LinkId, NodeId};

use super::cancel::CancelToken;
use super::visibility::Baseline;

/// Signed hop distance of each retained node from the nearest center.
///
/// Positive layers lie downstream of a center; in butterfly mode negative
/// layers lie upstream.
pub type LayerMap = BTreeMap<NodeId, i32>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct LayerRules {
    /// `None` walks until the graph runs out.
    pub(super) distance_limit: Option<u32>,
    pub(super) butterfly: bool,
}

impl LayerRules {
    fn within_limit(&self, layer: i32) -> bool {
        self.distance_limit
            .is_none_or(|limit| layer.unsigned_abs() <= limit)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Direction {
    Outgoing,
    Incoming,
}

impl Direction {
    pub(super) fn links(self, graph: &Graph, node: NodeId) -> &[LinkId] {
        match self {
            Self::Outgoing => graph.outgoing(node),
            Self::Incoming => graph.incoming(node),
        }
    }

    pub(super) fn far_end(self, graph: &Graph, link: LinkId) -> Option<NodeId> {
        let link = graph.link(link)?;
        Some(match self {
            Self::Outgoing => link.target,
            Self::Incoming => link.source,
        })
    }
}

/// When a walk may overwrite a layer that is already assigned.
#[derive(Clone, Copy, Debug)]
enum Overwrite {
    Closer,
    CloserOrEqual,
}

impl Overwrite {
    fn replaces(self, existing: i32, candidate: i32) -> bool {
        match self {
            Self::Closer => existing.unsigned_abs() > candidate.unsigned_abs(),
            Self::CloserOrEqual => existing.unsigned_abs() >= candidate.unsigned_abs(),
        }
    }
}

#[derive(Clone, Copy)]
struct Frame {
    node: NodeId,
    layer: i32,
    next: usize,
}

pub(super) struct LayerBuilder<'a> {
    baseline: &'a Baseline<'a>,
    cancel: &'a CancelToken,
    rules: LayerRules,
}

impl<'a> LayerBuilder<'a> {
    pub(super) fn new(baseline: &'a Baseline<'a>, cancel: &'a CancelToken, rules: LayerRules) -> Self {
        Self {
            baseline,
            cancel,
            rules,
        }
    }

    /// Assigns every root layer 0, then walks outward from each root along
    /// outgoing links and back along incoming links.
    pub(super) fn create_layers(&self, roots: &[NodeId]) -> Result<LayerMap, NeighborhoodError> {
        let mut layers = LayerMap::new();
        for &root in roots {
            layers.insert(root, 0);
        }

        // Without butterfly the neighborhood is undirected, so upstream
        // neighbors count as positive distances too.
        let upstream_step = if self.rules.butterfly { -1 } else { 1 };

        for &root in roots {
            self.walk(&mut layers, root, 1, Direction::Outgoing, Overwrite::Closer)?;
            self.walk(
                &mut layers,
                root,
                upstream_step,
                Direction::Incoming,
                Overwrite::CloserOrEqual,
            )?;
            trace!(%root, layered = layers.len(), "layered root");
        }

        Ok(layers)
    }

    /// Depth-first walk that keeps the current path as its only visited set.
    ///
    /// A node can be reached again by another path and receive a shorter
    /// layer; the path set alone stops cycles.
    fn walk(
        &self,
        layers: &mut LayerMap,
        start: NodeId,
        step: i32,
        direction: Direction,
        overwrite: Overwrite,
    ) -> Result<(), NeighborhoodError> {
        let graph = self.baseline.graph();
        let mut on_path = HashSet::new();
        let mut stack = vec![Frame {
            node: start,
            layer: step,
            next: 0,
        }];

        while let Some(top) = stack.len().checked_sub(1) {
            let Frame { node, layer, next } = stack[top];
            let Some(&link) = direction.links(graph, node).get(next) else {
                stack.pop();
                if !stack.is_empty() {
                    on_path.remove(&node);
                }
                continue;
            };
            stack[top].next += 1;
            self.cancel.check()?;

            if !self.baseline.is_traversable(link) {
                continue;
            }
            let Some(other) = direction.far_end(graph, link) else {
                continue;
            };
            if on_path.contains(&other) {
                continue;
            }

            let replace = layers
                .get(&other)
                .is_none_or(|&existing| overwrite.replaces(existing, layer));
            if !replace {
                continue;
            }
            layers.insert(other, layer);

            let deeper = layer + step;
            if self.rules.within_limit(deeper) {
                on_path.insert(other);
                stack.push(Frame {
                    node: other,
                    layer: deeper,
                    next: 0,
                });
            }
        }

        Ok(())
    }
}
