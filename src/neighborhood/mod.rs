//! Neighborhood and butterfly views over a [`Graph`].
//!
//! The analyzer keeps a set of center nodes and hides everything outside
//! their neighborhood:
//! - browse mode keeps nodes within a hop distance, ignoring direction
//! - butterfly mode keeps only links that step exactly one layer away from
//!   the center, upstream on one side and downstream on the other
//!
//! Each recomputation is computed against the graph as it would be with the
//! previous pass undone, and only touches the graph once it has finished.
//! A cancelled pass therefore leaves visibility exactly as it was.

mod butterfly;
mod cancel;
mod center;
mod groups;
mod layers;
pub mod schema;
mod visibility;

use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::debug;

use crate::error::NeighborhoodError;
use crate::graph::{Graph, GraphObject, NodeId};
use crate::selection::SelectionSet;

use self::center::{is_center_changed, mark_center, pending_center, resolve_roots};
use self::layers::{LayerBuilder, LayerRules};
use self::schema::NeighborhoodSchema;
use self::visibility::{Bookkeeper, HidePlan};

pub use self::cancel::CancelToken;
pub use self::center::find_biggest_hub;
pub use self::layers::LayerMap;

/// Distance value meaning "no limit".
pub const NEIGHBORHOOD_DISTANCE_ALL: u32 = u32::MAX;

/// Persisted distances in `1..MAX_RESTORED_DISTANCE` turn browse mode back on
/// when a document is loaded.
const MAX_RESTORED_DISTANCE: i64 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeProperty {
    BrowseMode,
    Distance,
    ButterflyMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NeighborhoodEvent {
    PropertyChanged(ModeProperty),
    /// A recomputation finished; the host should redraw.
    NeighborhoodChanged,
}

/// Where a recomputation takes its center from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CenterSource {
    Selection,
    Current,
}

/// Result of a pass before it is applied to the graph.
struct Staged {
    roots: Vec<NodeId>,
    layers: LayerMap,
    plan: HidePlan,
}

impl Staged {
    fn unchanged(roots: Vec<NodeId>) -> Self {
        Self {
            roots,
            layers: LayerMap::new(),
            plan: HidePlan::default(),
        }
    }
}

pub struct NeighborhoodAnalyzer {
    graph: Option<Graph>,
    selection: SelectionSet,
    browse_mode: bool,
    distance: u32,
    butterfly_mode: bool,
    enabled: bool,
    roots: Vec<NodeId>,
    layers: LayerMap,
    bookkeeper: Bookkeeper,
    cancel: CancelToken,
    listeners: Vec<Sender<NeighborhoodEvent>>,
}

impl Default for NeighborhoodAnalyzer {
    fn default() -> Self {
        Self::new(SelectionSet::new())
    }
}

impl NeighborhoodAnalyzer {
    pub fn new(selection: SelectionSet) -> Self {
        Self {
            graph: None,
            selection,
            browse_mode: false,
            distance: 1,
            butterfly_mode: false,
            enabled: true,
            roots: Vec::new(),
            layers: LayerMap::new(),
            bookkeeper: Bookkeeper::default(),
            cancel: CancelToken::new(),
            listeners: Vec::new(),
        }
    }

    pub fn with_graph(graph: Graph) -> Self {
        let mut analyzer = Self::default();
        analyzer.set_graph(graph);
        analyzer
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    /// Host edits go through here. Removing center nodes is fine; they are
    /// dropped on the next recomputation.
    pub fn graph_mut(&mut self) -> Option<&mut Graph> {
        self.graph.as_mut()
    }

    /// Binds a new graph and restores the persisted mode from it.
    ///
    /// The previous graph is returned with the engine's hides undone.
    pub fn set_graph(&mut self, graph: Graph) -> Option<Graph> {
        let previous = self.take_graph();
        self.graph = Some(graph);
        self.deserialize_state();
        previous
    }

    pub fn take_graph(&mut self) -> Option<Graph> {
        let mut previous = self.graph.take();
        if let Some(graph) = previous.as_mut() {
            self.bookkeeper.reset(graph);
        }
        self.bookkeeper.forget();
        self.layers.clear();
        self.roots.clear();
        previous
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }

    pub fn subscribe(&mut self) -> Receiver<NeighborhoodEvent> {
        let (tx, rx) = mpsc::channel();
        self.listeners.push(tx);
        rx
    }

    fn emit(&mut self, event: NeighborhoodEvent) {
        self.listeners.retain(|listener| listener.send(event).is_ok());
    }

    /// Interrupts a running recomputation at its next check.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A handle other threads can use to cancel.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn browse_mode(&self) -> bool {
        self.browse_mode
    }

    pub fn butterfly_mode(&self) -> bool {
        self.butterfly_mode
    }

    pub fn distance(&self) -> u32 {
        self.distance
    }

    pub fn get_center(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn layers(&self) -> &LayerMap {
        &self.layers
    }

    pub fn layer_of(&self, node: NodeId) -> Option<i32> {
        self.layers.get(&node).copied()
    }

    /// Objects hidden by the engine, as opposed to by the user.
    pub fn hidden(&self) -> &HashSet<GraphObject> {
        self.bookkeeper.hidden()
    }

    /// Turns browse mode on, or re-centers on the selection when it is
    /// already on.
    pub fn toggle_neighborhood_browse_mode(&mut self) -> Result<(), NeighborhoodError> {
        if self.browse_mode {
            self.update_neighborhood()
        } else {
            self.set_browse_mode(true)
        }
    }

    pub fn set_browse_mode(&mut self, on: bool) -> Result<(), NeighborhoodError> {
        if self.browse_mode == on {
            return Ok(());
        }

        self.browse_mode = on;
        if let Some(graph) = self.graph.as_mut() {
            if on {
                graph.set_neighborhood_distance(self.distance);
            } else {
                graph.clear_neighborhood_distance();
            }
        }
        let result = self.update_neighborhood();
        self.emit(NeighborhoodEvent::PropertyChanged(ModeProperty::BrowseMode));
        result
    }

    /// Recomputes only while browse mode is on. Use
    /// [`NEIGHBORHOOD_DISTANCE_ALL`] for an unlimited distance.
    pub fn set_distance(&mut self, distance: u32) -> Result<(), NeighborhoodError> {
        if distance == 0 {
            return Err(NeighborhoodError::InvalidDistance(distance));
        }
        if self.distance != distance {
            self.distance = distance;
            self.emit(NeighborhoodEvent::PropertyChanged(ModeProperty::Distance));
        }
        if !self.browse_mode {
            return Ok(());
        }
        if let Some(graph) = self.graph.as_mut() {
            graph.set_neighborhood_distance(distance);
        }
        self.update_neighborhood()
    }

    /// Flips butterfly mode and recomputes. While butterfly mode is on and
    /// the selection has moved away from the current center, it stays on and
    /// only re-centers.
    pub fn toggle_butterfly_mode(&mut self) -> Result<(), NeighborhoodError> {
        let center_changed = self
            .graph
            .as_ref()
            .is_some_and(|graph| is_center_changed(graph, &self.selection));
        if !self.butterfly_mode || !center_changed {
            self.set_butterfly_mode(!self.butterfly_mode);
        }
        self.update_neighborhood()
    }

    /// Changes the flag without recomputing.
    pub fn set_butterfly_mode(&mut self, on: bool) {
        if self.butterfly_mode == on {
            return;
        }
        self.butterfly_mode = on;
        if let Some(graph) = self.graph.as_mut() {
            graph.set_butterfly_mode(on);
        }
        self.emit(NeighborhoodEvent::PropertyChanged(ModeProperty::ButterflyMode));
    }

    /// Rebuilds the mode and center from the bound graph's persisted
    /// properties. Layers are not recomputed; call
    /// [`Self::update_neighborhood`] afterwards.
    pub fn deserialize_state(&mut self) {
        self.layers.clear();
        let Some(graph) = self.graph.as_ref() else {
            self.bookkeeper.forget();
            self.roots.clear();
            return;
        };

        self.bookkeeper.recover(graph);
        self.butterfly_mode = graph.butterfly_mode();
        self.browse_mode = false;
        self.distance = 1;

        if let Some(distance) = graph.neighborhood_distance()
            && (1..MAX_RESTORED_DISTANCE).contains(&distance)
            && let Ok(distance) = u32::try_from(distance)
        {
            self.browse_mode = true;
            self.distance = distance;
        }

        self.roots = resolve_roots(graph, &graph.center_nodes());
        debug!(
            browse = self.browse_mode,
            distance = self.distance,
            butterfly = self.butterfly_mode,
            centers = self.roots.len(),
            recovered_hidden = self.bookkeeper.hidden().len(),
            "restored neighborhood state"
        );
    }

    /// Makes `nodes` the center, undoing whatever the engine had hidden.
    pub fn set_center(&mut self, nodes: impl IntoIterator<Item = NodeId>) {
        let candidates = nodes.into_iter().collect::<Vec<_>>();
        self.layers.clear();
        let Some(graph) = self.graph.as_mut() else {
            self.roots.clear();
            return;
        };

        self.bookkeeper.reset(graph);
        let roots = resolve_roots(graph, &candidates);
        mark_center(graph, &self.roots, &roots);
        self.roots = roots;
    }

    /// Recomputes the visible neighborhood from the selection, the distance
    /// and the butterfly flag.
    pub fn update_neighborhood(&mut self) -> Result<(), NeighborhoodError> {
        self.recompute(CenterSource::Selection)
    }

    /// Recomputes around the current center without consulting the selection.
    pub fn apply_butterfly(&mut self) -> Result<(), NeighborhoodError> {
        self.recompute(CenterSource::Current)
    }

    /// Drops centers that were deleted from the graph and lays out the rest.
    pub fn prepare_roots(&mut self) -> Result<(), NeighborhoodError> {
        self.cancel.reset();
        let Some(graph) = self.graph.as_ref() else {
            return Ok(());
        };

        let roots = resolve_roots(graph, &self.roots);
        let baseline = self.bookkeeper.baseline(graph);
        let layers = LayerBuilder::new(&baseline, &self.cancel, self.layer_rules())
            .create_layers(&roots)?;

        self.roots = roots;
        self.layers = layers;
        Ok(())
    }

    fn layer_rules(&self) -> LayerRules {
        LayerRules {
            distance_limit: self.browse_mode.then_some(self.distance),
            butterfly: self.butterfly_mode,
        }
    }

    fn recompute(&mut self, source: CenterSource) -> Result<(), NeighborhoodError> {
        self.cancel.reset();
        self.run_pass(source)
    }

    /// One pass against whatever state the cancel flag is in.
    fn run_pass(&mut self, source: CenterSource) -> Result<(), NeighborhoodError> {
        let Some(graph) = self.graph.as_ref() else {
            debug!("no graph bound; nothing to recompute");
            self.emit(NeighborhoodEvent::NeighborhoodChanged);
            return Ok(());
        };

        let staged = self.stage(graph, source).inspect_err(|err| {
            debug!(%err, "neighborhood recomputation abandoned");
        })?;

        if let Some(graph) = self.graph.as_mut() {
            self.bookkeeper.commit(graph, &staged.plan, &staged.layers);
            mark_center(graph, &self.roots, &staged.roots);
        }
        self.roots = staged.roots;
        self.layers = staged.layers;

        self.emit(NeighborhoodEvent::NeighborhoodChanged);
        Ok(())
    }

    /// Computes the next center, layers and hides without touching `graph`.
    fn stage(&self, graph: &Graph, source: CenterSource) -> Result<Staged, NeighborhoodError> {
        let rules = self.layer_rules();
        let baseline = self.bookkeeper.baseline(graph);
        let roots = match source {
            CenterSource::Selection => pending_center(&baseline, &self.selection),
            CenterSource::Current => resolve_roots(graph, &self.roots),
        };

        if !self.browse_mode && !self.butterfly_mode {
            return Ok(Staged::unchanged(Vec::new()));
        }
        if !self.enabled || roots.is_empty() {
            return Ok(Staged::unchanged(roots));
        }

        let mut layers = LayerBuilder::new(&baseline, &self.cancel, rules).create_layers(&roots)?;
        self.cancel.check()?;

        let mut plan = HidePlan::default();
        if rules.butterfly {
            butterfly::trim(&baseline, &self.cancel, &roots, &mut layers, &mut plan)?;
            self.cancel.check()?;
        }

        let groups = groups::populate_groups(graph, &self.cancel, &mut layers)?;
        self.cancel.check()?;

        let hidden_nodes = plan.hide_outside(&baseline, &layers);
        debug!(
            roots = roots.len(),
            retained = layers.len(),
            groups,
            hidden_nodes,
            staged = plan.len(),
            "neighborhood computed"
        );

        Ok(Staged {
            roots,
            layers,
            plan,
        })
    }
}
