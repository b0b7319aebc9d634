//! Neighborhood and butterfly views for node-link graphs.
//!
//! Bind a [`Graph`] to a [`NeighborhoodAnalyzer`], pick a center through its
//! [`SelectionSet`] and call [`NeighborhoodAnalyzer::update_neighborhood`].
//! Everything outside the neighborhood is hidden on the graph itself and
//! restored on the next pass.

mod error;
pub mod graph;
pub mod neighborhood;
pub mod selection;

pub use error::NeighborhoodError;
pub use graph::{Graph, GraphDocument, GraphObject, LinkId, NodeId, Visibility};
pub use neighborhood::{
    CancelToken, LayerMap, ModeProperty, NEIGHBORHOOD_DISTANCE_ALL, NeighborhoodAnalyzer,
    NeighborhoodEvent, find_biggest_hub,
};
pub use selection::SelectionSet;
