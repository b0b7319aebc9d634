mod document;
mod model;
mod property;
mod search;

pub use document::{GraphDocument, LinkEntry, NodeEntry};
pub use model::{Graph, GraphObject, Link, LinkId, Node, NodeId, Visibility};
pub use property::{Properties, PropertyValue};
