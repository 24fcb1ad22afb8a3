pub mod coercion;
pub mod connection;
pub mod graph;
pub mod graph_analysis;
pub mod node;
pub mod schema;
pub mod value;

pub use connection::{Connection, PortCoordinate, PortDirection};
pub use graph::Graph;
pub use node::{GraphNode, InputPort, NodeId, OutputPort};
pub use value::{DataType, PortValue};
