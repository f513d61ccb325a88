// Network graph: links, neurons, the link index and the network itself.

pub mod connection;
pub mod connectivity;
pub mod network;
pub mod node;

pub use connection::{Connection, NeuronId, BIAS_ID};
pub use connectivity::Connectivity;
pub use network::Network;
pub use node::{Layer, Node};
