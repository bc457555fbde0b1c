pub mod network_dag;

pub use network_dag::{LinkEdge, NetworkDag};
