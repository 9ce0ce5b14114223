//! Infrastructure layer - Port implementations
//!
//! Concrete collaborators for the agent: the file backed firmware sink, the
//! loopback management service and process startup.

pub mod launch;
pub mod loopback;
pub mod storage;

pub use launch::{launch, launch_on};
pub use loopback::build_cloud;
pub use storage::FileSink;
