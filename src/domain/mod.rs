pub mod entity;
pub mod error;
pub mod ports;

pub use entity::*;
pub use error::*;
pub use ports::*;
