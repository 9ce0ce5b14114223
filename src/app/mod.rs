pub mod ack;
pub mod agent;
pub mod cancel;
pub mod events;
pub mod usecases;

pub use ack::{AckState, AckTiming, AckTracker, await_ack};
pub use agent::OtaAgent;
pub use cancel::CancelToken;
pub use events::EventSink;
pub use usecases::CommandWait;
