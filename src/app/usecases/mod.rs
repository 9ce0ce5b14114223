mod fetch;
mod integrity;
mod report;
mod version;

pub use fetch::{CommandWait, refresh_session};
pub use integrity::validate;
pub use report::decide_outcome;
