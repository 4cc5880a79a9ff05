pub mod alert;
pub mod blocker;
pub mod clarification;
pub mod config;
pub mod decision;
pub mod error;
pub mod failure;
pub mod io;
pub mod paths;
pub mod store;
pub mod story;
pub mod summary;
pub mod tdd;
pub mod types;
pub mod vcs;
pub mod workflow;

pub use error::{Result, WaypointError};
pub use store::Store;
