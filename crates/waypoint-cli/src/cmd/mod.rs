pub mod blocker;
pub mod checkpoint;
pub mod clarify;
pub mod config;
pub mod decision;
pub mod failure;
pub mod git;
pub mod iteration;
pub mod progress;
pub mod status;
pub mod story;
pub mod tdd;
pub mod verify;
pub mod workflow;
