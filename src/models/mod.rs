//! Data models for Basecamp and Launchpad entities

mod authorization;
mod project;

pub use authorization::*;
pub use project::*;
