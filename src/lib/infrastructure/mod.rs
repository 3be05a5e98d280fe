//! Adapters for collaborators that live outside the process.

pub mod model;
