//! Command implementations

pub mod build;
pub mod buildables;
pub mod cache;
pub mod headers;
