//! Planning services

pub mod allocator;
pub mod export;
pub mod geo;
pub mod ingest;
pub mod routing;
pub mod selection;
pub mod sequencer;
pub mod summary;
pub mod synthetic;
