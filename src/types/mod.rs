//! Type definitions

pub mod outlet;
pub mod report;
pub mod route;
pub mod schedule;

pub use outlet::*;
pub use report::*;
pub use route::*;
pub use schedule::*;
