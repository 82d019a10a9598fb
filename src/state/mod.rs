//! State module for tracking index pagination
//!
//! Discovery walks the index one page at a time and after every page decides
//! whether to continue. The decision and the reason for stopping are modelled
//! here so the pipeline and its report can share them.
//!
//! # Components
//!
//! - `DiscoveryState`: `Continue` or `Stop` after each page
//! - `StopReason`: why pagination ended (clean, degraded, or cancelled)

mod discovery_state;

// Re-export main types
pub use discovery_state::{DiscoveryState, StopReason};
