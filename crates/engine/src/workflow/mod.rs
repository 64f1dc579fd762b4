//! Workflow runtime.
//!
//! Definitions are validated by [`document`] and held by [`definitions`]. Runs are advanced by
//! [`runner`] through the transitions in [`state`], published to [`runs`], and started or polled
//! through [`engine`].

pub mod definitions;
pub mod document;
pub mod engine;
pub mod runner;
pub mod runs;
pub mod state;
