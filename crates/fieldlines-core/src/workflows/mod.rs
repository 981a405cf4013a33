//! # Workflows Module
//!
//! High-level entry points that drive the engine end to end.
//!
//! - **Recompute Workflow** ([`recompute`]) - Blocking retrace of the selected
//!   simulations of a project, used for batch export.
//! - **Replay Workflow** ([`replay`]) - Feeds a recorded list of actions through
//!   the interaction controller and the asynchronous scheduler, then waits for
//!   the visible lines to settle.

pub mod recompute;
pub mod replay;
