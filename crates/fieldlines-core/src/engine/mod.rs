//! # Engine Module
//!
//! The stateful layer between the pure numerical core and the workflows.
//!
//! ## Overview
//!
//! User actions enter through the [`interaction`] controller, which mutates the
//! charges of a simulation and reports whether the traced geometry became
//! dirty. Dirty simulations are handed to the [`scheduler`], which snapshots
//! their fields into [`compute`] specs, traces them on worker threads and
//! applies a result only while it is still the latest one issued for an active
//! simulation.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Tracing tolerances and interaction tuning
//! - **Computation Boundary** ([`compute`]) - Serializable field specs and results
//! - **Interaction** ([`interaction`]) - Per-charge state machine and drag throttling
//! - **Scheduling** ([`scheduler`]) - Tagged asynchronous recompute with last-request-wins delivery
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine-specific error types

pub mod compute;
pub mod config;
pub mod error;
pub mod interaction;
pub mod progress;
pub mod scheduler;
