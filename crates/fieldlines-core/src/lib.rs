//! # Fieldlines Core Library
//!
//! An interactive engine for 2D electrostatic scenes: point charges are placed,
//! dragged, scaled and negated, and the electric field they produce is drawn as
//! traced field lines.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture so that the numerical code
//! can be tested without any of the interaction or scheduling machinery.
//!
//! - **[`core`]: The Foundation.** Data models (`Charge`, `Field`,
//!   `Simulation`, `Project`), the pure numerical routines (field evaluation,
//!   seeding, line tracing) and the JSON documents used for persistence and
//!   export.
//!
//! - **[`engine`]: The Logic Core.** The stateful layer. It holds the engine
//!   configuration, the interaction state machine that decides when geometry is
//!   dirty, the computation boundary, and the recompute scheduler that traces
//!   off the control path and applies only the freshest result.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built on the two
//!   layers below: a blocking recompute of whole projects and the replay of a
//!   scripted interaction session.

pub mod core;
pub mod engine;
pub mod workflows;
