//! # Core Module
//!
//! Stateless building blocks of the engine.
//!
//! - **Scene Representation** ([`models`]) - Charges, fields, settings, simulations and projects
//! - **Numerics** ([`physics`]) - Field evaluation, seed placement and line tracing
//! - **Documents** ([`io`]) - JSON project persistence and line export
//!
//! Nothing in this module spawns work or holds shared state; orchestration
//! lives in [`crate::engine`].

pub mod io;
pub mod models;
pub mod physics;
