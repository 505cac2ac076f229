//! Change-tracking proxies and a staged replay pipeline for DSGE models.
//!
//! Edits to a model's tracked fields go through per-field updaters that
//! buffer each change and log the touched field in a shared
//! [`field::ChangeQueue`]. A [`pipeline::RebuildPipeline`] later replays a
//! fixed sequence of rebuild stages, committing each queued field immediately
//! before the first stage that consumes it and stopping at a configurable
//! [`pipeline::SolveDepth`].
//!
//! The numeric and symbolic work itself (steady-state solvers, perturbation
//! methods, equation parsing) lives outside this crate behind the
//! [`pipeline::RebuildStages`] trait.

mod example_stages;
pub mod field;
pub mod model;
pub mod pipeline;
pub mod updaters;

pub mod errors;
