//! Minimal instrumentation harness.
//!
//! A [`Harness`] opens a root span and runs each named unit of work through a
//! [`SpanRunner`]. Each unit is a bounded random walk ([`RandomWalkWorkload`])
//! that increments a counter, updates a pull-based gauge and requests a flush on
//! every tick. All telemetry goes through an injected
//! [`tally_telemetry::TelemetrySink`]; failures there never stop the walk.

pub mod config;
mod error;
pub mod fault;
mod harness;
pub mod runner;
pub mod workload;

pub use config::HarnessConfig;
pub use error::HarnessError;
pub use fault::{FaultPredicate, FaultUnits};
pub use harness::{Harness, RunReport, validate_unit_names};
pub use runner::{SpanGuard, SpanRunner, UnitReport};
pub use workload::{RandomSource, RandomWalkWorkload, RngSource, ScriptedSource, Step};
