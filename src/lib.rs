//! Adaptive practice engine.
//!
//! Generates exercises with a verifiable derivation, builds multiple-choice
//! option sets from modeled mistakes, grades attempts and moves each student
//! between difficulty levels using a classifier retrained from every decision.

pub mod attempt;
pub mod classifier;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod families;
pub mod ledger;
pub mod locks;
pub mod options;
pub mod protocol;
pub mod random;
pub mod routes;
pub mod seeds;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod training;
pub mod util;
