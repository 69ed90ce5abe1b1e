//! # Ringside
//!
//! A derived-state engine for a fight league: standings, streaks, season
//! completion and a global ranking, computed over a local JSONL ledger of
//! fight results.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (fights, standings, streaks, rankings)
//! - **engine**: Pure derived-state computations
//! - **storage**: Filesystem data lake operations (JSONL, snapshot pointers)
//! - **pipeline**: Event-driven triggers wiring engine to storage
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod config;
pub mod engine;
pub mod models;
pub mod pipeline;
pub mod storage;

pub use models::*;
