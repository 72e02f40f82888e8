//! Testing utilities for analysis runs.
//!
//! This module provides:
//! - Scripted resolvers and fetchers that make no network calls
//! - A recording progress observer
//! - Canned listing and page markup

pub mod fixtures;
mod mocks;
#[cfg(test)]
pub(crate) mod server;

pub use mocks::{FetchCall, RecordingObserver, ScriptedFetcher, ScriptedResolver};
