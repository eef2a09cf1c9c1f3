//! Core types for remdav.
//!
//! This crate provides everything below the CalDAV transport:
//! - `event`: the local calendar event model
//! - `remind`: the Remind-file-backed event store
//! - `ics`: iCalendar parsing/generation for single events
//! - `diff`: snapshot reconciliation (the sync engine)
//! - `uid`: event identity rules shared by both stores

pub mod constants;
pub mod diff;
pub mod error;
pub mod event;
pub mod ics;
pub mod remind;
pub mod uid;
pub mod window;

pub use error::{RemDavError, RemDavResult};
pub use event::RemindEvent;
