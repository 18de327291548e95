//! Core engine for globalcal.
//!
//! This crate projects dated records of arbitrary business models into a
//! single calendar-event store and keeps that store consistent across runs:
//! - `source` and `mapping` describe which model and fields feed the calendar
//! - `sync` holds the reconciler that creates, updates and deletes projected events
//! - `registry` orchestrates passes over one or all configured sources
//! - `store` is the record-store seam, with an in-memory JSON-backed implementation

pub mod bootstrap;
pub mod color;
pub mod config;
pub mod domain;
pub mod error;
pub mod event;
pub mod ics;
pub mod mapping;
pub mod registry;
pub mod schema;
pub mod source;
pub mod store;
pub mod sync;
pub mod temporal;
pub mod value;

pub use error::{GlobalCalError, GlobalCalResult};
