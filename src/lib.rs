//! Room booking with a two-party approval workflow.
//!
//! A booker requests a room; the property owner accepts or rejects; the booker
//! then confirms, at which point the held payment is recognised in the
//! booking's ledger. Every workflow step is one atomic scope over a sled
//! database.

pub mod approval;
pub mod booking;
pub mod code;
pub mod config;
pub mod directory;
pub mod entities;
pub mod error;
pub mod history;
pub mod identity;
pub mod ledger;
pub mod membership;
pub mod queries;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod utils;

pub use error::{BookingError, ErrorKind, Result};
pub use service::BookingService;
