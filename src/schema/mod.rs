//! Inbound sensor reading schema
//!
//! This module defines the wire shape the phone posts, the typed reading the
//! estimator consumes, and the adapter that converts and validates between them.

mod adapter;
mod reading;

pub use adapter::*;
pub use reading::*;
