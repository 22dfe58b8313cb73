//! Core types shared across deepcmp facilities
//!
//! This crate holds the canonical schema constants used by the logging
//! facility and by anything that inspects its structured events:
//!
//! - **Field keys**: component, op, event, duration and tally fields
//! - **Event names**: start, end, end_error

pub mod schema;
