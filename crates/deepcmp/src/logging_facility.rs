//! Structured logging for comparison calls
//!
//! - one initialization point, `init(profile)`
//! - operation boundary macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//!   emitting the canonical fields from `deepcmp_core_types::schema`
//! - an in-memory capture layer for assertions in tests
//!
//! ```rust
//! use deepcmp::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
