//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Comparison tallies
pub const FIELD_NUM_SAME: &str = "num_same";
pub const FIELD_NUM_DIFF: &str = "num_diff";
pub const FIELD_NUM_OPTIONS: &str = "num_options";
pub const FIELD_ROOT_TYPE: &str = "root_type";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Canonical operation names
pub const OP_EQUAL: &str = "equal";
pub const OP_DIFF: &str = "diff";
