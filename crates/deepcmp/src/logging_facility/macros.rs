//! Operation boundary macros.
//!
//! Comparison calls sit on test hot paths, so boundaries are logged at debug
//! level; failures are logged at error level.

/// Log the start of an operation
///
/// ```
/// # use deepcmp::log_op_start;
/// log_op_start!("equal");
/// log_op_start!("equal", num_options = 2usize);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use deepcmp::log_op_end;
/// log_op_end!("equal", duration_ms = 3u64, num_same = 4usize, num_diff = 0usize);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log a failed operation
///
/// `$err` is anything convertible into [`CmpError`](crate::errors::CmpError).
///
/// ```
/// # use deepcmp::{log_op_error, errors::{CmpError, CmpErrorKind}};
/// let err = CmpError::new(CmpErrorKind::NanMapKey);
/// log_op_error!("diff", err, duration_ms = 1u64);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let cmp_err: $crate::errors::CmpError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?cmp_err.kind(),
            err_code = cmp_err.code(),
            path = cmp_err.path().unwrap_or_default(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let cmp_err: $crate::errors::CmpError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?cmp_err.kind(),
            err_code = cmp_err.code(),
            path = cmp_err.path().unwrap_or_default(),
            $($field)*
        );
    }};
}
