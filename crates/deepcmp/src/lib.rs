//! deepcmp - deep equality and structural diffs
//!
//! This crate decides whether two values are semantically equal under a
//! configurable rule set and, when they are not, reports where they differ:
//! - a recursive value-tree walker over the [`Reflect`] descriptor layer
//! - options that ignore, compare or transform nodes selected by path or value
//! - cycle-safe traversal of shared and self-referential pointers
//! - deterministic map-key ordering and a best-effort sequence alignment
//! - a diff tree exportable as text or JSON
//!
//! ```
//! use deepcmp::{diff, equal};
//!
//! assert!(equal(&vec![1, 2, 3], &vec![1, 2, 3], &[]).unwrap());
//! let out = diff(&vec![1, 2, 3], &vec![1, 5, 3], &[]).unwrap();
//! assert_eq!(out, "{Vec<i32>}[1]:\n\t-: 2\n\t+: 5\n");
//! ```

mod cycles;
mod engine;
pub mod errors;
pub mod format;
pub mod logging_facility;
mod macros;
pub mod options;
pub mod ordering;
pub mod path;
pub mod reflect;
pub mod report;
pub mod sequence;

pub use deepcmp_core_types::schema;

// Re-export commonly used types
pub use errors::{CmpError, CmpErrorKind, OptionError, Result};
pub use format::{format_value, FormatConfig};
pub use options::{
    allow_unexported, allow_unexported_within_module, comparer, comparer_any, filter_path,
    filter_values, filter_values_any, group, ignore, reporter, transformer, CmpOption, OptionId,
};
pub use ordering::{is_less, sort_keys};
pub use path::{Path, PathStep};
pub use reflect::{
    AnyValue, Complex64, Field, Kind, MapView, Reflect, SeqView, StructView, Type, View,
};
pub use report::{
    render, to_json, DiffNode, DiffTreeBuilder, FormatOptions, Outcome, RecordCounts, Reporter,
    Via,
};
pub use sequence::{difference, DiffResult, EditScript, EditType};

use engine::State;
use schema::{OP_DIFF, OP_EQUAL};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Report whether `x` and `y` are equal under `opts`.
///
/// # Errors
///
/// Fails when the options are invalid or ambiguous at some node, when an
/// unexported field is reached without a grant, on a NaN map key, and when a
/// user function is caught being non-deterministic. Inequality is not an
/// error.
pub fn equal(x: &dyn Reflect, y: &dyn Reflect, opts: &[CmpOption]) -> Result<bool> {
    let start = Instant::now();
    log_op_start!(OP_EQUAL, num_options = opts.len(), root_type = x.type_of().name());

    let outcome = State::new(opts).and_then(|mut state| {
        state.compare_root(x, y)?;
        Ok(state.result())
    });

    let duration_ms = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(result) => {
            log_op_end!(
                OP_EQUAL,
                duration_ms = duration_ms,
                num_same = result.num_same,
                num_diff = result.num_diff
            );
            Ok(result.equal())
        }
        Err(err) => {
            let err = err.or_op(OP_EQUAL);
            log_op_error!(OP_EQUAL, err.clone(), duration_ms = duration_ms);
            Err(err)
        }
    }
}

/// Render the differences between `x` and `y`; empty when they are equal.
///
/// # Errors
///
/// Same failures as [`equal`], plus `InconsistentResult` if the rendering
/// disagrees with the tallies.
pub fn diff(x: &dyn Reflect, y: &dyn Reflect, opts: &[CmpOption]) -> Result<String> {
    diff_with(x, y, opts, &FormatOptions::default())
}

/// [`diff`] with explicit rendering budgets.
///
/// # Errors
///
/// See [`diff`].
pub fn diff_with(
    x: &dyn Reflect,
    y: &dyn Reflect,
    opts: &[CmpOption],
    fmt: &FormatOptions,
) -> Result<String> {
    let start = Instant::now();
    log_op_start!(OP_DIFF, num_options = opts.len(), root_type = x.type_of().name());

    let outcome = build_tree(x, y, opts).and_then(|(result, tree)| {
        let out = render(&tree, fmt);
        if out.is_empty() != result.equal() {
            return Err(CmpError::new(CmpErrorKind::InconsistentResult).with_message(format!(
                "rendered output disagrees with the comparison ({} differences, {} bytes of output)",
                result.num_diff,
                out.len()
            )));
        }
        Ok((result, out))
    });

    let duration_ms = start.elapsed().as_millis() as u64;
    match outcome {
        Ok((result, out)) => {
            log_op_end!(
                OP_DIFF,
                duration_ms = duration_ms,
                num_same = result.num_same,
                num_diff = result.num_diff
            );
            Ok(out)
        }
        Err(err) => {
            let err = err.or_op(OP_DIFF);
            log_op_error!(OP_DIFF, err.clone(), duration_ms = duration_ms);
            Err(err)
        }
    }
}

/// Compare `x` and `y` and return the full diff tree.
///
/// # Errors
///
/// See [`equal`].
pub fn diff_tree(x: &dyn Reflect, y: &dyn Reflect, opts: &[CmpOption]) -> Result<DiffNode> {
    build_tree(x, y, opts)
        .map(|(_, tree)| tree)
        .map_err(|err| err.or_op(OP_DIFF))
}

fn build_tree(
    x: &dyn Reflect,
    y: &dyn Reflect,
    opts: &[CmpOption],
) -> Result<(DiffResult, DiffNode)> {
    let builder = Arc::new(Mutex::new(DiffTreeBuilder::new()));
    let mut all = opts.to_vec();
    all.push(reporter(Arc::clone(&builder)));

    let mut state = State::new(&all)?;
    tracing::trace!(
        component = module_path!(),
        num_options = state.num_options(),
        "options flattened"
    );
    state.compare_root(x, y)?;

    let tree = builder
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take_tree()
        .ok_or_else(|| {
            CmpError::new(CmpErrorKind::Internal).with_message("diff tree has no root")
        })?;
    Ok((state.result(), tree))
}
