//! Guards against unbounded traversal.

use crate::errors::{CmpError, CmpErrorKind, Result};
use crate::options::OptionId;
use crate::path::{Path, PathStep};
use std::collections::HashMap;

/// Pointer identities on the current path, one table per side.
///
/// Each address maps to the depth at which it was first entered. Revisiting
/// an address closes a cycle; the two sides are equal at that point only if
/// both closed their cycle at the same depth.
#[derive(Debug, Default)]
pub(crate) struct PointerPath {
    x: HashMap<usize, usize>,
    y: HashMap<usize, usize>,
}

impl PointerPath {
    /// Enter the pair `(px, py)`.
    ///
    /// Returns `Some(equal)` if either address is already on the path, in
    /// which case nothing is recorded and the caller must not descend.
    pub(crate) fn push(&mut self, px: usize, py: usize) -> Option<bool> {
        let dx = self.x.get(&px).copied();
        let dy = self.y.get(&py).copied();
        if dx.is_some() || dy.is_some() {
            return Some(dx == dy);
        }
        let depth_x = self.x.len() + 1;
        let depth_y = self.y.len() + 1;
        self.x.insert(px, depth_x);
        self.y.insert(py, depth_y);
        None
    }

    pub(crate) fn pop(&mut self, px: usize, py: usize) {
        self.x.remove(&px);
        self.y.remove(&py);
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty()
    }
}

/// First scan depth; low enough that a runaway chain is caught well inside a
/// default 2 MiB thread stack.
const MIN_CHECK_DEPTH: usize = 1 << 6;

/// Detects transformers that keep applying to their own output.
///
/// The path is scanned only when its length reaches a threshold that doubles
/// after every scan, so the amortized cost stays linear.
#[derive(Debug)]
pub(crate) struct RecursionGuard {
    next: usize,
}

impl Default for RecursionGuard {
    fn default() -> Self {
        Self {
            next: MIN_CHECK_DEPTH,
        }
    }
}

impl RecursionGuard {
    pub(crate) fn check(&mut self, path: &Path) -> Result<()> {
        if path.len() < self.next {
            return Ok(());
        }
        self.next <<= 1;

        let mut seen: HashMap<OptionId, usize> = HashMap::new();
        let mut offenders = Vec::new();
        for step in path {
            if let PathStep::Transform {
                name,
                option_id,
                typ,
            } = step
            {
                let count = seen.entry(*option_id).or_insert(0);
                if *count == 1 {
                    offenders.push(format!("{}() => {}", name, typ));
                }
                *count += 1;
            }
        }
        if offenders.is_empty() {
            return Ok(());
        }
        tracing::warn!(
            component = module_path!(),
            depth = path.len(),
            transformers = offenders.len(),
            "recursive transformer chain"
        );
        Err(CmpError::new(CmpErrorKind::RecursiveTransformer)
            .with_message(format!(
                "recursive set of transformers detected:\n\t{}\nconsider filtering the transformer so it cannot apply to its own output",
                offenders.join("\n\t")
            ))
            .with_candidates(offenders))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::Reflect;

    #[test]
    fn test_same_depth_revisit_is_equal() {
        let mut p = PointerPath::default();
        assert_eq!(p.push(10, 20), None);
        assert_eq!(p.push(10, 20), Some(true));
    }

    #[test]
    fn test_one_sided_revisit_is_unequal() {
        let mut p = PointerPath::default();
        assert_eq!(p.push(10, 20), None);
        assert_eq!(p.push(10, 30), Some(false));
        assert_eq!(p.push(11, 20), Some(false));
    }

    #[test]
    fn test_revisit_at_different_depths_is_unequal() {
        let mut p = PointerPath::default();
        assert_eq!(p.push(1, 5), None);
        assert_eq!(p.push(2, 6), None);
        assert_eq!(p.push(1, 6), Some(false));
    }

    #[test]
    fn test_pop_forgets_addresses() {
        let mut p = PointerPath::default();
        p.push(1, 2);
        p.pop(1, 2);
        assert!(p.is_empty());
        assert_eq!(p.push(1, 2), None);
    }

    #[test]
    fn test_recursion_guard_short_path_is_ok() {
        let mut guard = RecursionGuard::default();
        let path = Path::new();
        assert!(guard.check(&path).is_ok());
    }

    #[test]
    fn test_recursion_guard_threshold_doubles() {
        let id = OptionId::next();
        let step = PathStep::Transform {
            name: "Split".into(),
            option_id: id,
            typ: String::static_type(),
        };
        let mut path = Path::new();
        for _ in 0..MIN_CHECK_DEPTH {
            path.push(PathStep::Root {
                typ: String::static_type(),
            });
        }
        let mut guard = RecursionGuard::default();
        assert!(guard.check(&path).is_ok());
        assert_eq!(guard.next, MIN_CHECK_DEPTH * 2);

        // Below the doubled threshold the repeat goes unscanned.
        path.push(step.clone());
        path.push(step);
        assert!(guard.check(&path).is_ok());
    }

    #[test]
    fn test_recursion_guard_reports_repeated_transformer() {
        let id = OptionId::next();
        let mut path = Path::new();
        for _ in 0..MIN_CHECK_DEPTH {
            path.push(PathStep::Transform {
                name: "Split".into(),
                option_id: id,
                typ: String::static_type(),
            });
        }
        let mut guard = RecursionGuard::default();
        let err = guard.check(&path).unwrap_err();
        assert_eq!(err.kind(), CmpErrorKind::RecursiveTransformer);
        assert_eq!(err.candidates().map(<[String]>::len), Some(1));
        assert!(err.message().contains("Split() => String"));
    }
}
