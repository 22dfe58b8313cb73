//! Paths from the root of the compared values to the current node.

use crate::options::OptionId;
use crate::reflect::Type;
use serde::Serialize;
use std::fmt;

/// One descent from a parent node to a child node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PathStep {
    /// The top-level values
    Root { typ: Type },
    StructField {
        name: &'static str,
        index: usize,
        typ: Type,
        exported: bool,
    },
    /// Element of an array or slice. One index is `None` when the element
    /// exists on one side only.
    SliceIndex {
        x_index: Option<usize>,
        y_index: Option<usize>,
        typ: Type,
    },
    /// Map entry; `key` is the rendered key
    MapKey { key: String, typ: Type },
    /// Dereference of a pointer-like value
    Indirect { typ: Type },
    /// Concrete value held by a dynamic value
    TypeAssertion { typ: Type },
    /// Output of a transformer
    Transform {
        name: String,
        option_id: OptionId,
        typ: Type,
    },
}

impl PathStep {
    /// Type of the values at the node this step leads to.
    pub fn typ(&self) -> Type {
        match self {
            PathStep::Root { typ }
            | PathStep::StructField { typ, .. }
            | PathStep::SliceIndex { typ, .. }
            | PathStep::MapKey { typ, .. }
            | PathStep::Indirect { typ }
            | PathStep::TypeAssertion { typ }
            | PathStep::Transform { typ, .. } => *typ,
        }
    }

    /// Field name for struct field steps.
    pub fn field_name(&self) -> Option<&'static str> {
        match self {
            PathStep::StructField { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Root { typ } => write!(f, "{{{}}}", typ),
            PathStep::StructField { name, .. } => write!(f, ".{}", name),
            PathStep::SliceIndex {
                x_index, y_index, ..
            } => {
                let show = |i: &Option<usize>| i.map_or_else(|| "?".to_string(), |i| i.to_string());
                if x_index == y_index {
                    write!(f, "[{}]", show(x_index))
                } else {
                    write!(f, "[{}->{}]", show(x_index), show(y_index))
                }
            }
            PathStep::MapKey { key, .. } => write!(f, "[{}]", key),
            PathStep::Indirect { .. } => f.write_str("*"),
            PathStep::TypeAssertion { typ } => write!(f, ".({})", typ),
            PathStep::Transform { name, .. } => write!(f, ".{}()", name),
        }
    }
}

/// Ordered list of steps from the root to the current node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Path(Vec<PathStep>);

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, step: PathStep) {
        self.0.push(step);
    }

    pub(crate) fn pop(&mut self) -> Option<PathStep> {
        self.0.pop()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&PathStep> {
        self.0.last()
    }

    /// Step at `i`; negative indexes count from the end (`-1` is the last step).
    pub fn index(&self, i: isize) -> Option<&PathStep> {
        let idx = if i < 0 {
            self.0.len().checked_sub(i.unsigned_abs())?
        } else {
            i as usize
        };
        self.0.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathStep> {
        self.0.iter()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Struct field names along the path joined by `.`, e.g. `Owner.Name`.
    ///
    /// Non-field steps are skipped, which makes this the usual key for path
    /// filters.
    pub fn field_path(&self) -> String {
        self.0
            .iter()
            .filter_map(PathStep::field_name)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Whether `id` appears among the trailing run of transform steps.
    pub(crate) fn transform_tail_contains(&self, id: OptionId) -> bool {
        self.0
            .iter()
            .rev()
            .map_while(|step| match step {
                PathStep::Transform { option_id, .. } => Some(*option_id),
                _ => None,
            })
            .any(|seen| seen == id)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.0 {
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathStep;
    type IntoIter = std::slice::Iter<'a, PathStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{Kind, Reflect};

    fn sample() -> Path {
        let mut p = Path::new();
        p.push(PathStep::Root {
            typ: Type::of::<(u8,)>(Kind::Struct),
        });
        p.push(PathStep::StructField {
            name: "items",
            index: 0,
            typ: Vec::<String>::static_type(),
            exported: true,
        });
        p.push(PathStep::SliceIndex {
            x_index: Some(3),
            y_index: Some(3),
            typ: String::static_type(),
        });
        p
    }

    #[test]
    fn test_display_concatenates_steps() {
        let mut p = sample();
        assert_eq!(p.to_string(), "{(u8,)}.items[3]");
        p.push(PathStep::Transform {
            name: "Lower".into(),
            option_id: OptionId::next(),
            typ: String::static_type(),
        });
        assert_eq!(p.to_string(), "{(u8,)}.items[3].Lower()");
    }

    #[test]
    fn test_one_sided_slice_index() {
        let step = PathStep::SliceIndex {
            x_index: None,
            y_index: Some(2),
            typ: i32::static_type(),
        };
        assert_eq!(step.to_string(), "[?->2]");
    }

    #[test]
    fn test_field_path_skips_other_steps() {
        let mut p = sample();
        p.push(PathStep::StructField {
            name: "len",
            index: 1,
            typ: usize::static_type(),
            exported: false,
        });
        assert_eq!(p.field_path(), "items.len");
    }

    #[test]
    fn test_negative_index_counts_from_end() {
        let p = sample();
        assert_eq!(p.index(-1), p.last());
        assert!(matches!(p.index(0), Some(PathStep::Root { .. })));
        assert!(p.index(-4).is_none());
        assert!(p.index(3).is_none());
    }

    #[test]
    fn test_transform_tail_stops_at_other_steps() {
        let id = OptionId::next();
        let mut p = sample();
        p.push(PathStep::Transform {
            name: "T".into(),
            option_id: id,
            typ: String::static_type(),
        });
        assert!(p.transform_tail_contains(id));
        p.push(PathStep::Indirect {
            typ: String::static_type(),
        });
        assert!(!p.transform_tail_contains(id));
    }
}
