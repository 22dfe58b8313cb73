//! Traversal events, the diff tree and its text rendering.

use crate::errors::{CmpError, Result};
use crate::format::{format_slot, FormatConfig};
use crate::path::{Path, PathStep};
use crate::reflect::Reflect;
use serde::Serialize;
use std::fmt::Write;

/// How a leaf was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Equal,
    Unequal,
    /// Skipped by an ignore rule; not tallied
    Ignored,
}

/// What decided a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Via {
    /// Built-in comparison of the value's kind
    Structure,
    Comparer,
    /// The type's own equality method
    Method,
    /// A pointer cycle was closed
    Cycle,
    Ignore,
}

/// Receiver of traversal events.
///
/// Every `push_step` is matched by exactly one `pop_step`, and each pushed
/// node receives at most one `report`. Probes the engine makes to align
/// sequences are never delivered.
pub trait Reporter {
    /// Descend into a child node. A side is `None` when it does not exist or
    /// cannot be read.
    fn push_step(&mut self, step: &PathStep, x: Option<&dyn Reflect>, y: Option<&dyn Reflect>);

    /// The current node is a leaf with this outcome.
    fn report(&mut self, outcome: Outcome, via: Via, x: Option<&dyn Reflect>, y: Option<&dyn Reflect>);

    fn pop_step(&mut self);
}

/// How the children of a node relate to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub identical: usize,
    pub ignored: usize,
    pub removed: usize,
    pub inserted: usize,
    pub modified: usize,
}

/// One node of the diff tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffNode {
    pub step: PathStep,
    pub x_present: bool,
    pub y_present: bool,
    /// Set on leaves only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<Via>,
    /// Rendered values, set on unequal leaves only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_y: Option<String>,
    pub num_same: usize,
    pub num_diff: usize,
    pub num_ignored: usize,
    pub records: RecordCounts,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DiffNode>,
}

impl DiffNode {
    fn new(step: PathStep, x_present: bool, y_present: bool) -> Self {
        Self {
            step,
            x_present,
            y_present,
            outcome: None,
            via: None,
            value_x: None,
            value_y: None,
            num_same: 0,
            num_diff: 0,
            num_ignored: 0,
            records: RecordCounts::default(),
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.outcome.is_some()
    }

    /// Whether any leaf below (or at) this node is unequal.
    pub fn has_diff(&self) -> bool {
        self.num_diff > 0
    }

    fn absorb(&mut self, child: DiffNode) {
        self.num_same += child.num_same;
        self.num_diff += child.num_diff;
        self.num_ignored += child.num_ignored;

        let r = &mut self.records;
        if child.num_ignored > 0 && child.num_same + child.num_diff == 0 {
            r.ignored += 1;
        } else if child.num_diff == 0 {
            r.identical += 1;
        } else if !child.y_present {
            r.removed += 1;
        } else if !child.x_present {
            r.inserted += 1;
        } else {
            r.modified += 1;
        }
        self.children.push(child);
    }
}

/// Builds a [`DiffNode`] tree from traversal events.
#[derive(Debug, Default)]
pub struct DiffTreeBuilder {
    stack: Vec<DiffNode>,
    root: Option<DiffNode>,
}

impl DiffTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the finished tree; `None` until the root node has been popped.
    pub fn take_tree(&mut self) -> Option<DiffNode> {
        self.root.take()
    }
}

impl Reporter for DiffTreeBuilder {
    fn push_step(&mut self, step: &PathStep, x: Option<&dyn Reflect>, y: Option<&dyn Reflect>) {
        self.stack
            .push(DiffNode::new(step.clone(), x.is_some(), y.is_some()));
    }

    fn report(&mut self, outcome: Outcome, via: Via, x: Option<&dyn Reflect>, y: Option<&dyn Reflect>) {
        let Some(node) = self.stack.last_mut() else {
            return;
        };
        node.outcome = Some(outcome);
        node.via = Some(via);
        match outcome {
            Outcome::Equal => node.num_same += 1,
            Outcome::Ignored => node.num_ignored += 1,
            Outcome::Unequal => {
                node.num_diff += 1;
                let mut cfg = FormatConfig::default();
                let (mut vx, mut vy) = (format_slot(x, &cfg), format_slot(y, &cfg));
                if vx == vy {
                    cfg.print_type = true;
                    vx = format_slot(x, &cfg);
                    vy = format_slot(y, &cfg);
                }
                if vx == vy {
                    cfg.use_stringer = false;
                    vx = format_slot(x, &cfg);
                    vy = format_slot(y, &cfg);
                }
                node.value_x = Some(vx);
                node.value_y = Some(vy);
            }
        }
    }

    fn pop_step(&mut self) {
        let Some(node) = self.stack.pop() else {
            return;
        };
        match self.stack.last_mut() {
            Some(parent) => parent.absorb(node),
            None => self.root = Some(node),
        }
    }
}

/// Limits for [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub max_bytes: usize,
    pub max_lines: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            max_bytes: 4096,
            max_lines: 256,
        }
    }
}

/// Render every unequal leaf of `tree` as
///
/// ```text
/// {Root}.path:
/// 	-: x
/// 	+: y
/// ```
///
/// Once the byte or line budget would be exceeded the remaining leaves are
/// summarized in a final `... N more differences ...` line. The output is
/// empty exactly when the tree records no difference.
pub fn render(tree: &DiffNode, opts: &FormatOptions) -> String {
    let mut entries = Vec::new();
    let mut path = Path::new();
    collect_unequal(tree, &mut path, &mut entries);

    let mut out = String::new();
    let mut lines = 0;
    for (i, entry) in entries.iter().enumerate() {
        let entry_lines = entry.lines().count();
        if out.len() + entry.len() > opts.max_bytes || lines + entry_lines > opts.max_lines {
            let _ = writeln!(out, "... {} more differences ...", entries.len() - i);
            break;
        }
        out.push_str(entry);
        lines += entry_lines;
    }
    out
}

fn collect_unequal(node: &DiffNode, path: &mut Path, entries: &mut Vec<String>) {
    path.push(node.step.clone());
    if node.outcome == Some(Outcome::Unequal) {
        let mut entry = String::new();
        let _ = writeln!(entry, "{}:", path);
        let _ = writeln!(entry, "\t-: {}", node.value_x.as_deref().unwrap_or("<non-existent>"));
        let _ = writeln!(entry, "\t+: {}", node.value_y.as_deref().unwrap_or("<non-existent>"));
        entries.push(entry);
    }
    for child in &node.children {
        if child.has_diff() {
            collect_unequal(child, path, entries);
        }
    }
    path.pop();
}

/// Export `tree` as pretty-printed JSON.
///
/// # Errors
///
/// `Serialization` if the tree cannot be encoded.
pub fn to_json(tree: &DiffNode) -> Result<String> {
    serde_json::to_string_pretty(tree).map_err(|e| CmpError::from(e).with_op("to_json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::Type;

    fn field(name: &'static str) -> PathStep {
        PathStep::StructField {
            name,
            index: 0,
            typ: i32::static_type(),
            exported: true,
        }
    }

    fn build(leaves: &[(&'static str, i32, i32)]) -> DiffNode {
        let mut b = DiffTreeBuilder::new();
        let root = PathStep::Root {
            typ: <(i32,)>::static_type(),
        };
        b.push_step(&root, Some(&0i32), Some(&0i32));
        for &(name, x, y) in leaves {
            b.push_step(&field(name), Some(&x), Some(&y));
            let outcome = if x == y {
                Outcome::Equal
            } else {
                Outcome::Unequal
            };
            b.report(outcome, Via::Structure, Some(&x), Some(&y));
            b.pop_step();
        }
        b.pop_step();
        b.take_tree().unwrap()
    }

    #[test]
    fn test_counts_aggregate_to_root() {
        let tree = build(&[("a", 1, 1), ("b", 1, 2), ("c", 3, 4)]);
        assert_eq!((tree.num_same, tree.num_diff), (1, 2));
        assert_eq!(tree.records.identical, 1);
        assert_eq!(tree.records.modified, 2);
        assert_eq!(tree.children.len(), 3);
    }

    #[test]
    fn test_render_unequal_leaves() {
        let tree = build(&[("a", 1, 1), ("b", 1, 2)]);
        assert_eq!(render(&tree, &FormatOptions::default()), "{(i32,)}.b:\n\t-: 1\n\t+: 2\n");
    }

    #[test]
    fn test_render_equal_tree_is_empty() {
        let tree = build(&[("a", 1, 1)]);
        assert_eq!(render(&tree, &FormatOptions::default()), "");
    }

    #[test]
    fn test_render_truncates_by_lines() {
        let tree = build(&[("a", 1, 2), ("b", 3, 4), ("c", 5, 6)]);
        let out = render(
            &tree,
            &FormatOptions {
                max_bytes: 4096,
                max_lines: 4,
            },
        );
        assert!(out.starts_with("{(i32,)}.a:\n"));
        assert!(out.ends_with("... 2 more differences ...\n"));
    }

    #[test]
    fn test_identical_renderings_gain_types() {
        let mut b = DiffTreeBuilder::new();
        let root = PathStep::Root {
            typ: Type::of::<u8>(crate::reflect::Kind::Uint),
        };
        b.push_step(&root, Some(&1u8), Some(&1u16));
        b.report(Outcome::Unequal, Via::Structure, Some(&1u8), Some(&1u16));
        b.pop_step();
        let tree = b.take_tree().unwrap();
        assert_eq!(tree.value_x.as_deref(), Some("u8(1)"));
        assert_eq!(tree.value_y.as_deref(), Some("u16(1)"));
    }

    #[test]
    fn test_json_export_is_deterministic() {
        let tree = build(&[("a", 1, 2)]);
        let first = to_json(&tree).unwrap();
        assert_eq!(first, to_json(&tree.clone()).unwrap());
        let parsed: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(parsed["num_diff"], 1);
        assert_eq!(parsed["children"][0]["value_y"], "2");
        assert_eq!(parsed["step"]["step"], "root");
    }
}
