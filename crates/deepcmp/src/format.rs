//! Rendering of values as Rust-like literals.

use crate::ordering::sort_keys;
use crate::reflect::{Kind, Reflect, Type, View};
use std::collections::HashSet;
use std::fmt::Write;

/// Rendering switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatConfig {
    /// Prefer a value's `stringer()` rendering when it has one
    pub use_stringer: bool,
    /// Qualify the top-level value with its type
    pub print_type: bool,
    /// Render the targets of identity pointers instead of their addresses
    pub follow_pointers: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            use_stringer: true,
            print_type: false,
            follow_pointers: true,
        }
    }
}

/// Render `v`.
///
/// Zero-valued struct fields are elided, map entries appear in key order and
/// a pointer that leads back to a value being rendered prints as `&<cycle>`.
pub fn format_value(v: &dyn Reflect, cfg: &FormatConfig) -> String {
    let mut out = String::new();
    let mut visiting = HashSet::new();
    Formatter {
        cfg,
        visiting: &mut visiting,
    }
    .write(&mut out, v, cfg.print_type);
    out
}

/// Render a map key for use inside a path.
///
/// Identity pointers render through their targets so the key reads the same
/// on every run.
pub(crate) fn format_key(k: &dyn Reflect) -> String {
    format_value(k, &FormatConfig::default())
}

/// Render one side of a leaf, `<non-existent>` when the side is absent.
pub(crate) fn format_slot(v: Option<&dyn Reflect>, cfg: &FormatConfig) -> String {
    v.map_or_else(|| "<non-existent>".to_string(), |v| format_value(v, cfg))
}

/// Whether `v` is the zero value of its type.
pub fn is_zero(v: &dyn Reflect) -> bool {
    match v.view() {
        View::Bool(b) => !b,
        View::Int(i) => i == 0,
        View::Uint(u) => u == 0,
        View::Float(f) => f == 0.0,
        View::Complex(re, im) => re == 0.0 && im == 0.0,
        View::Str(s) => s.is_empty(),
        View::Func { is_nil } => is_nil,
        View::RawPointer(addr) => addr == 0,
        View::Pointer { target, .. } => target.is_none(),
        View::Interface(inner) => inner.is_none(),
        View::Struct(s) => {
            let fields = s.fields();
            if fields.is_empty() {
                return v.stringer().is_none();
            }
            fields.iter().all(|f| is_zero(f.value))
        }
        View::Seq(s) => {
            if v.type_of().kind() == Kind::Array {
                (0..s.len()).filter_map(|i| s.index(i)).all(is_zero)
            } else {
                s.len() == 0
            }
        }
        View::Map(m) => m.len() == 0,
    }
}

struct Formatter<'c> {
    cfg: &'c FormatConfig,
    visiting: &'c mut HashSet<usize>,
}

impl Formatter<'_> {
    fn write(&mut self, out: &mut String, v: &dyn Reflect, typed: bool) {
        if self.cfg.use_stringer {
            if let Some(s) = v.stringer() {
                if typed {
                    let _ = write!(out, "{}({})", v.type_of(), s);
                } else {
                    out.push_str(&s);
                }
                return;
            }
        }
        let t = v.type_of();
        match v.view() {
            View::Bool(b) => scalar(out, typed, t, b),
            View::Int(i) => scalar(out, typed, t, i),
            View::Uint(u) => {
                if let Some(c) = v.downcast_ref::<char>() {
                    scalar(out, typed, t, format!("{:?}", c));
                } else {
                    scalar(out, typed, t, u);
                }
            }
            View::Float(f) => scalar(out, typed, t, f),
            View::Complex(re, im) => scalar(out, typed, t, format!("({}{:+}i)", re, im)),
            View::Str(s) => scalar(out, typed, t, format!("{:?}", s)),
            View::Func { is_nil } => {
                if is_nil {
                    out.push_str("<nil>");
                } else {
                    let _ = write!(out, "{}", t);
                }
            }
            View::RawPointer(addr) => scalar(out, typed, t, format!("{:#x}", addr)),
            View::Pointer { target, addr } => match (target, addr) {
                (None, _) => out.push_str("None"),
                (Some(target), None) => self.write(out, target, typed),
                (Some(target), Some(addr)) => {
                    out.push('&');
                    if !self.cfg.follow_pointers {
                        let _ = write!(out, "{:#x}", addr);
                    } else if !self.visiting.insert(addr) {
                        out.push_str("<cycle>");
                    } else {
                        self.write(out, target, typed);
                        self.visiting.remove(&addr);
                    }
                }
            },
            View::Interface(inner) => match inner {
                None => out.push_str("<nil>"),
                Some(inner) => self.write(out, inner, typed),
            },
            View::Struct(s) => {
                let fields = s.fields();
                let name = t.short_name();
                if name.starts_with('(') {
                    out.push('(');
                    for (i, f) in fields.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.write(out, f.value, false);
                    }
                    if fields.len() == 1 {
                        out.push(',');
                    }
                    out.push(')');
                    return;
                }
                let shown: Vec<_> = fields.iter().filter(|f| !is_zero(f.value)).collect();
                if shown.is_empty() {
                    let _ = write!(out, "{} {{}}", name);
                    return;
                }
                let _ = write!(out, "{} {{ ", name);
                for (i, f) in shown.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{}: ", f.name);
                    self.write(out, f.value, false);
                }
                out.push_str(" }");
            }
            View::Seq(s) => {
                if typed {
                    let _ = write!(out, "{}", t);
                }
                if s.is_nil() {
                    out.push_str("<nil>");
                    return;
                }
                out.push('[');
                for i in 0..s.len() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    match s.index(i) {
                        Some(e) => self.write(out, e, false),
                        None => out.push('?'),
                    }
                }
                out.push(']');
            }
            View::Map(m) => {
                if typed {
                    let _ = write!(out, "{}", t);
                }
                if m.is_nil() {
                    out.push_str("<nil>");
                    return;
                }
                out.push('{');
                for (i, k) in sort_keys(m.keys()).into_iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write(out, k, false);
                    if let Some(v) = m.get(k) {
                        if v.downcast_ref::<()>().is_some() {
                            continue;
                        }
                        out.push_str(": ");
                        self.write(out, v, false);
                    }
                }
                out.push('}');
            }
        }
    }
}

fn scalar(out: &mut String, typed: bool, t: Type, v: impl std::fmt::Display) {
    if typed {
        let _ = write!(out, "{}({})", t, v);
    } else {
        let _ = write!(out, "{}", v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::AnyValue;
    use std::collections::{BTreeSet, HashMap};
    use std::rc::Rc;

    fn plain(v: &dyn Reflect) -> String {
        format_value(v, &FormatConfig::default())
    }

    #[test]
    fn test_scalars() {
        assert_eq!(plain(&1i32), "1");
        assert_eq!(plain(&true), "true");
        assert_eq!(plain(&"hi"), "\"hi\"");
        assert_eq!(plain(&'x'), "'x'");
        assert_eq!(plain(&2.5f64), "2.5");
    }

    #[test]
    fn test_typed_scalars() {
        let cfg = FormatConfig {
            print_type: true,
            ..FormatConfig::default()
        };
        assert_eq!(format_value(&1u8, &cfg), "u8(1)");
        assert_eq!(format_value(&vec![1i32], &cfg), "Vec<i32>[1]");
    }

    #[test]
    fn test_collections() {
        assert_eq!(plain(&vec![1i32, 2, 3]), "[1, 2, 3]");
        let m: HashMap<String, i32> = [("b".to_string(), 2), ("a".to_string(), 1)]
            .into_iter()
            .collect();
        assert_eq!(plain(&m), "{\"a\": 1, \"b\": 2}");
        let s: BTreeSet<i32> = [3, 1].into_iter().collect();
        assert_eq!(plain(&s), "{1, 3}");
    }

    #[test]
    fn test_pointers_and_options() {
        assert_eq!(plain(&Some(3i32)), "3");
        assert_eq!(plain(&Option::<i32>::None), "None");
        assert_eq!(plain(&Rc::new(4i32)), "&4");
        assert_eq!(plain(&AnyValue::nil()), "<nil>");
        assert_eq!(plain(&AnyValue::new("x")), "\"x\"");
    }

    #[test]
    fn test_map_keys_render_through_shared_pointers() {
        let key = Rc::new("k".to_string());
        assert_eq!(format_key(&key), "&\"k\"");
        assert_eq!(format_key(&Rc::clone(&key)), format_key(&Rc::new("k".to_string())));

        let raw = FormatConfig {
            follow_pointers: false,
            ..FormatConfig::default()
        };
        assert!(format_value(&key, &raw).starts_with("&0x"));
    }

    #[test]
    fn test_tuples() {
        assert_eq!(plain(&(1i32, "a")), "(1, \"a\")");
        assert_eq!(plain(&(7u8,)), "(7,)");
        assert_eq!(plain(&()), "()");
    }

    #[test]
    fn test_zero_values() {
        assert!(is_zero(&0i32));
        assert!(is_zero(&String::new()));
        assert!(is_zero(&Vec::<i32>::new()));
        assert!(is_zero(&[0u8; 3]));
        assert!(!is_zero(&[0u8, 1, 0]));
        assert!(is_zero(&(0i32, false)));
    }
}
