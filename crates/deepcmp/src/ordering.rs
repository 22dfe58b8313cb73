//! Deterministic ordering of arbitrary values, used to iterate map keys.

use crate::reflect::{MapView, Reflect, SeqView, StructView, View};
use std::cmp::Ordering;

/// Total order over values of any type.
///
/// Values of different types order by type name, then by type identity.
/// Within a type: `false < true`, numbers ascending with NaN first, strings
/// lexicographically, composites component-wise then by length, maps by their
/// sorted entries, and empty pointers, dynamic values and functions first.
/// Shared pointers order by target and fall back to their address, so only
/// the same allocation compares equal.
pub fn compare_values(x: &dyn Reflect, y: &dyn Reflect) -> Ordering {
    let (tx, ty) = (x.type_of(), y.type_of());
    if tx != ty {
        return tx.name().cmp(ty.name()).then_with(|| tx.id().cmp(&ty.id()));
    }
    match (x.view(), y.view()) {
        (View::Bool(a), View::Bool(b)) => a.cmp(&b),
        (View::Int(a), View::Int(b)) => a.cmp(&b),
        (View::Uint(a), View::Uint(b)) => a.cmp(&b),
        (View::Float(a), View::Float(b)) => compare_floats(a, b),
        (View::Complex(ar, ai), View::Complex(br, bi)) => {
            compare_floats(ar, br).then_with(|| compare_floats(ai, bi))
        }
        (View::Str(a), View::Str(b)) => a.cmp(b),
        (View::RawPointer(a), View::RawPointer(b)) => a.cmp(&b),
        (View::Func { is_nil: a }, View::Func { is_nil: b }) => b.cmp(&a),
        (
            View::Pointer {
                target: a,
                addr: Some(pa),
            },
            View::Pointer {
                target: b,
                addr: Some(pb),
            },
        ) => compare_optional(a, b).then_with(|| pa.cmp(&pb)),
        (View::Pointer { target: a, .. }, View::Pointer { target: b, .. }) => compare_optional(a, b),
        (View::Interface(a), View::Interface(b)) => compare_optional(a, b),
        (View::Struct(a), View::Struct(b)) => compare_structs(x, y, a, b),
        (View::Seq(a), View::Seq(b)) => compare_seqs(a, b),
        (View::Map(a), View::Map(b)) => compare_maps(a, b),
        _ => Ordering::Equal,
    }
}

/// Whether `x` orders strictly before `y`.
pub fn is_less(x: &dyn Reflect, y: &dyn Reflect) -> bool {
    compare_values(x, y) == Ordering::Less
}

/// Sort `keys` deterministically and drop duplicates.
///
/// Duplicates are structurally equal keys; keys containing NaN never equal
/// anything, so they are kept as distinct entries.
pub fn sort_keys<'a>(mut keys: Vec<&'a dyn Reflect>) -> Vec<&'a dyn Reflect> {
    keys.sort_by(|a, b| compare_values(*a, *b));
    keys.dedup_by(|a, b| key_equal(*a, *b));
    keys
}

fn key_equal(x: &dyn Reflect, y: &dyn Reflect) -> bool {
    compare_values(x, y) == Ordering::Equal && !contains_nan(x)
}

fn contains_nan(v: &dyn Reflect) -> bool {
    match v.view() {
        View::Float(f) => f.is_nan(),
        View::Complex(re, im) => re.is_nan() || im.is_nan(),
        View::Pointer { target, .. } | View::Interface(target) => target.is_some_and(contains_nan),
        View::Struct(s) => s.fields().iter().any(|f| contains_nan(f.value)),
        View::Seq(s) => (0..s.len()).filter_map(|i| s.index(i)).any(contains_nan),
        View::Map(m) => m
            .keys()
            .into_iter()
            .any(|k| contains_nan(k) || m.get(k).is_some_and(contains_nan)),
        _ => false,
    }
}

fn compare_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn compare_optional(a: Option<&dyn Reflect>, b: Option<&dyn Reflect>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_values(a, b),
    }
}

fn compare_structs(
    x: &dyn Reflect,
    y: &dyn Reflect,
    a: &dyn StructView,
    b: &dyn StructView,
) -> Ordering {
    let (fa, fb) = (a.fields(), b.fields());
    if fa.is_empty() && fb.is_empty() {
        // Opaque values only expose their rendering.
        return x.stringer().cmp(&y.stringer());
    }
    fa.iter()
        .zip(fb.iter())
        .map(|(p, q)| compare_values(p.value, q.value))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| fa.len().cmp(&fb.len()))
}

fn compare_seqs(a: &dyn SeqView, b: &dyn SeqView) -> Ordering {
    match (a.is_nil(), b.is_nil()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }
    let n = a.len().min(b.len());
    for i in 0..n {
        let ord = compare_optional(a.index(i), b.index(i));
        if ord.is_ne() {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_maps(a: &dyn MapView, b: &dyn MapView) -> Ordering {
    match (a.is_nil(), b.is_nil()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }
    let (ka, kb) = (sort_keys(a.keys()), sort_keys(b.keys()));
    for (x, y) in ka.iter().zip(kb.iter()) {
        let ord = compare_values(*x, *y).then_with(|| compare_optional(a.get(*x), b.get(*y)));
        if ord.is_ne() {
            return ord;
        }
    }
    ka.len().cmp(&kb.len())
}
