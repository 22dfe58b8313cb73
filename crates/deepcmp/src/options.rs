//! Comparison options and their resolution at each node.
//!
//! Options are immutable values built by the constructors in this module.
//! Filters ([`filter_path`], [`filter_values`]) restrict where an inner option
//! applies; [`ignore`], [`comparer`] and [`transformer`] decide what happens
//! once it does. At every node the engine evaluates all options and expects at
//! most one comparer or transformer to remain.

use crate::engine::{Slot, State};
use crate::errors::{CmpError, CmpErrorKind, OptionError, Result};
use crate::path::Path;
use crate::reflect::{Kind, Reflect, Type};
use crate::report::Reporter;
use serde::Serialize;
use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Identity of an option, unique per constructor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OptionId(u64);

static NEXT_OPTION_ID: AtomicU64 = AtomicU64::new(1);

impl OptionId {
    pub(crate) fn next() -> Self {
        Self(NEXT_OPTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

pub(crate) type BinaryFn = dyn Fn(&dyn Reflect, &dyn Reflect) -> Option<bool> + Send + Sync;
pub(crate) type UnaryFn = dyn Fn(&dyn Reflect) -> Option<Box<dyn Reflect>> + Send + Sync;
type PathFn = dyn Fn(&Path) -> bool + Send + Sync;

/// A configuration option for [`equal`](crate::equal) and [`diff`](crate::diff).
#[derive(Clone)]
pub struct CmpOption {
    id: OptionId,
    pub(crate) kind: OptionKind,
}

#[derive(Clone)]
pub(crate) enum OptionKind {
    Ignore,
    Comparer(Arc<Comparer>),
    Transformer(Arc<Transformer>),
    PathFilter(Arc<PathFilter>),
    ValuesFilter(Arc<ValuesFilter>),
    Group(Arc<[CmpOption]>),
    Visibility(Arc<Visibility>),
    Reporter(Arc<Mutex<dyn Reporter + Send>>),
}

pub(crate) struct Comparer {
    pub(crate) name: String,
    /// `None` applies to every type
    pub(crate) input: Option<Type>,
    pub(crate) func: Box<BinaryFn>,
}

pub(crate) struct Transformer {
    pub(crate) id: OptionId,
    pub(crate) name: String,
    pub(crate) func_name: String,
    pub(crate) input: Type,
    pub(crate) output: Type,
    pub(crate) func: Box<UnaryFn>,
}

pub(crate) struct PathFilter {
    name: String,
    pred: Box<PathFn>,
    inner: CmpOption,
}

pub(crate) struct ValuesFilter {
    pub(crate) name: String,
    input: Option<Type>,
    pub(crate) pred: Box<BinaryFn>,
    inner: CmpOption,
}

/// Grants read access to unexported struct fields.
#[derive(Default)]
pub(crate) struct Visibility {
    pub(crate) types: HashSet<TypeId>,
    pub(crate) type_names: Vec<&'static str>,
    pub(crate) prefixes: Vec<String>,
}

impl CmpOption {
    fn new(kind: OptionKind) -> Self {
        Self {
            id: OptionId::next(),
            kind,
        }
    }

    pub fn id(&self) -> OptionId {
        self.id
    }

    /// Whether this option can be used outside a filter.
    pub(crate) fn is_filtered(&self) -> bool {
        match &self.kind {
            OptionKind::Ignore => false,
            OptionKind::Comparer(c) => c.input.is_some(),
            _ => true,
        }
    }

    /// Ignore rules are resolved before everything else.
    pub(crate) fn is_ignore_rule(&self) -> bool {
        match &self.kind {
            OptionKind::Ignore => true,
            OptionKind::PathFilter(f) => f.inner.is_ignore_rule(),
            OptionKind::ValuesFilter(f) => f.inner.is_ignore_rule(),
            _ => false,
        }
    }

    /// Reject options that have no meaning below a filter.
    pub(crate) fn check_filterable(&self) -> std::result::Result<(), OptionError> {
        match &self.kind {
            OptionKind::Visibility(_) | OptionKind::Reporter(_) => Err(OptionError::NotFilterable {
                option: self.to_string(),
            }),
            OptionKind::PathFilter(f) => f.inner.check_filterable(),
            OptionKind::ValuesFilter(f) => f.inner.check_filterable(),
            OptionKind::Group(list) => list.iter().try_for_each(CmpOption::check_filterable),
            _ => Ok(()),
        }
    }

    /// Evaluate this option at the current node of `s`.
    pub(crate) fn filter<'o>(
        &'o self,
        s: &mut State,
        t: Type,
        vx: Slot<'_>,
        vy: Slot<'_>,
    ) -> Result<Option<Applicable<'o>>> {
        Ok(match &self.kind {
            OptionKind::Ignore => Some(Applicable::Ignore),
            OptionKind::Comparer(c) => {
                let applies = c.input.map_or(true, |input| input == t);
                applies.then_some(Applicable::Comparer(c))
            }
            OptionKind::Transformer(tr) => {
                if s.path().transform_tail_contains(tr.id) || tr.input != t {
                    None
                } else {
                    Some(Applicable::Transformer(tr))
                }
            }
            OptionKind::PathFilter(f) => {
                if (f.pred)(s.path()) {
                    f.inner.filter(s, t, vx, vy)?
                } else {
                    None
                }
            }
            OptionKind::ValuesFilter(f) => {
                let (Slot::Present(x), Slot::Present(y)) = (vx, vy) else {
                    return Ok(None);
                };
                if f.input.map_or(true, |input| input == t) && s.call_ttb(&*f.pred, x, y, &f.name)? {
                    f.inner.filter(s, t, vx, vy)?
                } else {
                    None
                }
            }
            OptionKind::Group(list) => resolve(list, None, s, t, vx, vy)?,
            OptionKind::Visibility(_) | OptionKind::Reporter(_) => None,
        })
    }
}

/// What an option decided for one node.
pub(crate) enum Applicable<'o> {
    Ignore,
    /// Missing element or unreadable field
    Validator,
    Comparer(&'o Comparer),
    Transformer(&'o Transformer),
    /// More than one comparer or transformer; holds their descriptions
    Ambiguous(Vec<String>),
}

impl Applicable<'_> {
    fn describe(self) -> Vec<String> {
        match self {
            Applicable::Comparer(c) => vec![c.describe()],
            Applicable::Transformer(tr) => vec![tr.describe()],
            Applicable::Ambiguous(list) => list,
            Applicable::Ignore => vec!["Ignore()".to_string()],
            Applicable::Validator => Vec::new(),
        }
    }
}

/// Combine the decisions of `opts` at one node.
///
/// Ignore short-circuits. The validator outranks comparers and transformers.
/// Two or more comparers or transformers are ambiguous.
pub(crate) fn resolve<'o>(
    opts: &'o [CmpOption],
    initial: Option<Applicable<'o>>,
    s: &mut State,
    t: Type,
    vx: Slot<'_>,
    vy: Slot<'_>,
) -> Result<Option<Applicable<'o>>> {
    let mut out = initial;
    for opt in opts {
        match opt.filter(s, t, vx, vy)? {
            None => {}
            Some(Applicable::Ignore) => return Ok(Some(Applicable::Ignore)),
            Some(Applicable::Validator) => out = Some(Applicable::Validator),
            Some(found) => {
                out = match out {
                    None => Some(found),
                    Some(Applicable::Validator) => Some(Applicable::Validator),
                    Some(prev) => {
                        let mut all = prev.describe();
                        all.extend(found.describe());
                        Some(Applicable::Ambiguous(all))
                    }
                };
            }
        }
    }
    Ok(out)
}

impl Comparer {
    fn describe(&self) -> String {
        format!("Comparer({})", self.name)
    }
}

impl Transformer {
    fn describe(&self) -> String {
        format!("Transformer({}, {})", self.name, self.func_name)
    }
}

impl fmt::Display for CmpOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            OptionKind::Ignore => f.write_str("Ignore()"),
            OptionKind::Comparer(c) => f.write_str(&c.describe()),
            OptionKind::Transformer(tr) => f.write_str(&tr.describe()),
            OptionKind::PathFilter(pf) => write!(f, "FilterPath({}, {})", pf.name, pf.inner),
            OptionKind::ValuesFilter(vf) => write!(f, "FilterValues({}, {})", vf.name, vf.inner),
            OptionKind::Group(list) => {
                f.write_str("Options{")?;
                for (i, opt) in list.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", opt)?;
                }
                f.write_str("}")
            }
            OptionKind::Visibility(v) => {
                let mut names: Vec<String> = v.type_names.iter().map(|n| n.to_string()).collect();
                names.extend(v.prefixes.iter().map(|p| format!("{}::*", p)));
                write!(f, "AllowUnexported({})", names.join(", "))
            }
            OptionKind::Reporter(_) => f.write_str("Reporter(..)"),
        }
    }
}

impl fmt::Debug for CmpOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Readable name of a function or closure type.
fn function_name<F>() -> String {
    let name = std::any::type_name::<F>();
    name.strip_suffix("::{{closure}}")
        .map(|outer| format!("{}.func", outer))
        .unwrap_or_else(|| name.to_string())
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => chars.all(|c| c == '_' || c.is_alphanumeric()),
        _ => false,
    }
}

/// Identifier segments joined by `.` or `::`.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .split("::")
            .flat_map(|part| part.split('.'))
            .all(is_identifier)
}

// ---- constructors ----

/// Skip the node entirely. Must be wrapped in a filter.
pub fn ignore() -> CmpOption {
    CmpOption::new(OptionKind::Ignore)
}

/// Decide equality of `T` values with `f`.
///
/// `f` must be symmetric, deterministic and pure; the engine spot-checks the
/// first two by calling it again with swapped arguments.
pub fn comparer<T, F>(f: F) -> CmpOption
where
    T: Reflect,
    F: Fn(&T, &T) -> bool + Send + Sync + 'static,
{
    let name = function_name::<F>();
    let func = move |x: &dyn Reflect, y: &dyn Reflect| {
        Some(f(x.downcast_ref::<T>()?, y.downcast_ref::<T>()?))
    };
    CmpOption::new(OptionKind::Comparer(Arc::new(Comparer {
        name,
        input: Some(T::static_type()),
        func: Box::new(func),
    })))
}

/// Decide equality of values of any type with `f`. Must be wrapped in a filter.
pub fn comparer_any<F>(f: F) -> CmpOption
where
    F: Fn(&dyn Reflect, &dyn Reflect) -> bool + Send + Sync + 'static,
{
    let name = function_name::<F>();
    let func = move |x: &dyn Reflect, y: &dyn Reflect| Some(f(x, y));
    CmpOption::new(OptionKind::Comparer(Arc::new(Comparer {
        name,
        input: None,
        func: Box::new(func),
    })))
}

/// Compare `T` values by comparing `f(x)` with `f(y)`.
///
/// An empty `name` is derived from `F` and falls back to `λ` for closures.
///
/// # Errors
///
/// `InvalidName` if `name` is not identifier segments joined by `.` or `::`.
pub fn transformer<T, R, F>(name: &str, f: F) -> Result<CmpOption>
where
    T: Reflect,
    R: Reflect,
    F: Fn(&T) -> R + Send + Sync + 'static,
{
    let func_name = function_name::<F>();
    let name = if name.is_empty() {
        func_name
            .rsplit("::")
            .next()
            .filter(|last| is_identifier(last))
            .unwrap_or("λ")
            .to_string()
    } else if is_valid_name(name) {
        name.to_string()
    } else {
        return Err(OptionError::InvalidTransformerName {
            name: name.to_string(),
        }
        .into());
    };
    let func = move |x: &dyn Reflect| -> Option<Box<dyn Reflect>> {
        let out: Box<dyn Reflect> = Box::new(f(x.downcast_ref::<T>()?));
        Some(out)
    };
    let id = OptionId::next();
    Ok(CmpOption {
        id,
        kind: OptionKind::Transformer(Arc::new(Transformer {
            id,
            name,
            func_name,
            input: T::static_type(),
            output: R::static_type(),
            func: Box::new(func),
        })),
    })
}

/// Apply `opt` only where `pred` accepts the current path.
pub fn filter_path<F>(pred: F, opt: CmpOption) -> CmpOption
where
    F: Fn(&Path) -> bool + Send + Sync + 'static,
{
    CmpOption::new(OptionKind::PathFilter(Arc::new(PathFilter {
        name: function_name::<F>(),
        pred: Box::new(pred),
        inner: opt,
    })))
}

/// Apply `opt` only to `T` nodes where `pred(x, y)` holds.
///
/// `pred` must be symmetric and deterministic.
pub fn filter_values<T, F>(pred: F, opt: CmpOption) -> CmpOption
where
    T: Reflect,
    F: Fn(&T, &T) -> bool + Send + Sync + 'static,
{
    let name = function_name::<F>();
    let func = move |x: &dyn Reflect, y: &dyn Reflect| {
        Some(pred(x.downcast_ref::<T>()?, y.downcast_ref::<T>()?))
    };
    CmpOption::new(OptionKind::ValuesFilter(Arc::new(ValuesFilter {
        name,
        input: Some(T::static_type()),
        pred: Box::new(func),
        inner: opt,
    })))
}

/// Apply `opt` to nodes of any type where `pred(x, y)` holds.
pub fn filter_values_any<F>(pred: F, opt: CmpOption) -> CmpOption
where
    F: Fn(&dyn Reflect, &dyn Reflect) -> bool + Send + Sync + 'static,
{
    let name = function_name::<F>();
    let func = move |x: &dyn Reflect, y: &dyn Reflect| Some(pred(x, y));
    CmpOption::new(OptionKind::ValuesFilter(Arc::new(ValuesFilter {
        name,
        input: None,
        pred: Box::new(func),
        inner: opt,
    })))
}

/// Bundle several options into one.
pub fn group(opts: Vec<CmpOption>) -> CmpOption {
    CmpOption::new(OptionKind::Group(opts.into()))
}

/// Allow reading unexported fields of exactly these struct types.
///
/// # Errors
///
/// `InvalidOption` if a type is not a struct.
pub fn allow_unexported(types: &[Type]) -> Result<CmpOption> {
    let mut grant = Visibility::default();
    for t in types {
        if t.kind() != Kind::Struct {
            return Err(OptionError::NotAStruct {
                type_name: t.name().to_string(),
            }
            .into());
        }
        if grant.types.insert(t.id()) {
            grant.type_names.push(t.name());
        }
    }
    Ok(CmpOption::new(OptionKind::Visibility(Arc::new(grant))))
}

/// Allow reading unexported fields of every struct declared in `prefix` or
/// its submodules.
pub fn allow_unexported_within_module(prefix: &str) -> CmpOption {
    let grant = Visibility {
        prefixes: vec![prefix.trim_end_matches("::").to_string()],
        ..Visibility::default()
    };
    CmpOption::new(OptionKind::Visibility(Arc::new(grant)))
}

/// Receive every traversal event of the comparison.
pub fn reporter<R>(sink: Arc<Mutex<R>>) -> CmpOption
where
    R: Reporter + Send + 'static,
{
    let sink: Arc<Mutex<dyn Reporter + Send>> = sink;
    CmpOption::new(OptionKind::Reporter(sink))
}

/// Error for an option set that is ambiguous at the current node.
pub(crate) fn ambiguity_error(path: &Path, candidates: Vec<String>) -> CmpError {
    CmpError::new(CmpErrorKind::AmbiguousOptions)
        .with_path(path.to_string())
        .with_message(
            "ambiguous set of applicable options; consider using filters to ensure at most one comparer or transformer may apply",
        )
        .with_candidates(candidates)
}
