//! The recursive comparison walk.
//!
//! Each node goes through the same steps in order: the recursive transformer
//! guard, option resolution, the type's equality method, and finally the
//! structural rule for its kind. Every descent pushes exactly one path step
//! and pops it on the way out, including when an error unwinds the walk.

use crate::cycles::{PointerPath, RecursionGuard};
use crate::errors::{CmpError, CmpErrorKind, OptionError, Result};
use crate::format::format_key;
use crate::options::{self, Applicable, BinaryFn, CmpOption, OptionKind, Transformer};
use crate::ordering::sort_keys;
use crate::path::{Path, PathStep};
use crate::reflect::{Kind, MapView, Reflect, SeqView, StructView, Type, View};
use crate::report::{Outcome, Reporter, Via};
use crate::sequence::{difference, DiffResult, EditType};
use std::any::TypeId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One side of the node being compared.
#[derive(Clone, Copy)]
pub(crate) enum Slot<'v> {
    Present(&'v dyn Reflect),
    /// Element or entry that exists on the other side only
    Missing,
    /// Unexported field without a visibility grant
    Hidden,
}

impl<'v> Slot<'v> {
    pub(crate) fn value(self) -> Option<&'v dyn Reflect> {
        match self {
            Slot::Present(v) => Some(v),
            Slot::Missing | Slot::Hidden => None,
        }
    }

    fn is_present(self) -> bool {
        matches!(self, Slot::Present(_))
    }

    fn is_hidden(self) -> bool {
        matches!(self, Slot::Hidden)
    }

    fn from_option(v: Option<&'v dyn Reflect>) -> Self {
        v.map_or(Slot::Missing, Slot::Present)
    }
}

/// Decides when user functions are re-run with swapped arguments: calls
/// 0, 1, 3, 6, 10, ... (triangular numbers).
#[derive(Debug, Default)]
struct DynChecker {
    curr: usize,
    next: usize,
}

impl DynChecker {
    fn next(&mut self) -> bool {
        let due = self.curr == self.next;
        if due {
            self.curr = 0;
            self.next += 1;
        }
        self.curr += 1;
        due
    }
}

type SharedReporter = Arc<Mutex<dyn Reporter + Send>>;

fn lock(r: &SharedReporter) -> MutexGuard<'_, dyn Reporter + Send + 'static> {
    r.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-call comparison state.
pub(crate) struct State {
    result: DiffResult,
    cur_path: Path,
    reporters: Vec<SharedReporter>,
    opts: Arc<[CmpOption]>,
    visible_types: HashSet<TypeId>,
    visible_modules: Vec<String>,
    dyn_checker: DynChecker,
    recursion: RecursionGuard,
    pointers: PointerPath,
}

impl State {
    /// Flatten and validate `opts`.
    pub(crate) fn new(opts: &[CmpOption]) -> Result<Self> {
        let mut state = Self {
            result: DiffResult::default(),
            cur_path: Path::new(),
            reporters: Vec::new(),
            opts: Arc::from(Vec::new()),
            visible_types: HashSet::new(),
            visible_modules: Vec::new(),
            dyn_checker: DynChecker::default(),
            recursion: RecursionGuard::default(),
            pointers: PointerPath::default(),
        };
        let mut core = Vec::new();
        for opt in opts {
            state.process_option(opt, &mut core)?;
        }
        core.sort_by_key(|opt| !opt.is_ignore_rule());
        state.opts = core.into();
        Ok(state)
    }

    fn process_option(&mut self, opt: &CmpOption, core: &mut Vec<CmpOption>) -> Result<()> {
        match &opt.kind {
            OptionKind::Group(list) => list
                .iter()
                .try_for_each(|inner| self.process_option(inner, core)),
            OptionKind::Visibility(grant) => {
                self.visible_types.extend(grant.types.iter().copied());
                self.visible_modules.extend(grant.prefixes.iter().cloned());
                Ok(())
            }
            OptionKind::Reporter(sink) => {
                self.reporters.push(Arc::clone(sink));
                Ok(())
            }
            _ => {
                if !opt.is_filtered() {
                    return Err(OptionError::Unfiltered {
                        option: opt.to_string(),
                    }
                    .into());
                }
                opt.check_filterable()?;
                core.push(opt.clone());
                Ok(())
            }
        }
    }

    pub(crate) fn result(&self) -> DiffResult {
        self.result
    }

    pub(crate) fn path(&self) -> &Path {
        &self.cur_path
    }

    pub(crate) fn num_options(&self) -> usize {
        self.opts.len()
    }

    /// Compare the two top-level values.
    ///
    /// Values of different types meet under a synthetic dynamic root, where
    /// the dynamic-value rule reports them unequal.
    pub(crate) fn compare_root(&mut self, x: &dyn Reflect, y: &dyn Reflect) -> Result<()> {
        let (tx, ty) = (x.type_of(), y.type_of());
        let typ = if tx == ty { tx } else { Type::dynamic() };
        self.compare_any(PathStep::Root { typ }, Slot::Present(x), Slot::Present(y))?;
        if !self.cur_path.is_empty() {
            return Err(CmpError::new(CmpErrorKind::Internal)
                .with_path(self.cur_path.to_string())
                .with_message("path not empty after traversal"));
        }
        Ok(())
    }

    fn compare_any(&mut self, step: PathStep, vx: Slot<'_>, vy: Slot<'_>) -> Result<()> {
        self.cur_path.push(step);
        if let Some(step) = self.cur_path.last() {
            for r in &self.reporters {
                lock(r).push_step(step, vx.value(), vy.value());
            }
        }
        let res = self.compare_node(vx, vy);
        for r in self.reporters.iter().rev() {
            lock(r).pop_step();
        }
        self.cur_path.pop();
        res
    }

    fn compare_node(&mut self, vx: Slot<'_>, vy: Slot<'_>) -> Result<()> {
        self.recursion
            .check(&self.cur_path)
            .map_err(|e| e.with_path(self.cur_path.to_string()))?;
        let t = self
            .cur_path
            .last()
            .map(PathStep::typ)
            .ok_or_else(|| self.error(CmpErrorKind::Internal, "empty path"))?;

        if self.try_options(t, vx, vy)? {
            return Ok(());
        }
        let (Slot::Present(x), Slot::Present(y)) = (vx, vy) else {
            return Err(self.error(
                CmpErrorKind::Internal,
                "unreadable values escaped the validator",
            ));
        };
        if self.try_method(t, x, y)? {
            return Ok(());
        }
        self.compare_kind(t, x, y)
    }

    // ---- options ----

    fn try_options(&mut self, t: Type, vx: Slot<'_>, vy: Slot<'_>) -> Result<bool> {
        let opts = Arc::clone(&self.opts);
        let builtin = if vx.is_present() && vy.is_present() {
            None
        } else {
            Some(Applicable::Validator)
        };
        let Some(applicable) = options::resolve(&opts, builtin, self, t, vx, vy)? else {
            return Ok(false);
        };
        self.apply(applicable, vx, vy)?;
        Ok(true)
    }

    fn apply(&mut self, applicable: Applicable<'_>, vx: Slot<'_>, vy: Slot<'_>) -> Result<()> {
        match applicable {
            Applicable::Ignore => self.report(true, Via::Ignore, vx, vy),
            Applicable::Validator => self.apply_validator(vx, vy),
            Applicable::Comparer(c) => {
                let (x, y) = self.both(vx, vy)?;
                let eq = self.call_ttb(&*c.func, x, y, &c.name)?;
                self.report(eq, Via::Comparer, vx, vy)
            }
            Applicable::Transformer(tr) => self.apply_transformer(tr, vx, vy),
            Applicable::Ambiguous(candidates) => {
                Err(options::ambiguity_error(&self.cur_path, candidates))
            }
        }
    }

    fn apply_validator(&mut self, vx: Slot<'_>, vy: Slot<'_>) -> Result<()> {
        if vx.is_hidden() && vy.is_hidden() {
            return Err(self.unexported_error());
        }
        self.report(vx.is_present() == vy.is_present(), Via::Structure, vx, vy)
    }

    fn unexported_error(&self) -> CmpError {
        let owner = self
            .cur_path
            .index(-2)
            .map_or_else(|| "?".to_string(), |step| step.typ().name().to_string());
        let field = self
            .cur_path
            .last()
            .and_then(PathStep::field_name)
            .unwrap_or("?");
        self.error(
            CmpErrorKind::UnexportedField,
            format!(
                "cannot handle unexported field `{}` of {}; consider a custom comparer, \
                 allow_unexported or allow_unexported_within_module for the type, \
                 or ignoring the field with a path filter",
                field, owner
            ),
        )
    }

    fn apply_transformer(&mut self, tr: &Transformer, vx: Slot<'_>, vy: Slot<'_>) -> Result<()> {
        let (x, y) = self.both(vx, vy)?;
        let step = PathStep::Transform {
            name: tr.name.clone(),
            option_id: tr.id,
            typ: tr.output,
        };
        let out_x = self.call_transformer(tr, x, &step)?;
        let out_y = self.call_transformer(tr, y, &step)?;
        self.compare_any(step, Slot::Present(&*out_x), Slot::Present(&*out_y))
    }

    /// Run a transformer, re-running it on the self-check cadence to catch
    /// non-deterministic output.
    fn call_transformer(
        &mut self,
        tr: &Transformer,
        v: &dyn Reflect,
        step: &PathStep,
    ) -> Result<Box<dyn Reflect>> {
        let want = self.invoke_transformer(tr, v)?;
        if !self.dyn_checker.next() {
            return Ok(want);
        }
        let got = self.invoke_transformer(tr, v)?;
        let agree = self
            .stateless_compare(step.clone(), Slot::Present(&*got), Slot::Present(&*want))?
            .equal();
        if agree {
            return Ok(want);
        }
        // Output that differs from itself (NaN) proves nothing.
        let reflexive = self
            .stateless_compare(step.clone(), Slot::Present(&*want), Slot::Present(&*want))?
            .equal();
        if !reflexive {
            return Ok(want);
        }
        Err(self.error(
            CmpErrorKind::NonDeterministicFunction,
            format!("non-deterministic function detected: {}", tr.func_name),
        ))
    }

    fn invoke_transformer(&self, tr: &Transformer, v: &dyn Reflect) -> Result<Box<dyn Reflect>> {
        (tr.func)(v).ok_or_else(|| {
            self.descriptor_error(format!(
                "transformer {} expects {} but got {}",
                tr.name,
                tr.input.name(),
                v.type_of().name()
            ))
        })
    }

    /// Call a two-argument predicate, re-running it with swapped arguments on
    /// the self-check cadence.
    pub(crate) fn call_ttb(
        &mut self,
        f: &BinaryFn,
        x: &dyn Reflect,
        y: &dyn Reflect,
        name: &str,
    ) -> Result<bool> {
        let want = f(x, y).ok_or_else(|| self.mismatch_error(name, x))?;
        if !self.dyn_checker.next() {
            return Ok(want);
        }
        let got = f(y, x).ok_or_else(|| self.mismatch_error(name, x))?;
        if got != want {
            return Err(self.error(
                CmpErrorKind::NonDeterministicFunction,
                format!("non-deterministic or non-symmetric function detected: {}", name),
            ));
        }
        Ok(want)
    }

    fn mismatch_error(&self, name: &str, v: &dyn Reflect) -> CmpError {
        self.descriptor_error(format!(
            "{} received values of an unexpected type {}",
            name,
            v.type_of().name()
        ))
    }

    // ---- equality method ----

    fn try_method(&mut self, t: Type, x: &dyn Reflect, y: &dyn Reflect) -> Result<bool> {
        if t == Type::dynamic() {
            return Ok(false);
        }
        let Some(want) = x.try_equal(y) else {
            return Ok(false);
        };
        if self.dyn_checker.next() && y.try_equal(x) != Some(want) {
            return Err(self.error(
                CmpErrorKind::NonDeterministicFunction,
                format!(
                    "non-deterministic or non-symmetric equality method detected on {}",
                    t.name()
                ),
            ));
        }
        self.report(want, Via::Method, Slot::Present(x), Slot::Present(y))?;
        Ok(true)
    }

    // ---- structural rules ----

    fn compare_kind(&mut self, t: Type, x: &dyn Reflect, y: &dyn Reflect) -> Result<()> {
        let (px, py) = (Slot::Present(x), Slot::Present(y));
        if t == Type::dynamic() {
            return self.compare_interface(Some(x), Some(y), px, py);
        }
        match (x.view(), y.view()) {
            (View::Bool(a), View::Bool(b)) => self.report(a == b, Via::Structure, px, py),
            (View::Int(a), View::Int(b)) => self.report(a == b, Via::Structure, px, py),
            (View::Uint(a), View::Uint(b)) => self.report(a == b, Via::Structure, px, py),
            (View::Float(a), View::Float(b)) => self.report(a == b, Via::Structure, px, py),
            (View::Complex(ar, ai), View::Complex(br, bi)) => {
                self.report(ar == br && ai == bi, Via::Structure, px, py)
            }
            (View::Str(a), View::Str(b)) => self.report(a == b, Via::Structure, px, py),
            (View::RawPointer(a), View::RawPointer(b)) => {
                self.report(a == b, Via::Structure, px, py)
            }
            (View::Func { is_nil: a }, View::Func { is_nil: b }) => {
                self.report(a && b, Via::Structure, px, py)
            }
            (
                View::Pointer {
                    target: tx,
                    addr: ax,
                },
                View::Pointer {
                    target: ty,
                    addr: ay,
                },
            ) => self.compare_pointer((tx, ax), (ty, ay), px, py),
            (View::Interface(a), View::Interface(b)) => self.compare_interface(a, b, px, py),
            (View::Struct(a), View::Struct(b)) => self.compare_struct(t, a, b),
            (View::Seq(a), View::Seq(b)) => self.compare_seq(t, a, b, px, py),
            (View::Map(a), View::Map(b)) => self.compare_map(a, b, px, py),
            _ => Err(self.descriptor_error(format!(
                "values of {} expose different views",
                t.name()
            ))),
        }
    }

    fn compare_pointer(
        &mut self,
        (tx, ax): (Option<&dyn Reflect>, Option<usize>),
        (ty, ay): (Option<&dyn Reflect>, Option<usize>),
        px: Slot<'_>,
        py: Slot<'_>,
    ) -> Result<()> {
        let (Some(a), Some(b)) = (tx, ty) else {
            return self.report(tx.is_none() && ty.is_none(), Via::Structure, px, py);
        };
        let step = PathStep::Indirect { typ: a.type_of() };
        let (Some(addr_x), Some(addr_y)) = (ax, ay) else {
            return self.compare_any(step, Slot::Present(a), Slot::Present(b));
        };
        if let Some(eq) = self.pointers.push(addr_x, addr_y) {
            return self.report(eq, Via::Cycle, px, py);
        }
        let res = self.compare_any(step, Slot::Present(a), Slot::Present(b));
        self.pointers.pop(addr_x, addr_y);
        res
    }

    fn compare_interface(
        &mut self,
        a: Option<&dyn Reflect>,
        b: Option<&dyn Reflect>,
        px: Slot<'_>,
        py: Slot<'_>,
    ) -> Result<()> {
        match (a, b) {
            (Some(a), Some(b)) => {
                let typ = a.type_of();
                if typ != b.type_of() {
                    return self.report(false, Via::Structure, px, py);
                }
                self.compare_any(PathStep::TypeAssertion { typ }, Slot::Present(a), Slot::Present(b))
            }
            (a, b) => self.report(a.is_none() && b.is_none(), Via::Structure, px, py),
        }
    }

    fn compare_struct(&mut self, t: Type, a: &dyn StructView, b: &dyn StructView) -> Result<()> {
        let (fx, fy) = (a.fields(), b.fields());
        if fx.len() != fy.len() {
            return Err(self.descriptor_error(format!(
                "{} reported {} and {} fields",
                t.name(),
                fx.len(),
                fy.len()
            )));
        }
        let mut may_export = None;
        for (index, (f, g)) in fx.iter().zip(fy.iter()).enumerate() {
            if f.name == "_" {
                continue;
            }
            let readable = f.exported || *may_export.get_or_insert_with(|| self.may_export(t));
            let step = PathStep::StructField {
                name: f.name,
                index,
                typ: f.value.type_of(),
                exported: f.exported,
            };
            if readable {
                self.compare_any(step, Slot::Present(f.value), Slot::Present(g.value))?;
            } else {
                self.compare_any(step, Slot::Hidden, Slot::Hidden)?;
            }
        }
        Ok(())
    }

    fn may_export(&self, t: Type) -> bool {
        self.visible_types.contains(&t.id())
            || self.visible_modules.iter().any(|m| t.within_module(m))
    }

    fn compare_seq(
        &mut self,
        t: Type,
        a: &dyn SeqView,
        b: &dyn SeqView,
        px: Slot<'_>,
        py: Slot<'_>,
    ) -> Result<()> {
        if t.kind() != Kind::Array && (a.is_nil() || b.is_nil()) {
            return self.report(a.is_nil() && b.is_nil(), Via::Structure, px, py);
        }
        let (nx, ny) = (a.len(), b.len());

        // An element that would be ignored standing alone is kept out of the
        // alignment and replayed in place afterwards.
        let mut ignored_x = Vec::with_capacity(nx);
        let mut kept_x = Vec::with_capacity(nx);
        for ix in 0..nx {
            let (step, sx, sy) = self.seq_slots(a, b, Some(ix), None)?;
            let ignored = self.stateless_compare(step, sx, sy)?.num_diff == 0;
            if !ignored {
                kept_x.push(ix);
            }
            ignored_x.push(ignored);
        }
        let mut ignored_y = Vec::with_capacity(ny);
        let mut kept_y = Vec::with_capacity(ny);
        for iy in 0..ny {
            let (step, sx, sy) = self.seq_slots(a, b, None, Some(iy))?;
            let ignored = self.stateless_compare(step, sx, sy)?.num_diff == 0;
            if !ignored {
                kept_y.push(iy);
            }
            ignored_y.push(ignored);
        }

        let script = difference(kept_x.len(), kept_y.len(), |ix, iy| {
            let (step, sx, sy) = self.seq_slots(a, b, Some(kept_x[ix]), Some(kept_y[iy]))?;
            self.stateless_compare(step, sx, sy)
        })?;

        let mut edits = script.into_iter();
        let (mut ix, mut iy) = (0, 0);
        while ix < nx || iy < ny {
            let edit = if ix < nx && ignored_x[ix] {
                EditType::UniqueX
            } else if iy < ny && ignored_y[iy] {
                EditType::UniqueY
            } else {
                edits.next().ok_or_else(|| {
                    self.error(CmpErrorKind::Internal, "edit script shorter than the sequences")
                })?
            };
            let (sx_index, sy_index) = match edit {
                EditType::UniqueX => (Some(ix), None),
                EditType::UniqueY => (None, Some(iy)),
                EditType::Identity | EditType::Modified => (Some(ix), Some(iy)),
            };
            let (step, sx, sy) = self.seq_slots(a, b, sx_index, sy_index)?;
            self.compare_any(step, sx, sy)?;
            ix += usize::from(sx_index.is_some());
            iy += usize::from(sy_index.is_some());
        }
        Ok(())
    }

    fn seq_slots<'v>(
        &self,
        a: &'v dyn SeqView,
        b: &'v dyn SeqView,
        ix: Option<usize>,
        iy: Option<usize>,
    ) -> Result<(PathStep, Slot<'v>, Slot<'v>)> {
        let fetch = |seq: &'v dyn SeqView, i: Option<usize>| -> Result<Slot<'v>> {
            match i {
                None => Ok(Slot::Missing),
                Some(i) => seq.index(i).map(Slot::Present).ok_or_else(|| {
                    self.descriptor_error(format!(
                        "index {} of {} is missing",
                        i,
                        seq.len()
                    ))
                }),
            }
        };
        let (sx, sy) = (fetch(a, ix)?, fetch(b, iy)?);
        let typ = sx
            .value()
            .or(sy.value())
            .map(|v| v.type_of())
            .ok_or_else(|| self.error(CmpErrorKind::Internal, "slice step without elements"))?;
        Ok((
            PathStep::SliceIndex {
                x_index: ix,
                y_index: iy,
                typ,
            },
            sx,
            sy,
        ))
    }

    fn compare_map(
        &mut self,
        a: &dyn MapView,
        b: &dyn MapView,
        px: Slot<'_>,
        py: Slot<'_>,
    ) -> Result<()> {
        if a.is_nil() || b.is_nil() {
            return self.report(a.is_nil() && b.is_nil(), Via::Structure, px, py);
        }
        // Identity-keyed maps hold equal keys at different addresses, so a key
        // of `b` that `a` already resolves is not a second entry.
        let mut keys = a.keys();
        keys.extend(b.keys().into_iter().filter(|k| a.get(*k).is_none()));
        for key in sort_keys(keys) {
            let (vx, vy) = (a.get(key), b.get(key));
            let Some(typ) = vx.or(vy).map(|v| v.type_of()) else {
                return Err(self.error(
                    CmpErrorKind::NanMapKey,
                    format!(
                        "map key {} cannot be looked up (NaN); consider providing a comparer for the map",
                        format_key(key)
                    ),
                ));
            };
            let step = PathStep::MapKey {
                key: format_key(key),
                typ,
            };
            self.compare_any(step, Slot::from_option(vx), Slot::from_option(vy))?;
        }
        Ok(())
    }

    // ---- tallies ----

    /// Compare without touching the tallies or the reporters.
    fn stateless_compare(&mut self, step: PathStep, vx: Slot<'_>, vy: Slot<'_>) -> Result<DiffResult> {
        let saved_result = std::mem::take(&mut self.result);
        let saved_reporters = std::mem::take(&mut self.reporters);
        let res = self.compare_any(step, vx, vy);
        let probe = std::mem::replace(&mut self.result, saved_result);
        self.reporters = saved_reporters;
        res.map(|()| probe)
    }

    fn report(&mut self, eq: bool, via: Via, vx: Slot<'_>, vy: Slot<'_>) -> Result<()> {
        let outcome = if via == Via::Ignore {
            Outcome::Ignored
        } else if eq {
            self.result.num_same += 1;
            Outcome::Equal
        } else {
            self.result.num_diff += 1;
            Outcome::Unequal
        };
        for r in &self.reporters {
            lock(r).report(outcome, via, vx.value(), vy.value());
        }
        Ok(())
    }

    fn both<'v>(&self, vx: Slot<'v>, vy: Slot<'v>) -> Result<(&'v dyn Reflect, &'v dyn Reflect)> {
        match (vx, vy) {
            (Slot::Present(x), Slot::Present(y)) => Ok((x, y)),
            _ => Err(self.error(CmpErrorKind::Internal, "option applied to unreadable values")),
        }
    }

    fn error(&self, kind: CmpErrorKind, message: impl Into<String>) -> CmpError {
        CmpError::new(kind)
            .with_path(self.cur_path.to_string())
            .with_message(message)
    }

    fn descriptor_error(&self, message: String) -> CmpError {
        self.error(CmpErrorKind::InvalidDescriptor, message)
    }
}
