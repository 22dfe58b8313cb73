#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{person, Person};
use deepcmp::{
    comparer, comparer_any, diff, equal, filter_path, filter_values, filter_values_any, group,
    ignore, reporter, transformer, CmpErrorKind, Outcome, Path, PathStep, Reflect, Reporter, Via,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn field_is(name: &'static str) -> impl Fn(&Path) -> bool + Send + Sync + 'static {
    move |p: &Path| p.last().and_then(PathStep::field_name) == Some(name)
}

fn sorted(v: &Vec<i32>) -> Vec<i32> {
    let mut v = v.clone();
    v.sort();
    v
}

#[test]
fn test_ignore_field_by_path() {
    let opts = [filter_path(field_is("age"), ignore())];
    assert!(equal(&person("ana", 30), &person("ana", 99), &opts).unwrap());
    assert!(!equal(&person("ana", 30), &person("bo", 30), &opts).unwrap());
    assert_eq!(diff(&person("ana", 30), &person("ana", 99), &opts).unwrap(), "");
}

#[test]
fn test_unfiltered_options_are_rejected() {
    let err = equal(&1i32, &1i32, &[ignore()]).unwrap_err();
    assert_eq!(err.kind(), CmpErrorKind::UnfilteredOption);
    assert_eq!(err.op(), Some("equal"));

    let err = equal(&1i32, &1i32, &[comparer_any(|_, _| true)]).unwrap_err();
    assert_eq!(err.kind(), CmpErrorKind::UnfilteredOption);

    let filtered = filter_path(|_| true, comparer_any(|_, _| true));
    assert!(equal(&1i32, &2i32, &[filtered]).unwrap());
}

#[test]
fn test_typed_comparer() {
    let opts = [comparer(|a: &String, b: &String| a.eq_ignore_ascii_case(b))];
    assert!(equal(&person("ANA", 1), &person("ana", 1), &opts).unwrap());
    assert!(!equal(&person("ana", 1), &person("bo", 1), &opts).unwrap());
}

#[test]
fn test_ambiguous_comparers() {
    let opts = [
        comparer(|a: &i32, b: &i32| a == b),
        comparer(|a: &i32, b: &i32| a % 2 == b % 2),
    ];
    let err = equal(&vec![1i32], &vec![1i32], &opts).unwrap_err();
    assert_eq!(err.kind(), CmpErrorKind::AmbiguousOptions);
    assert_eq!(err.candidates().map(|c| c.len()), Some(2));
    assert!(err.candidates().unwrap()[0].starts_with("Comparer("));
}

#[test]
fn test_ignore_short_circuits_ambiguity() {
    let opts = [
        comparer(|a: &u32, b: &u32| a == b),
        comparer(|a: &u32, b: &u32| a != b),
        filter_path(field_is("age"), ignore()),
    ];
    assert!(equal(&person("ana", 1), &person("ana", 2), &opts).unwrap());
}

#[test]
fn test_transformer_sorts_before_comparing() {
    let opts = [transformer("Sort", sorted).unwrap()];
    assert!(equal(&vec![3i32, 1, 2], &vec![1i32, 2, 3], &opts).unwrap());

    let out = diff(&vec![3i32, 1, 2], &vec![1i32, 2, 4], &opts).unwrap();
    assert!(out.starts_with("{Vec<i32>}.Sort()[2]:"), "{}", out);
}

#[test]
fn test_transformer_does_not_reapply_to_own_output() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let opts = [transformer("Trim", move |s: &String| {
        counter.fetch_add(1, Ordering::Relaxed);
        s.trim().to_string()
    })
    .unwrap()];
    assert!(equal(&"  a ".to_string(), &"a".to_string(), &opts).unwrap());
    assert!(calls.load(Ordering::Relaxed) <= 4);
}

#[test]
fn test_non_deterministic_transformer() {
    let counter = AtomicUsize::new(0);
    let opts = [transformer("Tick", move |_: &i32| counter.fetch_add(1, Ordering::Relaxed)).unwrap()];
    let err = equal(&1i32, &1i32, &opts).unwrap_err();
    assert_eq!(err.kind(), CmpErrorKind::NonDeterministicFunction);
}

#[test]
fn test_non_symmetric_comparer() {
    let opts = [comparer(|a: &i32, b: &i32| a < b)];
    let err = equal(&1i32, &2i32, &opts).unwrap_err();
    assert_eq!(err.kind(), CmpErrorKind::NonDeterministicFunction);
    assert!(err.path().is_some());
}

#[test]
fn test_recursive_transformer_is_detected() {
    let opts = [transformer("Wrap", |x: &i32| vec![*x]).unwrap()];
    let err = equal(&1i32, &1i32, &opts).unwrap_err();
    assert_eq!(err.kind(), CmpErrorKind::RecursiveTransformer);
    assert_eq!(err.op(), Some("equal"));
    assert!(err.message().contains("Wrap()"), "{}", err);

    let err = diff(&vec![2i32], &vec![2i32], &opts).unwrap_err();
    assert_eq!(err.kind(), CmpErrorKind::RecursiveTransformer);
}

#[test]
fn test_value_filter_approximate_floats() {
    let approx = filter_values(
        |a: &f64, b: &f64| (a - b).abs() < 0.01,
        comparer(|_: &f64, _: &f64| true),
    );
    assert!(equal(&vec![1.0f64, 2.0], &vec![1.001f64, 2.0], &[approx.clone()]).unwrap());
    assert!(!equal(&vec![1.0f64], &vec![1.5f64], &[approx]).unwrap());
}

#[test]
fn test_value_filter_any_type() {
    let both_counts = |x: &dyn Reflect, y: &dyn Reflect| {
        x.downcast_ref::<u32>().is_some() && y.downcast_ref::<u32>().is_some()
    };
    let opts = [filter_values_any(both_counts, comparer_any(|_, _| true))];
    assert!(equal(&person("ana", 1), &person("ana", 2), &opts).unwrap());
    assert!(!equal(&person("ana", 1), &person("bo", 1), &opts).unwrap());
}

#[test]
fn test_groups_are_flattened() {
    let opts = [group(vec![
        filter_path(field_is("age"), ignore()),
        group(vec![comparer(|a: &String, b: &String| a.len() == b.len())]),
    ])];
    assert!(equal(&person("ana", 1), &person("bob", 2), &opts).unwrap());
}

#[derive(Default)]
struct EventLog {
    depth: usize,
    max_depth: usize,
    pushes: usize,
    leaves: Vec<(String, Outcome, Via)>,
    path: Vec<String>,
}

impl Reporter for EventLog {
    fn push_step(&mut self, step: &PathStep, _x: Option<&dyn Reflect>, _y: Option<&dyn Reflect>) {
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        self.pushes += 1;
        self.path.push(step.to_string());
    }

    fn report(&mut self, outcome: Outcome, via: Via, _x: Option<&dyn Reflect>, _y: Option<&dyn Reflect>) {
        self.leaves.push((self.path.concat(), outcome, via));
    }

    fn pop_step(&mut self) {
        self.depth -= 1;
        self.path.pop();
    }
}

#[test]
fn test_reporter_sees_balanced_events() {
    let log = Arc::new(Mutex::new(EventLog::default()));
    let opts = [
        reporter(Arc::clone(&log)),
        filter_path(field_is("age"), ignore()),
    ];
    let x: Vec<Person> = vec![person("a", 1), person("b", 2)];
    let y: Vec<Person> = vec![person("a", 5), person("c", 2)];
    assert!(!equal(&x, &y, &opts).unwrap());

    let log = log.lock().unwrap();
    assert_eq!(log.depth, 0);
    assert_eq!(log.max_depth, 3);
    // root, 2 elements, 3 fields each
    assert_eq!(log.pushes, 1 + 2 + 2 * 3);
    let ignored = log
        .leaves
        .iter()
        .filter(|(_, outcome, _)| *outcome == Outcome::Ignored)
        .count();
    assert_eq!(ignored, 2);
    assert!(log
        .leaves
        .iter()
        .any(|(path, outcome, via)| path == "{Vec<Person>}[1].name"
            && *outcome == Outcome::Unequal
            && *via == Via::Structure));
}
