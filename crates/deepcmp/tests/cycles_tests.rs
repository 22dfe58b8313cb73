#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{link, node, ring};
use deepcmp::{diff, diff_tree, equal, Via};
use std::rc::Rc;

#[test]
fn test_isomorphic_cycles_are_equal() {
    assert!(equal(&ring(1, 7), &ring(1, 7), &[]).unwrap());
    assert!(equal(&ring(2, 7), &ring(2, 7), &[]).unwrap());
    assert!(equal(&ring(5, 7), &ring(5, 7), &[]).unwrap());
}

#[test]
fn test_cycles_of_different_length_are_unequal() {
    assert!(!equal(&ring(1, 7), &ring(2, 7), &[]).unwrap());
    assert!(!equal(&ring(3, 7), &ring(2, 7), &[]).unwrap());
}

#[test]
fn test_cycle_values_still_compared() {
    assert!(!equal(&ring(3, 1), &ring(3, 2), &[]).unwrap());
}

#[test]
fn test_shared_pointer_compared_with_itself() {
    let r = ring(4, 1);
    assert!(equal(&r, &Rc::clone(&r), &[]).unwrap());
}

#[test]
fn test_acyclic_chain_against_cycle() {
    let a = node(1);
    let b = node(1);
    link(&a, &b);
    assert!(!equal(&a, &ring(2, 1), &[]).unwrap());
}

#[test]
fn test_cycle_closure_is_reported() {
    let tree = diff_tree(&ring(1, 1), &ring(2, 1), &[]).unwrap();
    assert_eq!(tree.num_diff, 1);

    let mut node = &tree;
    while let Some(child) = node.children.iter().find(|c| c.has_diff()) {
        node = child;
    }
    assert_eq!(node.via, Some(Via::Cycle));

    let out = diff(&ring(1, 1), &ring(2, 1), &[]).unwrap();
    assert!(out.starts_with("{Rc<Node>}*.next*:\n"), "{}", out);
    assert!(out.contains("<cycle>"), "{}", out);
}
