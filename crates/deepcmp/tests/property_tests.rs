#![allow(clippy::unwrap_used, clippy::expect_used)]

use deepcmp::{diff, equal, is_less, sort_keys, Reflect};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn small_vec() -> impl Strategy<Value = Vec<i32>> {
    proptest::collection::vec(-3i32..3, 0..8)
}

fn small_map() -> impl Strategy<Value = BTreeMap<String, i32>> {
    proptest::collection::btree_map("[a-c]{1,2}", -2i32..2, 0..5)
}

proptest! {
    #[test]
    fn prop_equal_is_reflexive(v in small_vec(), m in small_map()) {
        prop_assert!(equal(&v, &v.clone(), &[]).unwrap());
        prop_assert!(equal(&m, &m.clone(), &[]).unwrap());
    }

    #[test]
    fn prop_equal_is_symmetric(a in small_vec(), b in small_vec()) {
        prop_assert_eq!(equal(&a, &b, &[]).unwrap(), equal(&b, &a, &[]).unwrap());
    }

    #[test]
    fn prop_equal_matches_partial_eq(a in small_vec(), b in small_vec(), m in small_map(), n in small_map()) {
        prop_assert_eq!(equal(&a, &b, &[]).unwrap(), a == b);
        prop_assert_eq!(equal(&m, &n, &[]).unwrap(), m == n);
    }

    #[test]
    fn prop_diff_is_empty_iff_equal(a in small_vec(), b in small_vec()) {
        let out = diff(&a, &b, &[]).unwrap();
        prop_assert_eq!(out.is_empty(), equal(&a, &b, &[]).unwrap());
    }

    #[test]
    fn prop_sort_keys_is_order_independent(keys in proptest::collection::vec(-5i64..5, 0..12)) {
        let forward: Vec<&dyn Reflect> = keys.iter().map(|k| k as &dyn Reflect).collect();
        let backward: Vec<&dyn Reflect> = keys.iter().rev().map(|k| k as &dyn Reflect).collect();
        let a: Vec<i64> = sort_keys(forward).iter().filter_map(|k| k.downcast_ref::<i64>().copied()).collect();
        let b: Vec<i64> = sort_keys(backward).iter().filter_map(|k| k.downcast_ref::<i64>().copied()).collect();
        prop_assert_eq!(&a, &b);

        let mut expected = keys.clone();
        expected.sort();
        expected.dedup();
        prop_assert_eq!(a, expected);
    }

    #[test]
    fn prop_is_less_is_a_strict_order(a in small_vec(), b in small_vec()) {
        prop_assert!(!(is_less(&a, &b) && is_less(&b, &a)));
        prop_assert!(!is_less(&a, &a));
    }
}
