//! Shared fixtures for the integration tests.

use deepcmp::{reflect_struct, Kind, MapView, Reflect, SeqView, Type, View};
use std::any::Any;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Module that declares the fixture structs, for module-wide visibility grants.
#[allow(dead_code)]
pub const FIXTURE_MODULE: &str = module_path!();

#[derive(Debug, Clone, Default)]
pub struct Person {
    pub name: String,
    pub age: u32,
    pub tags: Vec<String>,
}

reflect_struct!(Person { pub name, pub age, pub tags });

#[allow(dead_code)]
pub fn person(name: &str, age: u32) -> Person {
    Person {
        name: name.to_string(),
        age,
        tags: Vec::new(),
    }
}

/// Struct with a private field.
#[derive(Debug, Clone)]
pub struct Secret {
    pub id: u32,
    value: i64,
}

reflect_struct!(Secret { pub id, value });

#[allow(dead_code)]
impl Secret {
    pub fn new(id: u32, value: i64) -> Self {
        Self { id, value }
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}

/// Struct whose `PartialEq` is its equality method; ignores `note`.
#[derive(Debug, Clone)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub note: String,
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

reflect_struct!(#[equal] Version { pub major, pub minor, pub note });

/// Singly linked node that can point back at itself.
pub struct Node {
    pub value: i32,
    pub next: OnceCell<Rc<Node>>,
}

reflect_struct!(Node { pub value, pub next });

#[allow(dead_code)]
pub fn node(value: i32) -> Rc<Node> {
    Rc::new(Node {
        value,
        next: OnceCell::new(),
    })
}

#[allow(dead_code)]
pub fn link(from: &Rc<Node>, to: &Rc<Node>) {
    let _ = from.next.set(Rc::clone(to));
}

/// Ring of `len` nodes all holding `value`.
#[allow(dead_code)]
pub fn ring(len: usize, value: i32) -> Rc<Node> {
    let nodes: Vec<Rc<Node>> = (0..len).map(|_| node(value)).collect();
    for i in 0..len {
        link(&nodes[i], &nodes[(i + 1) % len]);
    }
    Rc::clone(&nodes[0])
}

/// Map keyed by floats, looked up by IEEE equality so NaN keys are
/// unreachable.
pub struct FloatMap(pub Vec<(f64, i32)>);

impl Reflect for FloatMap {
    fn static_type() -> Type {
        Type::of::<FloatMap>(Kind::Map)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Map(self)
    }
}

impl MapView for FloatMap {
    fn len(&self) -> usize {
        self.0.len()
    }
    fn keys(&self) -> Vec<&dyn Reflect> {
        self.0.iter().map(|(k, _)| k as &dyn Reflect).collect()
    }
    fn get(&self, key: &dyn Reflect) -> Option<&dyn Reflect> {
        let key = key.downcast_ref::<f64>()?;
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v as &dyn Reflect)
    }
}

/// List that tells an unset value (`None`) apart from an empty one.
#[allow(dead_code)]
pub struct NilableList(pub Option<Vec<i32>>);

impl Reflect for NilableList {
    fn static_type() -> Type {
        Type::of::<NilableList>(Kind::Slice)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Seq(self)
    }
}

impl SeqView for NilableList {
    fn len(&self) -> usize {
        self.0.as_ref().map_or(0, Vec::len)
    }
    fn index(&self, i: usize) -> Option<&dyn Reflect> {
        self.0.as_ref()?.get(i).map(|v| v as &dyn Reflect)
    }
    fn is_nil(&self) -> bool {
        self.0.is_none()
    }
}

/// Map that tells an unset value (`None`) apart from an empty one.
#[allow(dead_code)]
pub struct NilableTable(pub Option<BTreeMap<String, i32>>);

impl Reflect for NilableTable {
    fn static_type() -> Type {
        Type::of::<NilableTable>(Kind::Map)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Map(self)
    }
}

impl MapView for NilableTable {
    fn len(&self) -> usize {
        self.0.as_ref().map_or(0, BTreeMap::len)
    }
    fn keys(&self) -> Vec<&dyn Reflect> {
        self.0
            .iter()
            .flat_map(|m| m.keys())
            .map(|k| k as &dyn Reflect)
            .collect()
    }
    fn get(&self, key: &dyn Reflect) -> Option<&dyn Reflect> {
        let key = key.downcast_ref::<String>()?;
        self.0.as_ref()?.get(key).map(|v| v as &dyn Reflect)
    }
    fn is_nil(&self) -> bool {
        self.0.is_none()
    }
}

#[allow(dead_code)]
pub fn table(entries: &[(&str, i32)]) -> NilableTable {
    NilableTable(Some(
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
    ))
}
