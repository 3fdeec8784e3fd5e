//! Value-indexed map with a maintained reverse index and change log.
//!
//! A forward map plus a `value_cache` (value -> the [`Slicer`] of keys
//! currently holding it), and a `last_updated` set cleared only by `flush`.

use crate::error::MatchError;
use crate::slicer::Slicer;
use crate::value::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    Bool,
    Str,
    List,
}

fn kind_of(v: &Value) -> ValueKind {
    match v {
        Value::Int(_) => ValueKind::Int,
        Value::Float(_) => ValueKind::Float,
        Value::Bool(_) => ValueKind::Bool,
        Value::Str(_) => ValueKind::Str,
        Value::List(_) => ValueKind::List,
    }
}

pub struct Indexer<K: Ord + Clone> {
    forward: std::collections::BTreeMap<K, Value>,
    value_cache: Vec<(Value, Slicer<K>)>,
    last_updated: BTreeSet<K>,
    guard: Option<ValueKind>,
}

impl<K: Ord + Clone> Indexer<K> {
    pub fn new() -> Self {
        Indexer {
            forward: std::collections::BTreeMap::new(),
            value_cache: Vec::new(),
            last_updated: BTreeSet::new(),
            guard: None,
        }
    }

    pub fn with_guard(kind: ValueKind) -> Self {
        let mut idx = Self::new();
        idx.guard = Some(kind);
        idx
    }

    fn check(&self, v: &Value) -> Result<(), MatchError> {
        if let Some(kind) = self.guard {
            if kind_of(v) != kind {
                return Err(MatchError::Indexer(format!(
                    "value {v} does not match required type {kind:?}"
                )));
            }
        }
        Ok(())
    }

    fn cache_index(&self, v: &Value) -> Option<usize> {
        self.value_cache.iter().position(|(cv, _)| cv == v)
    }

    fn cache_slice_mut(&mut self, v: &Value) -> &mut Slicer<K> {
        if let Some(idx) = self.cache_index(v) {
            return &mut self.value_cache[idx].1;
        }
        self.value_cache.push((v.clone(), Slicer::new(false)));
        let last = self.value_cache.len() - 1;
        &mut self.value_cache[last].1
    }

    pub fn update(&mut self, key: K, value: Value) -> Result<(), MatchError> {
        self.check(&value)?;
        if let Some(old) = self.forward.get(&key).cloned() {
            if old == value {
                return Ok(());
            }
            self.cache_slice_mut(&old)
                .update(std::collections::BTreeMap::from([(key.clone(), false)]));
        }
        self.cache_slice_mut(&value)
            .update(std::collections::BTreeMap::from([(key.clone(), true)]));
        self.forward.insert(key.clone(), value);
        self.last_updated.insert(key);
        Ok(())
    }

    pub fn remove(&mut self, key: &K) {
        if let Some(old) = self.forward.remove(key) {
            self.cache_slice_mut(&old)
                .update(std::collections::BTreeMap::from([(key.clone(), false)]));
            self.last_updated.insert(key.clone());
        }
    }

    pub fn get(&self, key: &K) -> Option<&Value> {
        self.forward.get(key)
    }

    pub fn value_slicer(&self, value: &Value) -> Slicer<K> {
        self.cache_index(value).map_or_else(|| Slicer::new(false), |idx| self.value_cache[idx].1.clone())
    }

    pub fn last_updated(&self) -> &BTreeSet<K> {
        &self.last_updated
    }

    pub fn flush(&mut self) {
        self.last_updated.clear();
    }
}

impl<K: Ord + Clone> Default for Indexer<K> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct BooleanIndexer<K: Ord + Clone>(Indexer<K>);

impl<K: Ord + Clone> BooleanIndexer<K> {
    pub fn new() -> Self {
        BooleanIndexer(Indexer::with_guard(ValueKind::Bool))
    }

    pub fn update(&mut self, key: K, value: bool) -> Result<(), MatchError> {
        self.0.update(key, Value::Bool(value))
    }

    pub fn remove(&mut self, key: &K) {
        self.0.remove(key);
    }

    pub fn get(&self, key: &K) -> Option<bool> {
        self.0.get(key).map(|v| matches!(v, Value::Bool(true)))
    }

    pub fn value_slicer(&self, value: bool) -> Slicer<K> {
        self.0.value_slicer(&Value::Bool(value))
    }

    pub fn last_updated(&self) -> &BTreeSet<K> {
        self.0.last_updated()
    }

    pub fn flush(&mut self) {
        self.0.flush();
    }
}

impl<K: Ord + Clone> Default for BooleanIndexer<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coherence_after_updates() {
        let mut idx: Indexer<String> = Indexer::new();
        idx.update("a".into(), Value::Int(1)).unwrap();
        idx.update("b".into(), Value::Int(1)).unwrap();
        idx.update("c".into(), Value::Int(2)).unwrap();

        let s1 = idx.value_slicer(&Value::Int(1));
        assert!(s1.get(&"a".to_string()));
        assert!(s1.get(&"b".to_string()));
        assert!(!s1.get(&"c".to_string()));

        idx.update("a".into(), Value::Int(2)).unwrap();
        let s1 = idx.value_slicer(&Value::Int(1));
        let s2 = idx.value_slicer(&Value::Int(2));
        assert!(!s1.get(&"a".to_string()));
        assert!(s2.get(&"a".to_string()));

        assert_eq!(
            idx.last_updated().clone(),
            BTreeSet::from(["a".to_string(), "b".to_string(), "c".to_string()])
        );
        idx.flush();
        assert!(idx.last_updated().is_empty());
    }

    #[test]
    fn boolean_indexer_rejects_other_types() {
        let mut idx: Indexer<String> = Indexer::with_guard(ValueKind::Bool);
        assert!(idx.update("a".into(), Value::Int(1)).is_err());
        assert!(idx.update("a".into(), Value::Bool(true)).is_ok());
    }

    #[test]
    fn remove_updates_last_updated() {
        let mut idx: Indexer<String> = Indexer::new();
        idx.update("a".into(), Value::Int(1)).unwrap();
        idx.flush();
        idx.remove(&"a".to_string());
        assert_eq!(idx.last_updated().clone(), BTreeSet::from(["a".to_string()]));
        assert!(idx.get(&"a".to_string()).is_none());
    }
}
