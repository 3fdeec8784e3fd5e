//! Boolean set encoded as a map plus a default value.
//!
//! A positive slicer (`default == false`) stores the finite set of keys
//! that are `true`; a negative slicer (`default == true`) stores the
//! finite set of keys that are `false` (i.e. it encodes a complement).
//! Logical combination always picks the result default that keeps the
//! stored map smaller.

use crate::error::MatchError;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slicer<K: Ord + Clone> {
    map: BTreeMap<K, bool>,
    pub default: bool,
}

impl<K: Ord + Clone> Slicer<K> {
    pub fn new(default: bool) -> Self {
        Slicer {
            map: BTreeMap::new(),
            default,
        }
    }

    pub fn get(&self, key: &K) -> bool {
        self.map.get(key).copied().unwrap_or(self.default)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys()
    }

    /// Adds keys whose values differ from default, removes keys whose values equal default.
    pub fn update(&mut self, updates: BTreeMap<K, bool>) {
        for (k, v) in updates {
            if v == self.default {
                self.map.remove(&k);
            } else {
                self.map.insert(k, v);
            }
        }
    }

    fn combine(&self, other: &Self, op: impl Fn(bool, bool) -> bool) -> Self {
        let default = op(self.default, other.default);
        let mut map = BTreeMap::new();
        let keys: BTreeSet<&K> = self.map.keys().chain(other.map.keys()).collect();
        for k in keys {
            let v = op(self.get(k), other.get(k));
            if v != default {
                map.insert(k.clone(), v);
            }
        }
        Slicer { map, default }
    }

    pub fn and(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a && b)
    }

    pub fn or(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a || b)
    }

    pub fn not(&self) -> Self {
        Slicer {
            map: self.map.iter().map(|(k, v)| (k.clone(), !v)).collect(),
            default: !self.default,
        }
    }

    /// Set union; requires matching defaults.
    pub fn union(&self, other: &Self) -> Result<Self, MatchError> {
        if self.default != other.default {
            return Err(MatchError::Slicer(
                "union requires matching defaults".to_string(),
            ));
        }
        Ok(self.or(other))
    }

    /// Set intersection; requires matching defaults.
    pub fn intersection(&self, other: &Self) -> Result<Self, MatchError> {
        if self.default != other.default {
            return Err(MatchError::Slicer(
                "intersection requires matching defaults".to_string(),
            ));
        }
        Ok(self.and(other))
    }
}

impl<K: Ord + Clone> std::ops::BitAnd for &Slicer<K> {
    type Output = Slicer<K>;
    fn bitand(self, rhs: Self) -> Slicer<K> {
        self.and(rhs)
    }
}

impl<K: Ord + Clone> std::ops::BitOr for &Slicer<K> {
    type Output = Slicer<K>;
    fn bitor(self, rhs: Self) -> Slicer<K> {
        self.or(rhs)
    }
}

impl<K: Ord + Clone> std::ops::Not for &Slicer<K> {
    type Output = Slicer<K>;
    fn not(self) -> Slicer<K> {
        self.not()
    }
}
