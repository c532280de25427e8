//! Nominal brand registry and subtype-aware casts.
//!
//! The registry is built once from the subtype edges a bundle declares and
//! is never mutated afterwards, so one instance can serve any number of
//! concurrent invocations.
//!
//! By default subtyping is a direct lookup in the declared edge list:
//! producers list every ancestor edge explicitly. [`Subtyping::Transitive`]
//! caches the closure of the edges instead.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::Subtyping;
use crate::types::{EvalError, Value};

/// Brand every value casts to.
pub const ANY_BRAND: &str = "Any";

#[derive(Debug, Clone)]
pub struct BrandRegistry {
    /// sub -> set of sup brands.
    supers: BTreeMap<String, BTreeSet<String>>,
    multi_brand_cast: bool,
}

impl BrandRegistry {
    /// Build a registry from `(sub, sup)` edges.
    pub fn new<I, S>(edges: I, subtyping: Subtyping, multi_brand_cast: bool) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut supers: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (sub, sup) in edges {
            supers.entry(sub.into()).or_default().insert(sup.into());
        }
        if subtyping == Subtyping::Transitive {
            supers = close(supers);
        }
        BrandRegistry {
            supers,
            multi_brand_cast,
        }
    }

    /// True iff `(sub, sup)` is a declared (or, in transitive mode,
    /// implied) edge. Not reflexive: `is_sub_brand(b, b)` needs an edge.
    pub fn is_sub_brand(&self, sub: &str, sup: &str) -> bool {
        self.supers
            .get(sub)
            .map(|sups| sups.contains(sup))
            .unwrap_or(false)
    }

    /// True iff a value of brand `brand` satisfies every target brand.
    pub fn brand_matches(&self, brand: &str, targets: &[String]) -> bool {
        targets
            .iter()
            .all(|t| t == ANY_BRAND || t == brand || self.is_sub_brand(brand, t))
    }

    /// Attempt to cast `v` to all of `targets`.
    ///
    /// Returns `Left(v)` on success and `Right(Unit)` otherwise. Unbranded
    /// values only cast to `Any`. More than one target brand is an
    /// `UnsupportedCast` error unless multi-brand casts are enabled.
    pub fn cast(&self, targets: &[String], v: &Value) -> Result<Value, EvalError> {
        if targets.len() != 1 && !self.multi_brand_cast {
            return Err(EvalError::UnsupportedCast {
                count: targets.len(),
            });
        }
        let ok = match v.brand() {
            Some(brand) => self.brand_matches(brand, targets),
            None => targets.iter().all(|t| t == ANY_BRAND),
        };
        if ok {
            Ok(Value::left(v.clone()))
        } else {
            Ok(Value::right(Value::Unit))
        }
    }

    /// Number of brands with at least one declared super-brand.
    pub fn len(&self) -> usize {
        self.supers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supers.is_empty()
    }
}

fn close(mut supers: BTreeMap<String, BTreeSet<String>>) -> BTreeMap<String, BTreeSet<String>> {
    loop {
        let mut changed = false;
        let snapshot = supers.clone();
        for sups in supers.values_mut() {
            let reachable: Vec<String> = sups
                .iter()
                .filter_map(|s| snapshot.get(s))
                .flat_map(|next| next.iter().cloned())
                .collect();
            for s in reachable {
                changed |= sups.insert(s);
            }
        }
        if !changed {
            return supers;
        }
    }
}
