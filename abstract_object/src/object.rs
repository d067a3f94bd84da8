//! The Abstract Object — the core of this crate.
//!
//! A lattice element for one heap object: a property mapping plus two
//! default values, two internal slots, and a scope chain, all sharing a
//! single copy-on-write discipline over the property mapping.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::array_index::PropertyNamePolicy;
use crate::errors::{AnalysisInvariantViolation, Result};
use crate::options::Options;
use crate::property_ref::PropertyReference;
use crate::scope_chain::{ScopeChain, ScopeRenameCache};
use crate::telemetry;
use crate::value::{AbstractValue, Summarized};

/// A lattice element representing a sound over-approximation of the heap
/// objects that may occupy one object label at a given program point.
///
/// Generic over the value lattice `V`, the scope-chain representation `S`,
/// and the array-index naming policy `P`; `V` and `S` must agree on which
/// object-label type they reference.
#[derive(Clone)]
pub struct AbstractObject<V, S, P = crate::array_index::JsArrayIndex>
where
    V: AbstractValue,
    S: ScopeChain<Label = V::Label>,
    P: PropertyNamePolicy,
{
    properties: Rc<HashMap<String, V>>,
    writable_properties: Cell<bool>,
    default_array: V,
    default_non_array: V,
    internal_prototype: V,
    internal_value: V,
    scope: Option<S>,
    scope_unknown: bool,
    _policy: PhantomData<P>,
}

impl<V, S, P> fmt::Debug for AbstractObject<V, S, P>
where
    V: AbstractValue,
    S: ScopeChain<Label = V::Label>,
    P: PropertyNamePolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl<V, S, P> PartialEq for AbstractObject<V, S, P>
where
    V: AbstractValue,
    S: ScopeChain<Label = V::Label>,
    P: PropertyNamePolicy,
{
    fn eq(&self, other: &Self) -> bool {
        self.default_array == other.default_array
            && self.default_non_array == other.default_non_array
            && self.internal_prototype == other.internal_prototype
            && self.internal_value == other.internal_value
            && self.scope_unknown == other.scope_unknown
            && self.scope == other.scope
            && *self.properties == *other.properties
    }
}

impl<V, S, P> Eq for AbstractObject<V, S, P>
where
    V: AbstractValue,
    S: ScopeChain<Label = V::Label>,
    P: PropertyNamePolicy,
{
}

impl<V, S, P> std::hash::Hash for AbstractObject<V, S, P>
where
    V: AbstractValue,
    S: ScopeChain<Label = V::Label>,
    P: PropertyNamePolicy,
{
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Property order must not affect the hash, so combine per-entry
        // hashes with a commutative operator instead of hashing the map
        // in iteration order.
        let mut combined: u64 = 0;
        for (k, v) in self.properties.iter() {
            let mut h = std::collections::hash_map::DefaultHasher::new();
            (k, v).hash(&mut h);
            combined ^= std::hash::Hasher::finish(&h);
        }
        combined.hash(state);
        self.default_array.hash(state);
        self.default_non_array.hash(state);
        self.internal_prototype.hash(state);
        self.internal_value.hash(state);
        self.scope.hash(state);
        self.scope_unknown.hash(state);
    }
}

impl<V, S, P> AbstractObject<V, S, P>
where
    V: AbstractValue,
    S: ScopeChain<Label = V::Label>,
    P: PropertyNamePolicy,
{
    // ---- construction and copy-on-write ---------------------------------

    pub fn make_absent_modified() -> Self {
        telemetry::note_object_constructed();
        AbstractObject {
            properties: Rc::new(HashMap::new()),
            writable_properties: Cell::new(true),
            default_array: V::make_absent_modified(),
            default_non_array: V::make_absent_modified(),
            internal_prototype: V::make_absent_modified(),
            internal_value: V::make_absent_modified(),
            scope: None,
            scope_unknown: false,
            _policy: PhantomData,
        }
    }

    pub fn make_none() -> Self {
        telemetry::note_object_constructed();
        AbstractObject {
            properties: Rc::new(HashMap::new()),
            writable_properties: Cell::new(true),
            default_array: V::make_none(),
            default_non_array: V::make_none(),
            internal_prototype: V::make_none(),
            internal_value: V::make_none(),
            scope: None,
            scope_unknown: false,
            _policy: PhantomData,
        }
    }

    pub fn make_unknown() -> Self {
        telemetry::note_object_constructed();
        AbstractObject {
            properties: Rc::new(HashMap::new()),
            writable_properties: Cell::new(true),
            default_array: V::make_unknown(),
            default_non_array: V::make_unknown(),
            internal_prototype: V::make_unknown(),
            internal_value: V::make_unknown(),
            scope: None,
            scope_unknown: true,
            _policy: PhantomData,
        }
    }

    /// Copy constructor. Under copy-on-write (the default), the new object
    /// shares `properties` with `self` until either side next mutates it.
    pub fn copy(&self, options: &Options) -> Self {
        telemetry::note_object_constructed();
        if options.copy_on_write_disabled {
            self.writable_properties.set(true);
            let mut out = self.clone();
            out.properties = Rc::new((*self.properties).clone());
            out.writable_properties = Cell::new(true);
            return out;
        }
        // Both source and destination relinquish exclusive ownership; the
        // next mutator on either side pays for its own private copy.
        self.writable_properties.set(false);
        let out = self.clone();
        out.writable_properties.set(false);
        out
    }

    fn make_writable(&mut self) {
        if self.writable_properties.get() {
            return;
        }
        telemetry::note_make_writable();
        self.properties = Rc::new((*self.properties).clone());
        self.writable_properties.set(true);
    }

    // ---- property access -------------------------------------------------

    pub fn get_property(&self, name: &str) -> V {
        if let Some(v) = self.properties.get(name) {
            return v.clone();
        }
        if P::is_array_index(name) {
            self.default_array.clone()
        } else {
            self.default_non_array.clone()
        }
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: V) {
        self.make_writable();
        Rc::get_mut(&mut self.properties)
            .expect("make_writable just ensured unique ownership")
            .insert(name.into(), value);
    }

    pub fn set_default_array_property(&mut self, value: V) -> Result<()> {
        Self::check_default_invariant("default_array", &value)?;
        self.default_array = value;
        Ok(())
    }

    pub fn set_default_non_array_property(&mut self, value: V) -> Result<()> {
        Self::check_default_invariant("default_non_array", &value)?;
        self.default_non_array = value;
        Ok(())
    }

    fn check_default_invariant(which: &'static str, value: &V) -> Result<()> {
        let ok = value.is_unknown() || !value.is_maybe_present() || value.is_maybe_absent();
        if ok {
            Ok(())
        } else {
            Err(AnalysisInvariantViolation::new(
                which,
                "a default property value must be unknown, or not maybe-present, or maybe-absent",
            ))
        }
    }

    pub fn get_value(&self, reference: &PropertyReference) -> Result<V> {
        match reference {
            PropertyReference::Ordinary(name) => Ok(self.get_property(name)),
            PropertyReference::DefaultArray => Ok(self.default_array.clone()),
            PropertyReference::DefaultNonArray => Ok(self.default_non_array.clone()),
            PropertyReference::InternalValue => Ok(self.internal_value.clone()),
            PropertyReference::InternalPrototype => Ok(self.internal_prototype.clone()),
        }
    }

    pub fn set_value(&mut self, reference: &PropertyReference, value: V) -> Result<()> {
        match reference {
            PropertyReference::Ordinary(name) => {
                self.set_property(name.clone(), value);
                Ok(())
            }
            PropertyReference::DefaultArray => self.set_default_array_property(value),
            PropertyReference::DefaultNonArray => self.set_default_non_array_property(value),
            PropertyReference::InternalValue => {
                self.internal_value = value;
                Ok(())
            }
            PropertyReference::InternalPrototype => {
                self.internal_prototype = value;
                Ok(())
            }
        }
    }

    // ---- lattice predicates -----------------------------------------------

    pub fn is_none(&self) -> bool {
        self.properties.values().all(|v| v.is_none())
            && self.default_array.is_none()
            && self.default_non_array.is_none()
            && self.internal_prototype.is_none()
            && self.internal_value.is_none()
            && self.scope.is_none()
            && !self.scope_unknown
    }

    pub fn is_unknown(&self) -> bool {
        self.properties.values().all(|v| v.is_unknown())
            && self.default_array.is_unknown()
            && self.default_non_array.is_unknown()
            && self.internal_prototype.is_unknown()
            && self.internal_value.is_unknown()
            && self.scope_unknown
    }

    pub fn is_some_non_array_property_unknown(&self) -> bool {
        if self.default_non_array.is_unknown() {
            return true;
        }
        self.properties
            .iter()
            .any(|(name, v)| !P::is_array_index(name) && v.is_unknown())
    }

    // ---- summarization ----------------------------------------------------

    pub fn summarize(&self, witness: &dyn Summarized<V::Label>) -> Self {
        telemetry::note_object_constructed();
        let properties: HashMap<String, V> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.summarize(witness)))
            .collect();
        AbstractObject {
            properties: Rc::new(properties),
            writable_properties: Cell::new(true),
            default_array: self.default_array.summarize(witness),
            default_non_array: self.default_non_array.summarize(witness),
            internal_prototype: self.internal_prototype.summarize(witness),
            internal_value: self.internal_value.summarize(witness),
            scope: self.scope.as_ref().map(|s| s.summarize(witness)),
            scope_unknown: self.scope_unknown,
            _policy: PhantomData,
        }
    }

    // ---- trim / remove -----------------------------------------------------

    pub fn trim(&self, reference: &Self) -> Self {
        telemetry::note_object_constructed();
        let properties: HashMap<String, V> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.trim(&reference.get_property(k))))
            .collect();
        let (scope, scope_unknown) = if reference.scope_unknown {
            (None, true)
        } else {
            (self.scope.clone(), self.scope_unknown)
        };
        AbstractObject {
            properties: Rc::new(properties),
            writable_properties: Cell::new(true),
            default_array: self.default_array.trim(&reference.default_array),
            default_non_array: self.default_non_array.trim(&reference.default_non_array),
            internal_prototype: self.internal_prototype.trim(&reference.internal_prototype),
            internal_value: self.internal_value.trim(&reference.internal_value),
            scope,
            scope_unknown,
            _policy: PhantomData,
        }
    }

    pub fn remove(&self, reference: &Self) -> Self {
        telemetry::note_object_constructed();
        let properties: HashMap<String, V> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.remove(&reference.get_property(k))))
            .collect();
        let scope = match (&self.scope, &reference.scope) {
            (Some(mine), Some(theirs)) => Some(mine.remove(theirs)),
            (mine, _) => mine.clone(),
        };
        AbstractObject {
            properties: Rc::new(properties),
            writable_properties: Cell::new(true),
            default_array: self.default_array.remove(&reference.default_array),
            default_non_array: self.default_non_array.remove(&reference.default_non_array),
            internal_prototype: self.internal_prototype.remove(&reference.internal_prototype),
            internal_value: self.internal_value.remove(&reference.internal_value),
            scope,
            scope_unknown: self.scope_unknown,
            _policy: PhantomData,
        }
    }

    // ---- replace-non-modified (the demand-driven merge) --------------------

    pub fn replace_non_modified_parts(&self, other: &Self) -> Self {
        telemetry::note_object_constructed();
        let mut result: HashMap<String, V> = HashMap::new();

        for (k, v) in self.properties.iter() {
            if v.is_maybe_modified() {
                result.insert(k.clone(), v.clone());
            } else if let Some(replacement) = other.properties.get(k) {
                result.insert(k.clone(), replacement.clone());
            }
            // else: falls back to other's default, handled below.
        }

        let array_default_clean = !self.default_array.is_maybe_modified();
        let non_array_default_clean = !self.default_non_array.is_maybe_modified();

        if array_default_clean || non_array_default_clean {
            for (k, v) in other.properties.iter() {
                if result.contains_key(k) {
                    continue;
                }
                let is_array = P::is_array_index(k);
                if (is_array && array_default_clean) || (!is_array && non_array_default_clean) {
                    result.insert(k.clone(), v.clone());
                }
            }
        }

        let default_array = if array_default_clean {
            other.default_array.clone()
        } else {
            self.default_array.clone()
        };
        let default_non_array = if non_array_default_clean {
            other.default_non_array.clone()
        } else {
            self.default_non_array.clone()
        };
        let internal_prototype = if self.internal_prototype.is_maybe_modified() {
            self.internal_prototype.clone()
        } else {
            other.internal_prototype.clone()
        };
        let internal_value = if self.internal_value.is_maybe_modified() {
            self.internal_value.clone()
        } else {
            other.internal_value.clone()
        };
        let (scope, scope_unknown) = if self.scope_unknown && !other.scope_unknown {
            (other.scope.clone(), false)
        } else {
            (self.scope.clone(), self.scope_unknown)
        };

        AbstractObject {
            properties: Rc::new(result),
            writable_properties: Cell::new(true),
            default_array,
            default_non_array,
            internal_prototype,
            internal_value,
            scope,
            scope_unknown,
            _policy: PhantomData,
        }
    }

    // ---- clear-modified -----------------------------------------------------

    pub fn clear_modified(&self) -> Self {
        telemetry::note_object_constructed();
        let properties: HashMap<String, V> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.restrict_to_not_modified()))
            .collect();
        AbstractObject {
            properties: Rc::new(properties),
            writable_properties: Cell::new(true),
            default_array: self.default_array.restrict_to_not_modified(),
            default_non_array: self.default_non_array.restrict_to_not_modified(),
            internal_prototype: self.internal_prototype.restrict_to_not_modified(),
            internal_value: self.internal_value.restrict_to_not_modified(),
            scope: self.scope.clone(),
            scope_unknown: self.scope_unknown,
            _policy: PhantomData,
        }
    }

    // ---- object-label rewriting ----------------------------------------------

    pub fn replace_object_label(&self, old: &V::Label, new: &V::Label) -> Self {
        telemetry::note_object_constructed();
        let properties: HashMap<String, V> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.replace_object_label(old, new)))
            .collect();
        AbstractObject {
            properties: Rc::new(properties),
            writable_properties: Cell::new(true),
            default_array: self.default_array.replace_object_label(old, new),
            default_non_array: self.default_non_array.replace_object_label(old, new),
            internal_prototype: self.internal_prototype.replace_object_label(old, new),
            internal_value: self.internal_value.replace_object_label(old, new),
            scope: self.scope.as_ref().map(|s| s.replace_object_label(old, new)),
            scope_unknown: self.scope_unknown,
            _policy: PhantomData,
        }
    }

    pub fn replace_object_labels(
        &self,
        rename: &HashMap<V::Label, V::Label>,
        cache: &mut ScopeRenameCache<S>,
    ) -> Self {
        telemetry::note_object_constructed();
        let properties: HashMap<String, V> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.replace_object_labels(rename)))
            .collect();
        AbstractObject {
            properties: Rc::new(properties),
            writable_properties: Cell::new(true),
            default_array: self.default_array.replace_object_labels(rename),
            default_non_array: self.default_non_array.replace_object_labels(rename),
            internal_prototype: self.internal_prototype.replace_object_labels(rename),
            internal_value: self.internal_value.replace_object_labels(rename),
            scope: self
                .scope
                .as_ref()
                .map(|s| s.replace_object_labels(rename, cache)),
            scope_unknown: self.scope_unknown,
            _policy: PhantomData,
        }
    }

    // ---- diff / toString / printModified ---------------------------------

    fn sorted_names(&self) -> Vec<&String> {
        let mut names: Vec<&String> = self.properties.keys().collect();
        names.sort();
        names
    }

    pub fn diff(&self, old: &Self, out: &mut String) {
        for name in self.sorted_names() {
            let mine = &self.properties[name];
            let before = old.get_property(name);
            mine.diff(&before, out);
        }
        if self.default_array != old.default_array {
            out.push_str("default_array changed\n");
        }
        if self.default_non_array != old.default_non_array {
            out.push_str("default_non_array changed\n");
        }
    }

    pub fn render(&self) -> String {
        let mut parts = Vec::new();
        for name in self.sorted_names() {
            parts.push(format!("{:?}: {}", name, self.properties[name].render()));
        }
        parts.push(format!("[[DefaultArray]]: {}", self.default_array.render()));
        parts.push(format!(
            "[[DefaultNonArray]]: {}",
            self.default_non_array.render()
        ));
        parts.push(format!(
            "[[Prototype]]: {}",
            self.internal_prototype.render()
        ));
        parts.push(format!("[[Value]]: {}", self.internal_value.render()));
        format!("{{{}}}", parts.join(", "))
    }

    pub fn print_modified(&self) -> String {
        let mut parts = Vec::new();
        for name in self.sorted_names() {
            let v = &self.properties[name];
            if v.is_maybe_modified() && v.is_maybe_present_or_unknown() {
                parts.push(format!("{}: {}", name, v.render()));
            }
        }
        parts.join(", ")
    }

    // ---- getAllObjectLabels ------------------------------------------------

    pub fn get_all_object_labels(&self) -> HashSet<V::Label> {
        let mut labels = HashSet::new();
        for v in self.properties.values() {
            labels.extend(v.object_labels());
        }
        labels.extend(self.default_array.object_labels());
        labels.extend(self.default_non_array.object_labels());
        labels.extend(self.internal_prototype.object_labels());
        labels.extend(self.internal_value.object_labels());
        if let Some(scope) = &self.scope {
            labels.extend(scope.object_labels());
        }
        labels
    }

    // ---- scope-slot state machine ------------------------------------------

    pub fn get_scope_chain(&self) -> Result<Option<&S>> {
        if self.scope_unknown {
            return Err(AnalysisInvariantViolation::new(
                "scope_unknown",
                "cannot read the scope chain while it is in the Unknown state",
            ));
        }
        Ok(self.scope.as_ref())
    }

    pub fn set_scope_chain(&mut self, scope: Option<S>) {
        self.scope = scope;
        self.scope_unknown = false;
    }

    /// Returns `Ok(true)` iff the stored chain changed.
    pub fn add_to_scope_chain(&mut self, addition: &S) -> Result<bool> {
        if self.scope_unknown {
            return Err(AnalysisInvariantViolation::new(
                "scope_unknown",
                "cannot extend the scope chain while it is in the Unknown state",
            ));
        }
        match &self.scope {
            None => {
                self.scope = Some(addition.clone());
                Ok(true)
            }
            Some(current) => match current.add(addition) {
                Some(grown) => {
                    self.scope = Some(grown);
                    Ok(true)
                }
                None => Ok(false),
            },
        }
    }

    // ---- lattice operator: join / widen ------------------------------------

    fn merge_slots(a: &V, b: &V, widen: bool) -> V {
        if widen {
            a.widen(b)
        } else {
            a.join(b)
        }
    }

    fn merge(&self, other: &Self, widen: bool) -> Self {
        telemetry::note_object_constructed();
        let mut names: HashSet<&String> = self.properties.keys().collect();
        names.extend(other.properties.keys());

        let default_array = Self::merge_slots(&self.default_array, &other.default_array, widen);
        let default_non_array =
            Self::merge_slots(&self.default_non_array, &other.default_non_array, widen);

        let mut properties = HashMap::new();
        for name in names {
            let mine = self.get_property(name);
            let theirs = other.get_property(name);
            let merged = Self::merge_slots(&mine, &theirs, widen);
            let applicable_default = if P::is_array_index(name) {
                &default_array
            } else {
                &default_non_array
            };
            if merged != *applicable_default {
                properties.insert(name.clone(), merged);
            }
        }

        let scope = match (&self.scope, &other.scope, self.scope_unknown, other.scope_unknown) {
            (_, _, true, _) | (_, _, _, true) => None,
            (Some(mine), Some(theirs), false, false) => mine.add(theirs).or_else(|| Some(mine.clone())),
            (Some(mine), None, false, false) => Some(mine.clone()),
            (None, Some(theirs), false, false) => Some(theirs.clone()),
            (None, None, false, false) => None,
        };
        let scope_unknown = self.scope_unknown || other.scope_unknown;

        AbstractObject {
            properties: Rc::new(properties),
            writable_properties: Cell::new(true),
            default_array,
            default_non_array,
            internal_prototype: Self::merge_slots(
                &self.internal_prototype,
                &other.internal_prototype,
                widen,
            ),
            internal_value: Self::merge_slots(&self.internal_value, &other.internal_value, widen),
            scope,
            scope_unknown,
            _policy: PhantomData,
        }
    }

    pub fn join(&self, other: &Self) -> Self {
        self.merge(other, false)
    }

    pub fn widen(&self, other: &Self) -> Self {
        self.merge(other, true)
    }

    pub fn subsumes(&self, other: &Self) -> bool {
        self.join(other) == *self
    }
}

impl<V, S, P> fmt::Display for AbstractObject<V, S, P>
where
    V: AbstractValue,
    S: ScopeChain<Label = V::Label>,
    P: PropertyNamePolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
