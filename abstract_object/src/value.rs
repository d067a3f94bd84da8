//! The Abstract Value contract: a pure, immutable lattice
//! element for a single slot. This crate never constructs or interprets a
//! `Value` beyond the operations below — the value domain itself is always
//! supplied by the host analyzer.

use std::fmt::Debug;
use std::hash::Hash;

use crate::object_label::ObjectLabel;

/// Classifies an object label as still-singleton or promoted to a summary,
/// as decided by whatever drove a [`AbstractValue::summarize`] call (e.g. a
/// call-context or allocation-site abstraction transitioning shape).
pub trait Summarized<L: ObjectLabel> {
    fn is_summary(&self, label: &L) -> bool;
}

/// Lattice element for a single object slot (an ordinary property, a
/// default, or an internal slot).
///
/// Implementors must be immutable and structurally hashable/equatable:
/// `a == b` must imply `hash(a) == hash(b)`, and no method below may be
/// observed to mutate `self` through shared references.
pub trait AbstractValue: Clone + Eq + Hash + Debug {
    type Label: ObjectLabel;

    /// Top of the lattice.
    fn make_unknown() -> Self;
    /// Bottom of the lattice.
    fn make_none() -> Self;
    /// A definitely-absent, definitely-modified value — the default shape
    /// produced by [`crate::object::AbstractObject::make_absent_modified`].
    fn make_absent_modified() -> Self;

    fn is_unknown(&self) -> bool;
    fn is_none(&self) -> bool;

    fn is_maybe_present(&self) -> bool;
    fn is_maybe_absent(&self) -> bool;
    fn is_maybe_present_or_unknown(&self) -> bool;

    fn is_maybe_modified(&self) -> bool;
    /// Returns a copy of `self` with the modified bit cleared.
    fn restrict_to_not_modified(&self) -> Self;

    /// Least upper bound with `other`.
    fn join(&self, other: &Self) -> Self;
    /// Convergence-accelerated upper bound, used on lattice dimensions with
    /// infinite ascending chains.
    fn widen(&self, other: &Self) -> Self;

    /// Rewrites embedded object labels per `witness`'s singleton/summary
    /// classification. Must preserve the modified bit.
    fn summarize(&self, witness: &dyn Summarized<Self::Label>) -> Self;
    fn replace_object_label(&self, old: &Self::Label, new: &Self::Label) -> Self;
    fn replace_object_labels(
        &self,
        rename: &std::collections::HashMap<Self::Label, Self::Label>,
    ) -> Self;

    /// Reduces `self` to the part not already covered by `reference`'s
    /// polymorphic facets.
    fn trim(&self, reference: &Self) -> Self;
    /// `self` is assumed to subsume `reference`; returns the difference.
    fn remove(&self, reference: &Self) -> Self;

    fn object_labels(&self) -> std::collections::HashSet<Self::Label>;

    /// Human-readable delta against `old`, appended to `out`. No-op when
    /// there is no observable difference.
    fn diff(&self, old: &Self, out: &mut String);

    fn render(&self) -> String;
}

/// Minimal concrete [`AbstractValue`] used by this crate's own tests and
/// doctests. Deliberately small: a single optional primitive facet, a
/// presence facet, a modified bit, and a set of referenced labels. Not a
/// recommendation for how a production JS value lattice should be shaped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Presence {
    Absent,
    Present,
    MaybeEither,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DemoValue {
    pub unknown: bool,
    pub presence: Option<Presence>,
    pub number: Option<i64>,
    pub modified: bool,
    pub labels: std::collections::BTreeSet<crate::object_label::BasicLabel>,
}

impl DemoValue {
    pub fn concrete_number(n: i64) -> Self {
        DemoValue {
            unknown: false,
            presence: Some(Presence::Present),
            number: Some(n),
            modified: false,
            labels: Default::default(),
        }
    }

    pub fn with_label(label: crate::object_label::BasicLabel) -> Self {
        let mut labels = std::collections::BTreeSet::new();
        labels.insert(label);
        DemoValue {
            unknown: false,
            presence: Some(Presence::Present),
            number: None,
            modified: false,
            labels,
        }
    }

    pub fn modified(mut self) -> Self {
        self.modified = true;
        self
    }

    fn presence_or_absent(&self) -> &Presence {
        self.presence.as_ref().unwrap_or(&Presence::Absent)
    }
}

impl AbstractValue for DemoValue {
    type Label = crate::object_label::BasicLabel;

    fn make_unknown() -> Self {
        DemoValue {
            unknown: true,
            presence: Some(Presence::MaybeEither),
            number: None,
            modified: true,
            labels: Default::default(),
        }
    }

    fn make_none() -> Self {
        DemoValue {
            unknown: false,
            presence: None,
            number: None,
            modified: false,
            labels: Default::default(),
        }
    }

    fn make_absent_modified() -> Self {
        DemoValue {
            unknown: false,
            presence: Some(Presence::Absent),
            number: None,
            modified: true,
            labels: Default::default(),
        }
    }

    fn is_unknown(&self) -> bool {
        self.unknown
    }

    fn is_none(&self) -> bool {
        !self.unknown && self.presence.is_none() && self.number.is_none() && self.labels.is_empty()
    }

    fn is_maybe_present(&self) -> bool {
        self.unknown || matches!(self.presence_or_absent(), Presence::Present | Presence::MaybeEither)
    }

    fn is_maybe_absent(&self) -> bool {
        self.unknown || matches!(self.presence_or_absent(), Presence::Absent | Presence::MaybeEither)
    }

    fn is_maybe_present_or_unknown(&self) -> bool {
        self.unknown || self.is_maybe_present()
    }

    fn is_maybe_modified(&self) -> bool {
        self.modified
    }

    fn restrict_to_not_modified(&self) -> Self {
        let mut v = self.clone();
        v.modified = false;
        v
    }

    fn join(&self, other: &Self) -> Self {
        if self.is_none() {
            return other.clone();
        }
        if other.is_none() {
            return self.clone();
        }
        let presence = match (self.presence_or_absent(), other.presence_or_absent()) {
            (a, b) if a == b => a.clone(),
            _ => Presence::MaybeEither,
        };
        let number = match (self.number, other.number) {
            (Some(a), Some(b)) if a == b => Some(a),
            _ => None,
        };
        DemoValue {
            unknown: self.unknown || other.unknown,
            presence: Some(presence),
            number,
            modified: self.modified || other.modified,
            labels: self.labels.union(&other.labels).cloned().collect(),
        }
    }

    fn widen(&self, other: &Self) -> Self {
        // No infinite ascending chain in this toy domain beyond the number
        // facet; collapse disagreeing numbers immediately rather than
        // joining repeatedly.
        let mut v = self.join(other);
        if self.number != other.number {
            v.number = None;
        }
        v
    }

    fn summarize(&self, witness: &dyn Summarized<Self::Label>) -> Self {
        // DemoValue's labels are opaque identifiers; summarization here is
        // the identity (a real value lattice would fold summary-labeled
        // entries together). The modified bit is untouched either way.
        let _ = witness;
        self.clone()
    }

    fn replace_object_label(&self, old: &Self::Label, new: &Self::Label) -> Self {
        let mut v = self.clone();
        if v.labels.remove(old) {
            v.labels.insert(new.clone());
        }
        v
    }

    fn replace_object_labels(
        &self,
        rename: &std::collections::HashMap<Self::Label, Self::Label>,
    ) -> Self {
        let mut v = self.clone();
        v.labels = v
            .labels
            .iter()
            .map(|l| rename.get(l).cloned().unwrap_or_else(|| l.clone()))
            .collect();
        v
    }

    fn trim(&self, reference: &Self) -> Self {
        if reference.unknown {
            return Self::make_unknown();
        }
        self.clone()
    }

    fn remove(&self, reference: &Self) -> Self {
        if self == reference {
            return Self::make_none();
        }
        self.clone()
    }

    fn object_labels(&self) -> std::collections::HashSet<Self::Label> {
        if self.unknown {
            return Default::default();
        }
        self.labels.iter().cloned().collect()
    }

    fn diff(&self, old: &Self, out: &mut String) {
        if self != old {
            out.push_str(&format!("{} -> {}", old.render(), self.render()));
        }
    }

    fn render(&self) -> String {
        if self.unknown {
            return "unknown".to_string();
        }
        if self.is_none() {
            return "none".to_string();
        }
        let presence = match self.presence_or_absent() {
            Presence::Absent => "absent",
            Presence::Present => "present",
            Presence::MaybeEither => "maybe",
        };
        format!(
            "{{{}{}{}}}",
            presence,
            self.number.map(|n| format!(" num={n}")).unwrap_or_default(),
            if self.modified { " modified" } else { "" }
        )
    }
}
