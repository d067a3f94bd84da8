//! Abstract object lattice element for a whole-program static analyzer.
//!
//! Module layout:
//!   - value        — the Abstract Value contract and the `DemoValue`
//!                     reference lattice used by this crate's own tests
//!   - object_label — the Object Label contract and `BasicLabel`
//!   - scope_chain  — the Scope Chain contract and `LinkedScopeChain`
//!   - object       — `AbstractObject<V, S, P>`, the core of this crate
//!   - property_ref — `PropertyReference`
//!   - fragment     — `Fragment<N, C>`
//!   - array_index  — the pluggable array-index naming policy
//!   - options      — process-wide configuration (copy-on-write toggle)
//!   - errors       — `AnalysisInvariantViolation`
//!   - telemetry    — construction / make-writable counters

pub mod array_index;
pub mod errors;
pub mod fragment;
pub mod object;
pub mod object_label;
pub mod options;
pub mod property_ref;
pub mod scope_chain;
pub mod telemetry;
pub mod value;

pub use array_index::{JsArrayIndex, PropertyNamePolicy};
pub use errors::AnalysisInvariantViolation;
pub use fragment::Fragment;
pub use object::AbstractObject;
pub use object_label::{BasicLabel, ObjectLabel};
pub use options::Options;
pub use property_ref::PropertyReference;
pub use scope_chain::{LinkedScopeChain, ScopeChain, ScopeRenameCache};
pub use value::{AbstractValue, DemoValue, Summarized};
