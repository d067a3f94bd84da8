//! Black-box end-to-end scenarios against the public API only.

use abstract_object::{
    AbstractObject, AbstractValue, BasicLabel, DemoValue, LinkedScopeChain, Options,
    PropertyReference,
};

type Obj = AbstractObject<DemoValue, LinkedScopeChain<BasicLabel>>;

fn label(n: u32) -> BasicLabel {
    BasicLabel::new(n, 0)
}

#[test]
fn default_fallback_splits_array_and_non_array() {
    let mut o = Obj::make_absent_modified();
    let length = DemoValue::concrete_number(3).modified();
    o.set_property("length", length.clone());

    assert_eq!(o.get_property("length"), length);
    assert_eq!(o.get_property("x"), DemoValue::make_absent_modified());
    assert_eq!(o.get_property("0"), DemoValue::make_absent_modified());
}

#[test]
fn copy_on_write_isolates_sibling_writes() {
    abstract_object::telemetry::reset();
    let options = Options::new();

    let a = Obj::make_none();
    let mut b = a.copy(&options);

    let v1 = DemoValue::concrete_number(1);
    let v2 = DemoValue::concrete_number(2);

    b.set_property("p", v1);
    assert_eq!(abstract_object::telemetry::make_writable_calls(), 1);

    b.set_property("p", v2.clone());
    assert_eq!(abstract_object::telemetry::make_writable_calls(), 1);

    assert_eq!(a.get_property("p"), DemoValue::make_none());
    assert_eq!(b.get_property("p"), v2);
}

#[test]
fn replace_non_modified_parts_keeps_modified_and_adopts_clean_peers() {
    let mut a = Obj::make_none();
    a.set_property("x", DemoValue::concrete_number(10).modified());
    a.set_property("y", DemoValue::concrete_number(20));

    let mut b = Obj::make_none();
    b.set_property("x", DemoValue::concrete_number(99));
    b.set_property("y", DemoValue::concrete_number(88));
    b.set_property("z", DemoValue::concrete_number(77));

    let merged = a.replace_non_modified_parts(&b);

    assert_eq!(
        merged.get_property("x"),
        DemoValue::concrete_number(10).modified()
    );
    assert_eq!(merged.get_property("y"), DemoValue::concrete_number(88));
    assert_eq!(merged.get_property("z"), DemoValue::concrete_number(77));
}

#[test]
fn summarize_preserves_modified_bit() {
    let mut o = Obj::make_none();
    let property = DemoValue::with_label(label(1));
    o.set_property("p", property.clone());

    struct AllSummary;
    impl abstract_object::Summarized<BasicLabel> for AllSummary {
        fn is_summary(&self, _label: &BasicLabel) -> bool {
            true
        }
    }

    let summarized = o.summarize(&AllSummary);
    assert_eq!(
        summarized.get_property("p").is_maybe_modified(),
        property.is_maybe_modified()
    );
}

#[test]
fn equality_and_hash_agree_across_construction_routes() {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut a = Obj::make_none();
    a.set_property("p", DemoValue::concrete_number(1));
    a.set_property("q", DemoValue::concrete_number(2));

    // Built in the opposite insertion order, through an extra overwrite.
    let mut b = Obj::make_none();
    b.set_property("q", DemoValue::concrete_number(99));
    b.set_property("p", DemoValue::concrete_number(1));
    b.set_property("q", DemoValue::concrete_number(2));

    assert_eq!(a, b);
    let mut ha = DefaultHasher::new();
    let mut hb = DefaultHasher::new();
    a.hash(&mut ha);
    b.hash(&mut hb);
    assert_eq!(ha.finish(), hb.finish());
}

#[test]
fn invariant_violation_on_bad_default() {
    let mut o = Obj::make_none();
    let bad = DemoValue::concrete_number(5); // present, not absent, not unknown
    let err = o.set_default_non_array_property(bad);
    assert!(err.is_err());
}

#[test]
fn get_scope_chain_unknown_state_fails() {
    let o = Obj::make_unknown();
    assert!(o.get_scope_chain().is_err());
}

#[test]
fn property_reference_dispatch() {
    let mut o = Obj::make_none();
    o.set_value(
        &PropertyReference::ordinary("p"),
        DemoValue::concrete_number(7),
    )
    .unwrap();
    assert_eq!(
        o.get_value(&PropertyReference::ordinary("p")).unwrap(),
        DemoValue::concrete_number(7)
    );
}

#[test]
fn join_keeps_properties_that_diverge_from_default() {
    let mut a = Obj::make_absent_modified();
    a.set_property("p", DemoValue::concrete_number(1));
    let mut b = Obj::make_absent_modified();
    b.set_property("p", DemoValue::concrete_number(1));

    let joined = a.join(&b);
    assert_eq!(joined.get_property("p"), DemoValue::concrete_number(1));
}

#[test]
fn widen_collapses_disagreeing_properties_for_convergence() {
    let mut a = Obj::make_none();
    a.set_property("p", DemoValue::concrete_number(1));
    let mut b = Obj::make_none();
    b.set_property("p", DemoValue::concrete_number(2));

    let widened = a.widen(&b);
    assert_eq!(widened.get_property("p").number, None);
}

#[test]
fn subsumes_reflects_lattice_containment_after_join() {
    let mut a = Obj::make_none();
    a.set_property("p", DemoValue::concrete_number(1));
    let mut b = Obj::make_none();
    b.set_property("p", DemoValue::concrete_number(2));

    let joined = a.join(&b);
    assert!(joined.subsumes(&a));
    assert!(joined.subsumes(&b));
    assert!(!a.subsumes(&joined));
}

#[test]
fn scope_chain_state_machine_transitions() {
    let mut o = Obj::make_none();
    assert!(!o.get_scope_chain().unwrap().is_some());

    let chain = LinkedScopeChain::singleton([label(1)]);
    assert!(o.add_to_scope_chain(&chain).unwrap());
    assert!(o.get_scope_chain().unwrap().is_some());

    let grown_again = o.add_to_scope_chain(&chain).unwrap();
    assert!(grown_again, "a second nested frame still grows the chain");
}
