use labtrace::error::ExperimentError;
use labtrace::session::condition::{ConditionStore, ConditionValue};
use labtrace::session::trigger::{Trigger, TriggerTable};
use serde_json::json;

#[test]
fn condition_values_from_json() {
    assert_eq!(ConditionValue::from_json(&json!(5)), ConditionValue::Integer(5));
    assert_eq!(
        ConditionValue::from_json(&json!("low")),
        ConditionValue::Text("low".to_owned())
    );
    assert_eq!(ConditionValue::from_json(&json!([1, 2])), ConditionValue::Invalid);
    assert_eq!(ConditionValue::from_json(&json!(1.5)), ConditionValue::Invalid);
}

#[test]
fn condition_rendering_uses_the_undefined_sentinel() {
    assert_eq!(ConditionValue::Integer(-3).render("NA"), "-3");
    assert_eq!(ConditionValue::Text("b".to_owned()).render("NA"), "b");
    assert_eq!(ConditionValue::Invalid.render("NA"), "NA");
}

#[test]
fn names_are_unique() {
    let mut store = ConditionStore::new();
    store.add("group", ConditionValue::Integer(1)).unwrap();
    assert!(matches!(
        store.add("group", ConditionValue::Integer(2)),
        Err(ExperimentError::DuplicateCondition(_))
    ));
    assert!(matches!(
        store.remove("unknown"),
        Err(ExperimentError::UnknownCondition(_))
    ));
    store.remove("group").unwrap();
    store.add("group", ConditionValue::Integer(2)).unwrap();
}

#[test]
fn live_values_start_from_the_defaults() {
    let mut store = ConditionStore::new();
    store.add("group", ConditionValue::Integer(5)).unwrap();
    store.begin_session();
    assert_eq!(store.value("group"), ConditionValue::Integer(5));

    store.set("group", ConditionValue::Integer(7)).unwrap();
    assert_eq!(store.value("group"), ConditionValue::Integer(7));

    // A new session starts from the registered default again.
    store.end_session();
    store.begin_session();
    assert_eq!(store.value("group"), ConditionValue::Integer(5));
}

#[test]
fn setting_marks_the_change_flag() {
    let mut store = ConditionStore::new();
    store.add("group", ConditionValue::Integer(0)).unwrap();
    store.begin_session();
    assert!(!store.changed());
    store.set("group", ConditionValue::Integer(1)).unwrap();
    assert!(store.changed());
    store.clear_changed();
    assert!(!store.changed());
}

#[test]
fn incrementing_non_integers_is_a_no_op() {
    let mut store = ConditionStore::new();
    store.add("count", ConditionValue::Integer(1)).unwrap();
    store.add("label", ConditionValue::Text("a".to_owned())).unwrap();
    store.begin_session();

    store.increment("count", 2);
    assert_eq!(store.value("count"), ConditionValue::Integer(3));

    store.increment("label", 1);
    assert_eq!(store.value("label"), ConditionValue::Text("a".to_owned()));

    // Unregistered names are also just warned about.
    store.increment("missing", 1);
}

#[test]
fn probing_an_unregistered_condition_is_safe() {
    let mut store = ConditionStore::new();
    store.begin_session();
    assert_eq!(store.value("anything"), ConditionValue::Invalid);
}

#[test]
fn trigger_selection_rotates_by_participant() {
    let trigger = Trigger::new(2, vec!["a".to_owned(), "b".to_owned(), "c".to_owned()]);
    assert_eq!(trigger.command_block(0), Some("a"));
    assert_eq!(trigger.command_block(1), Some("a"));
    assert_eq!(trigger.command_block(2), Some("b"));
    assert_eq!(trigger.command_block(4), Some("c"));
    assert_eq!(trigger.command_block(6), Some("a"));
}

#[test]
fn trigger_selection_is_periodic() {
    let blocks: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let rotate = 4u32;
    let trigger = Trigger::new(rotate, blocks.clone());
    let period = rotate * blocks.len() as u32;
    for participant in 0..16u32 {
        for k in 1..4u32 {
            assert_eq!(
                trigger.command_block(participant),
                trigger.command_block(participant + period * k)
            );
        }
    }
}

#[test]
fn empty_trigger_yields_no_block() {
    let trigger = Trigger::new(1, Vec::new());
    assert_eq!(trigger.command_block(3), None);
}

#[test]
fn zero_rotate_interval_is_clamped() {
    let trigger = Trigger::new(0, vec!["a".to_owned(), "b".to_owned()]);
    // Interval 0 behaves like 1 instead of dividing by zero.
    assert_eq!(trigger.command_block(1), Some("b"));
}

#[test]
fn trigger_table_enforces_unique_names() {
    let mut table = TriggerTable::new();
    table.add("go", Trigger::new(1, vec!["a".to_owned()])).unwrap();
    assert!(matches!(
        table.add("go", Trigger::new(1, Vec::new())),
        Err(ExperimentError::DuplicateTrigger(_))
    ));
    assert!(matches!(
        table.select("missing", 0),
        Err(ExperimentError::UnknownTrigger(_))
    ));
    assert_eq!(table.select("go", 12).unwrap(), Some("a".to_owned()));
    table.remove("go").unwrap();
    assert!(matches!(
        table.remove("go"),
        Err(ExperimentError::UnknownTrigger(_))
    ));
}
