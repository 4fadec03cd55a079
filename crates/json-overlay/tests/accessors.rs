mod common;

use json_overlay::{Overlay, OverlayConfig, Prototype};
use serde_json::json;

use common::assertions::assert_changes;
use common::fixtures::point_prototypes;

fn points() -> Overlay {
    Overlay::builder(json!({
        "origin": {"__type": "Point", "x": 3, "y": 4},
        "lifted": {"__type": "Point3", "x": 0, "y": 0, "z": 2},
        "plain": {"x": 3, "y": 4}
    }))
    .prototypes(point_prototypes())
    .build()
}

#[test]
fn getters_observe_overlay_state() {
    let mut overlay = points();
    let mut origin = overlay.at(&["origin"]).unwrap();
    assert_eq!(origin.get_value("d"), Some(json!(5.0)));
    origin.set("x", json!(6));
    origin.set("y", json!(8));
    assert_eq!(origin.get_value("d"), Some(json!(10.0)));
    // Computed values are never recorded.
    assert_changes(&mut overlay, json!({"$set": {"origin.x": 6, "origin.y": 8}}));
}

#[test]
fn setters_route_writes_through_other_keys() {
    let mut overlay = points();
    overlay.at(&["origin"]).unwrap().set("p", json!([1, 2]));
    assert_changes(&mut overlay, json!({"$set": {"origin.x": 1, "origin.y": 2}}));
    assert_eq!(
        overlay.unwrap()["origin"],
        json!({"__type": "Point", "x": 1, "y": 2})
    );
}

#[test]
fn accessors_are_inherited() {
    let mut overlay = points();
    let mut lifted = overlay.at(&["lifted"]).unwrap();
    assert_eq!(lifted.get_value("z2"), Some(json!(4.0)));
    assert_eq!(lifted.get_value("d"), Some(json!(0.0)));
    lifted.set("p", json!([3, 4]));
    assert_eq!(lifted.get_value("d"), Some(json!(5.0)));
}

#[test]
fn untyped_objects_have_no_accessors() {
    let mut overlay = points();
    let mut plain = overlay.at(&["plain"]).unwrap();
    assert_eq!(plain.get_value("d"), None);
    assert!(!plain.has("d"));
    plain.set("p", json!([1, 2]));
    assert_changes(&mut overlay, json!({"$set": {"plain.p": [1, 2]}}));
}

#[test]
fn accessor_keys_are_present_but_not_enumerable() {
    let mut overlay = points();
    let mut origin = overlay.at(&["origin"]).unwrap();
    assert!(origin.has("d"));
    assert!(origin.has("p"));
    assert_eq!(origin.keys(), vec!["__type", "x", "y"]);
    let descriptor = origin.describe("d").unwrap();
    assert_eq!(descriptor.value, json!(5.0));
    assert!(!descriptor.enumerable);
    assert!(origin.describe("x").unwrap().enumerable);
}

#[test]
fn target_data_shadows_accessors() {
    let mut overlay = Overlay::builder(json!({"__type": "Point", "x": 3, "y": 4, "d": "stored"}))
        .prototypes(point_prototypes())
        .build();
    assert_eq!(overlay.get_value("d"), Some(json!("stored")));
    overlay.set("d", json!("changed"));
    assert_changes(&mut overlay, json!({"$set": {"d": "changed"}}));
}

#[test]
fn pending_writes_shadow_getters() {
    let mut overlay = points();
    let mut origin = overlay.at(&["origin"]).unwrap();
    origin.remove("y");
    assert_eq!(origin.get_value("d"), Some(json!(3.0)));
    // A key without a setter is written like any other.
    origin.set("d", json!(0));
    assert_eq!(origin.get_value("d"), Some(json!(0)));
    origin.remove("d");
    assert_eq!(origin.get_value("d"), Some(json!(3.0)));
}

#[test]
fn accessors_can_be_switched_off() {
    let mut overlay = Overlay::builder(json!({"__type": "Point", "x": 3, "y": 4}))
        .config(OverlayConfig::default().accessors(false))
        .prototypes(point_prototypes())
        .build();
    assert_eq!(overlay.get_value("d"), None);
    overlay.set("p", json!([0, 0]));
    assert_changes(&mut overlay, json!({"$set": {"p": [0, 0]}}));
}

#[test]
fn custom_type_key_selects_the_prototype() {
    let mut overlay = Overlay::builder(json!({"kind": "Counter", "n": 1}))
        .config(OverlayConfig::default().type_key("kind"))
        .prototype(Prototype::new("Counter").setter("bump", |node, by| {
            let n = node.get_value("n").and_then(|v| v.as_i64()).unwrap_or(0);
            node.set("n", json!(n + by.as_i64().unwrap_or(1)));
        }))
        .build();
    overlay.set("bump", json!(2));
    overlay.set("bump", json!(3));
    assert_eq!(overlay.get_value("n"), Some(json!(6)));
    assert_changes(&mut overlay, json!({"$set": {"n": 6}}));
}
