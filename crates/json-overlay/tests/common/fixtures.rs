#![allow(dead_code)]

use std::path::PathBuf;

use json_overlay::{Prototype, Prototypes};
use serde_json::{json, Value};

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// A spread of target shapes: flat, nested, arrays, mixed, and empty.
pub fn targets() -> Vec<(&'static str, Value)> {
    vec![
        ("empty", json!({})),
        ("flat", json!({"a": 1, "b": "two", "c": null, "d": true})),
        ("nested", json!({"a": {"b": {"c": 1}}, "x": [1, 2, 3]})),
        ("array_root", json!([1, {"a": 1}, [2, 3]])),
        ("scenario", scenario_target()),
        (
            "typed",
            json!({"__type": "Point", "x": 3, "y": 4, "tags": ["p"], "meta": {"__type": "Meta"}}),
        ),
    ]
}

pub fn scenario_target() -> Value {
    json!({"a": 1, "b": {"x": 1, "y": 2}})
}

fn number(value: Option<Value>) -> f64 {
    value.and_then(|v| v.as_f64()).unwrap_or(0.0)
}

/// `Point` computes its distance `d` from `x`/`y`, and the setter `p`
/// writes both coordinates from a `[x, y]` pair. `Point3` inherits both.
pub fn point_prototypes() -> Prototypes {
    let mut prototypes = Prototypes::new();
    prototypes.register(
        Prototype::new("Point")
            .getter("d", |node| {
                let x = number(node.get_value("x"));
                let y = number(node.get_value("y"));
                Some(json!((x * x + y * y).sqrt()))
            })
            .setter("p", |node, value| {
                if let Some([x, y]) = value.as_array().map(Vec::as_slice) {
                    node.set("x", x.clone());
                    node.set("y", y.clone());
                }
            }),
    );
    prototypes.register(Prototype::new("Point3").extends("Point").getter("z2", |node| {
        let z = number(node.get_value("z"));
        Some(json!(z * z))
    }));
    prototypes
}
