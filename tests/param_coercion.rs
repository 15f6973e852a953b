//! Parameter coercion through the request boundary

use serde_json::{json, Map, Value};
use weetags_gate::{
    EngineOperation, GateError, Operation, ParamName, ParamValue, ParameterRecord, RawParams,
    Relation,
};

fn payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("payload must be an object, got {other}"),
    }
}

#[test]
fn test_listing_from_query_string() {
    let raw = RawParams::merge(
        vec![("nid", "oak"), ("tree_name", "topics")],
        None,
        vec![
            ("fields", vec!["name, depth"]),
            ("order_by", vec!["depth"]),
            ("axis", vec!["0"]),
            ("limit", vec!["25"]),
        ],
    );
    let record = ParameterRecord::from_raw(&raw).unwrap();
    let kwargs = record.get_kwargs(&EngineOperation::for_relation(Relation::Children));

    assert_eq!(
        kwargs.to_value(),
        json!({
            "nid": "oak",
            "fields": ["name", "depth"],
            "order_by": ["depth"],
            "axis": 0,
            "limit": 25
        })
    );
}

#[test]
fn test_nodes_where_from_payload() {
    let raw = RawParams::merge(
        Vec::<(String, String)>::new(),
        Some(payload(json!({
            "conditions": [[["depth", ">", 1]], "OR", [["is_leaf", "IS", true]]],
            "fields": ["name"],
            "limit": 10,
        }))),
        Vec::<(String, Vec<String>)>::new(),
    );
    let record = ParameterRecord::from_raw(&raw).unwrap();
    let kwargs = record.get_kwargs(&EngineOperation::NodesWhere);

    assert_eq!(
        kwargs.names().collect::<Vec<_>>(),
        vec![
            ParamName::Fields,
            ParamName::Axis,
            ParamName::Limit,
            ParamName::Conditions
        ]
    );
    assert_eq!(
        kwargs.get(ParamName::Conditions).unwrap().to_value(),
        json!([[["depth", ">", 1]], "OR", [["is_leaf", "IS", true]]])
    );
}

#[test]
fn test_write_operations() {
    let raw = RawParams::merge(
        vec![("nid", "oak")],
        Some(payload(json!({
            "field_name": "tags",
            "value": "'evergreen'",
            "values": "['a', 'b']",
            "set_values": [["name", "Oak"], ["depth", 1]],
        }))),
        vec![],
    );
    let record = ParameterRecord::from_raw(&raw).unwrap();

    let append = record.get_kwargs(&EngineOperation::AppendNode);
    assert_eq!(
        append.get(ParamName::Value),
        Some(&ParamValue::Any(json!("evergreen")))
    );

    let extend = record.get_kwargs(&EngineOperation::ExtendNode);
    assert_eq!(
        extend.get(ParamName::Values),
        Some(&ParamValue::List(vec![json!("a"), json!("b")]))
    );
    assert!(!extend.contains(ParamName::Value));

    let update = record.get_kwargs(&EngineOperation::UpdateNode);
    assert_eq!(
        update.to_value(),
        json!({"nid": "oak", "set_values": [["name", "Oak"], ["depth", 1]]})
    );
}

#[test]
fn test_add_node_literal() {
    let raw = RawParams::merge(
        Vec::<(&str, &str)>::new(),
        None,
        vec![("node", vec!["{'id': 'elm', 'parent': 'oak', 'alias': None}"])],
    );
    let record = ParameterRecord::from_raw(&raw).unwrap();
    assert_eq!(
        record.get_kwargs(&EngineOperation::AddNode).to_value(),
        json!({"node": {"id": "elm", "parent": "oak", "alias": null}})
    );
}

#[test]
fn test_draw_tree_flags() {
    let raw = RawParams::merge(
        Vec::<(&str, &str)>::new(),
        None,
        vec![("style", vec!["ascii-exr"]), ("extra_space", vec!["true"])],
    );
    let record = ParameterRecord::from_raw(&raw).unwrap();
    assert_eq!(
        record.get_kwargs(&EngineOperation::DrawTree).to_value(),
        json!({"style": "ascii-exr", "extra_space": true})
    );
}

#[test]
fn test_is_related_from_path() {
    let raw = RawParams::merge(
        vec![("nid0", "oak"), ("nid1", "elm")],
        None,
        vec![("check_siblings", vec!["0"])],
    );
    let record = ParameterRecord::from_raw(&raw).unwrap();
    assert_eq!(
        record.get_kwargs(&EngineOperation::IsRelated).to_value(),
        json!({"nid0": "oak", "nid1": "elm", "check_siblings": false})
    );
}

#[test]
fn test_bad_input_surfaces_typed_errors() {
    let cases: Vec<(Value, fn(&GateError) -> bool)> = vec![
        (json!({"limit": "ten"}), |e| matches!(e, GateError::Conversion { .. })),
        (json!({"axis": 1.5}), |e| matches!(e, GateError::Conversion { .. })),
        (json!({"nid": ["a"]}), |e| matches!(e, GateError::Parsing { .. })),
        (json!({"include_base": "maybe"}), |e| matches!(e, GateError::Conversion { .. })),
        (json!({"relation": "cousins"}), |e| {
            matches!(e, GateError::UnknownChoice { .. })
        }),
        (json!({"conditions": [[["a", "=", 1], "OR"]]}), |e| {
            matches!(e, GateError::Parsing { .. })
        }),
    ];

    for (input, expected) in cases {
        let err = ParameterRecord::from_raw(&RawParams::from_map(payload(input.clone())))
            .unwrap_err();
        assert!(expected(&err), "{input} gave {err:?}");
        assert_eq!(err.status(), 400);
    }
}

struct CustomOperation;

impl Operation for CustomOperation {
    fn name(&self) -> &str {
        "custom"
    }

    fn accepts(&self) -> &[ParamName] {
        &[ParamName::Nid, ParamName::Limit]
    }
}

#[test]
fn test_custom_operation() {
    let raw = RawParams::from_map(payload(json!({"nid": "oak", "fields": ["x"]})));
    let record = ParameterRecord::from_raw(&raw).unwrap();
    let kwargs = record.get_kwargs(&CustomOperation);
    assert_eq!(kwargs.to_value(), json!({"nid": "oak"}));
}
