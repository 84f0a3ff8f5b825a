use super::*;

fn speed(max: f64) -> Variable {
    Variable::number("speed", 0.0, max, Some(2.0), None).unwrap()
}

#[test]
fn get_and_set_by_name() {
    let mut table = ParameterTable::new();
    table
        .define([speed(10.0), Variable::text("title", "hi").unwrap()])
        .unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get("speed").unwrap(), VariableValue::Number(0.0));

    table.set("speed", 4.0).unwrap();
    assert_eq!(table.get("speed").unwrap().as_f64(), Some(4.0));

    assert!(matches!(table.get("nope"), Err(FxError::InvalidVariableSpec(_))));
    assert!(matches!(table.set("nope", 1.0), Err(FxError::InvalidVariableSpec(_))));
    assert!(table.set("speed", 40.0).is_err());
}

#[test]
fn reload_keeps_user_edits() {
    let mut table = ParameterTable::new();
    table
        .define([speed(10.0), Variable::boolean("on", false).unwrap()])
        .unwrap();
    table.set("speed", 6.0).unwrap();
    table.set("on", true).unwrap();

    table
        .define([
            Variable::boolean("on", false).unwrap(),
            speed(4.0),
            Variable::text("added", "x").unwrap(),
        ])
        .unwrap();
    assert_eq!(table.get("speed").unwrap().as_f64(), Some(4.0));
    assert_eq!(table.get("on").unwrap().as_bool(), Some(true));
    assert_eq!(table.get("added").unwrap().as_str(), Some("x"));
    let names: Vec<&str> = table.variables().iter().map(Variable::name).collect();
    assert_eq!(names, ["on", "speed", "added"]);
}

#[test]
fn dropped_variables_disappear() {
    let mut table = ParameterTable::new();
    table.define([speed(10.0)]).unwrap();
    table.define([]).unwrap();
    assert!(table.is_empty());
    assert!(table.get("speed").is_err());
}

#[test]
fn duplicate_names_leave_the_table_alone() {
    let mut table = ParameterTable::new();
    table.define([speed(10.0)]).unwrap();
    table.set("speed", 2.0).unwrap();
    assert!(table.define([speed(10.0), speed(10.0)]).is_err());
    assert_eq!(table.get("speed").unwrap().as_f64(), Some(2.0));
}

#[test]
fn json_definitions_are_all_or_nothing() {
    let mut table = ParameterTable::new();
    table
        .define_json(
            r##"[
                { "name": "mode", "type": "select", "options": ["fast", "slow"], "value": "slow" },
                { "name": "tint", "type": "color", "value": "#336699" }
            ]"##,
        )
        .unwrap();
    assert_eq!(table.get("mode").unwrap().as_str(), Some("slow"));

    let bad = r#"[
        { "name": "mode", "type": "select", "options": ["fast"] },
        { "name": "tint", "type": "color", "value": "bogus" }
    ]"#;
    assert!(table.define_json(bad).is_err());
    assert_eq!(table.get("tint").unwrap().as_str(), Some("#336699"));
    assert!(table.define_json("{ not json").is_err());
}
