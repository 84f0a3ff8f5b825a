use super::*;

fn temp_file(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "canvasfx_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, b"x").unwrap();
    path
}

#[test]
fn names_must_be_identifiers() {
    for ok in ["speed", "_x", "a1_b2"] {
        assert!(Variable::boolean(ok, true).is_ok(), "{ok}");
    }
    for bad in ["", "1x", "a-b", "with space", "é"] {
        let err = Variable::boolean(bad, true).unwrap_err();
        assert!(matches!(err, FxError::InvalidVariableSpec(_)), "{bad}");
    }
}

#[test]
fn labels_end_in_punctuation() {
    assert_eq!(Variable::boolean("speed", true).unwrap().label(), "speed:");
    let v = Variable::boolean("speed", true).unwrap().with_label("Go?");
    assert_eq!(v.label(), "Go?");
    let v = Variable::boolean("speed", true).unwrap().with_label("Rate (Hz)");
    assert_eq!(v.label(), "Rate (Hz)");
}

#[test]
fn number_bounds_step_and_snapping() {
    let v = Variable::number("n", 10.0, 0.0, Some(2.0), Some(5.0)).unwrap();
    assert_eq!(
        v.kind(),
        &VariableKind::Number {
            min: 0.0,
            max: 10.0,
            step: Some(2.0),
            value: 6.0,
        }
    );

    assert_eq!(
        Variable::number("n", 0.0, 10.0, None, None).unwrap().value(),
        VariableValue::Number(0.0)
    );
    assert!(Variable::number("n", 0.0, 10.0, Some(3.0), None).is_err());
    assert!(Variable::number("n", 0.0, 10.0, Some(-1.0), None).is_err());
    assert!(Variable::number("n", 0.0, 10.0, None, Some(11.0)).is_err());
    assert!(Variable::number("n", 0.0, 1.0, Some(0.1), Some(0.33)).is_ok());
}

#[test]
fn inherit_clamps_and_resnaps_numbers() {
    let old = Variable::number("n", 0.0, 100.0, None, Some(7.0)).unwrap();
    let mut new = Variable::number("n", 0.0, 10.0, Some(2.0), None).unwrap();
    new.inherit(&old);
    assert_eq!(new.value(), VariableValue::Number(8.0));

    let old = Variable::number("n", 0.0, 100.0, None, Some(70.0)).unwrap();
    new.inherit(&old);
    assert_eq!(new.value(), VariableValue::Number(10.0));
}

#[test]
fn inherit_keeps_numbers_on_an_in_range_step() {
    let old = Variable::number("n", 0.0, 10.0, None, Some(5.0)).unwrap();
    let mut new = Variable::number("n", 1.0, 5.0, Some(2.0), Some(3.0)).unwrap();
    new.inherit(&old);
    assert_eq!(new.value(), VariableValue::Number(4.0));

    let old = Variable::number("n", 0.0, 10.0, None, Some(0.0)).unwrap();
    new.inherit(&old);
    assert_eq!(new.value(), VariableValue::Number(2.0));
}

#[test]
fn inherit_drops_a_select_value_missing_from_the_new_options() {
    let abc = vec!["a".to_owned(), "b".to_owned(), "c".to_owned()];
    let old = Variable::select("s", abc, Some("c")).unwrap();
    let mut new = Variable::select("s", vec!["a".to_owned(), "b".to_owned()], None).unwrap();
    new.inherit(&old);
    assert_eq!(new.value(), VariableValue::Text("a".into()));

    let old = Variable::select("s", vec!["b".to_owned()], None).unwrap();
    new.inherit(&old);
    assert_eq!(new.value(), VariableValue::Text("b".into()));
}

#[test]
fn inherit_drops_a_file_the_new_types_reject() {
    let path = temp_file("frame.png");
    let path = path.to_str().unwrap();
    let old = Variable::file("f", Some(path), &[]).unwrap();

    let mut narrowed = Variable::file("f", None, &["jpg"]).unwrap();
    narrowed.inherit(&old);
    assert_eq!(narrowed.value(), VariableValue::Text(String::new()));

    let mut widened = Variable::file("f", None, &["png", "jpg"]).unwrap();
    widened.inherit(&old);
    assert_eq!(widened.value(), VariableValue::Text(path.to_owned()));
}

#[test]
fn inherit_ignores_a_different_type() {
    let old = Variable::text("n", "hello").unwrap();
    let mut new = Variable::number("n", 0.0, 10.0, None, Some(3.0)).unwrap();
    new.inherit(&old);
    assert_eq!(new.value(), VariableValue::Number(3.0));

    let old = Variable::text("t", "kept").unwrap();
    let mut new = Variable::text("t", "fresh").unwrap();
    new.inherit(&old);
    assert_eq!(new.value(), VariableValue::Text("kept".into()));
}

#[test]
fn select_needs_options_containing_the_value() {
    let opts = || vec!["a".to_owned(), "b".to_owned()];
    assert_eq!(
        Variable::select("s", opts(), None).unwrap().value(),
        VariableValue::Text("a".into())
    );
    assert!(Variable::select("s", opts(), Some("c")).is_err());
    assert!(Variable::select("s", Vec::new(), None).is_err());
}

#[test]
fn colors_must_parse() {
    let v = Variable::color("c", None).unwrap();
    assert_eq!(v.value(), VariableValue::Text("#cccccc".into()));
    assert!(Variable::color("c", Some("not-a-color")).is_err());

    let mut v = Variable::color("c", Some("steelblue")).unwrap();
    assert!(v.set_value("#zzz").is_err());
    v.set_value("#ff0000").unwrap();
    assert_eq!(v.value(), VariableValue::Text("#ff0000".into()));
}

#[test]
fn file_checks_existence_kind_and_extension() {
    let png = temp_file("pic.PNG");
    let path = png.to_string_lossy().into_owned();

    let v = Variable::file("f", Some(&path), &[".png", "JPG"]).unwrap();
    assert_eq!(
        v.kind(),
        &VariableKind::File {
            types: vec!["png".into(), "jpg".into()],
            value: path.clone(),
        }
    );
    assert!(Variable::file("f", Some(&path), &["gif"]).is_err());
    assert!(Variable::file("f", Some("/definitely/not/here.png"), &[]).is_err());

    let dir = png.parent().unwrap().to_string_lossy().into_owned();
    assert!(Variable::file("f", Some(&dir), &[]).is_err());

    let bare = temp_file("noext");
    let bare = bare.to_string_lossy().into_owned();
    assert!(Variable::file("f", Some(&bare), &["png"]).is_err());
    assert!(Variable::file("f", Some(&bare), &[]).is_ok());
    assert!(Variable::file("f", None, &["png"]).is_ok());
}

#[test]
fn set_value_checks_type_and_range() {
    let mut v = Variable::number("n", 0.0, 10.0, Some(0.5), None).unwrap();
    v.set_value(3.3).unwrap();
    assert_eq!(v.value().as_f64(), Some(3.5));
    assert!(v.set_value(20.0).is_err());
    assert!(v.set_value("3").is_err());
    assert_eq!(v.value().as_f64(), Some(3.5));

    let mut b = Variable::boolean("b", false).unwrap();
    b.set_value(true).unwrap();
    assert_eq!(b.value().as_bool(), Some(true));
    assert!(b.set_value(1.0).is_err());
}

#[test]
fn buttons_default_to_their_name() {
    let v = Variable::button("go", None, Some("red".into())).unwrap();
    assert_eq!(v.value().as_str(), Some("go"));
    let VariableKind::Button { color, .. } = v.kind() else {
        panic!("not a button");
    };
    assert_eq!(color.map(|c| c.to_rgba8()), Some([255, 0, 0, 255]));
    assert!(Variable::button("go", None, Some("nope".into())).is_err());
}

#[test]
fn definitions_deserialize_from_json() {
    let def: VariableDef = serde_json::from_str(
        r#"{ "name": "speed", "type": "number", "min": 0, "max": 10, "step": 2,
             "value": 5, "label": "Speed" }"#,
    )
    .unwrap();
    let v = Variable::try_from(def).unwrap();
    assert_eq!(v.label(), "Speed:");
    assert_eq!(v.value(), VariableValue::Number(6.0));

    let def: VariableDef = serde_json::from_str(r#"{ "name": "n", "type": "number" }"#).unwrap();
    assert!(Variable::try_from(def).is_err());

    let def: VariableDef =
        serde_json::from_str(r#"{ "name": "b", "type": "boolean", "value": "yes" }"#).unwrap();
    assert!(Variable::try_from(def).is_err());

    assert!(serde_json::from_str::<VariableDef>(r#"{ "name": "x", "type": "slider" }"#).is_err());
}
