use super::*;
use serde_json::json;

#[test]
fn parses_short_and_long_hex() {
    assert_eq!(Color::parse("#f00").unwrap(), Color::rgba(1.0, 0.0, 0.0, 1.0));
    assert_eq!(Color::parse("#000").unwrap(), Color::BLACK);

    let c = Color::parse("#0000ff80").unwrap();
    assert!((c.b - 1.0).abs() < 1e-9);
    assert!((c.a - (128.0 / 255.0)).abs() < 1e-9);

    let c = Color::parse("#000000ff").unwrap();
    assert_eq!(c.alpha(), 1.0);
}

#[test]
fn parses_named_colors_ignoring_case_and_separators() {
    assert_eq!(Color::parse("Steel Blue").unwrap(), Color::parse("steelblue").unwrap());
    assert_eq!(Color::parse("WHITE").unwrap(), Color::WHITE);
}

#[test]
fn spec_with_alpha_overrides_base_alpha() {
    let c = Color::parse(("#000000", 0.0)).unwrap();
    assert_eq!(c.alpha(), 0.0);
    let c = Color::parse(("#000", 0.75)).unwrap();
    assert_eq!(c, Color::rgba(0.0, 0.0, 0.0, 0.75));
}

#[test]
fn grey_and_channel_specs() {
    assert_eq!(Color::parse(0.5).unwrap(), Color::grey(0.5, 1.0));
    assert_eq!(
        Color::parse([0.25, 0.5, 0.75]).unwrap(),
        Color::rgba(0.25, 0.5, 0.75, 1.0)
    );
    assert_eq!(
        Color::parse([0.25, 0.5, 0.75, 0.9]).unwrap(),
        Color::rgba(0.25, 0.5, 0.75, 0.9)
    );
}

#[test]
fn out_of_range_components_are_clamped() {
    let c = Color::parse([2.0, -1.0, 0.5]).unwrap();
    assert_eq!(c, Color::rgba(1.0, 0.0, 0.5, 1.0));
}

#[test]
fn rejects_garbage() {
    assert!(matches!(
        Color::parse("#12345"),
        Err(FxError::InvalidColor(_))
    ));
    assert!(matches!(Color::parse("#zzz"), Err(FxError::InvalidColor(_))));
    assert!(matches!(
        Color::parse("not-a-color"),
        Err(FxError::InvalidColor(_))
    ));
    assert!(Color::parse(ColorSpec::Channels(vec![1.0])).is_err());
    assert!(Color::parse(f64::NAN).is_err());
}

#[test]
fn deserializes_from_json_shapes() {
    let s: ColorSpec = serde_json::from_value(json!("#ff0000")).unwrap();
    assert_eq!(s.resolve().unwrap(), Color::rgba(1.0, 0.0, 0.0, 1.0));

    let s: ColorSpec = serde_json::from_value(json!([0.0, 0.0, 1.0])).unwrap();
    assert_eq!(s.resolve().unwrap(), Color::rgba(0.0, 0.0, 1.0, 1.0));

    let s: ColorSpec = serde_json::from_value(json!({ "spec": "black", "alpha": 0.5 })).unwrap();
    assert_eq!(s.resolve().unwrap(), Color::rgba(0.0, 0.0, 0.0, 0.5));
}

#[test]
fn premul_conversion_uses_alpha() {
    let p = Color::rgba(1.0, 1.0, 1.0, 0.5).to_rgba8_premul();
    assert_eq!(p.to_array(), [128, 128, 128, 128]);
}
