#![cfg(feature = "serde")]

use attribute_core::{CodecConfig, EventConfig, FieldFlags, ModifierKind, ValueChange};

#[test]
fn configs_round_trip_through_json() {
    let codec = CodecConfig::new().with_line_ending("\r\n").skip_empty_strings();
    let json = serde_json::to_string(&codec).expect("serialize codec config");
    let back: CodecConfig = serde_json::from_str(&json).expect("deserialize codec config");
    assert_eq!(back, codec);

    let events: EventConfig =
        serde_json::from_str(r#"{"max_dispatch_depth":8}"#).expect("deserialize event config");
    assert_eq!(events, EventConfig::with_max_dispatch_depth(8));
}

#[test]
fn value_types_serialize() {
    let change = ValueChange::new(1.0, 2.5);
    assert_eq!(
        serde_json::to_value(change).expect("serialize change"),
        serde_json::json!({ "old": 1.0, "new": 2.5 })
    );
    assert_eq!(
        serde_json::to_string(&ModifierKind::Multiply).expect("serialize kind"),
        "\"Multiply\""
    );
    let flags: FieldFlags = serde_json::from_str(
        &serde_json::to_string(&FieldFlags::IGNORE_ON_SAVE).expect("serialize flags"),
    )
    .expect("deserialize flags");
    assert_eq!(flags, FieldFlags::IGNORE_ON_SAVE);
}
