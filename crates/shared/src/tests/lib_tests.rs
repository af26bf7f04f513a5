use crate::{
    domain::{ColorSector, Rgb, SectorId, Undertone, UserId},
    error::{ApiError, ErrorCode},
    protocol::ServerEvent,
};

#[test]
fn parses_hex_with_and_without_hash() {
    assert_eq!("#FF7F00".parse::<Rgb>().expect("hex"), Rgb::new(255, 127, 0));
    assert_eq!("00ff7f".parse::<Rgb>().expect("hex"), Rgb::new(0, 255, 127));
}

#[test]
fn rejects_malformed_hex() {
    assert!("#FFF".parse::<Rgb>().is_err());
    assert!("#GG0000".parse::<Rgb>().is_err());
    assert!("#ÄÄ0000".parse::<Rgb>().is_err());
    assert!("#+F+F+F".parse::<Rgb>().is_err());
    assert!("+1+2+3".parse::<Rgb>().is_err());
}

#[test]
fn color_serializes_as_uppercase_hex() {
    let json = serde_json::to_string(&Rgb::new(0, 127, 255)).expect("json");
    assert_eq!(json, "\"#007FFF\"");
}

#[test]
fn undertone_parses_display_and_snake_forms() {
    assert_eq!("light warm".parse::<Undertone>().expect("tone"), Undertone::LightWarm);
    assert_eq!("Light_Cool".parse::<Undertone>().expect("tone"), Undertone::LightCool);
    assert!("lukewarm".parse::<Undertone>().is_err());
}

#[test]
fn server_event_is_tagged() {
    let event = ServerEvent::ColorSelected {
        user_id: UserId(3),
        sector: ColorSector {
            id: SectorId(12),
            label: "Color 13".into(),
            color_value: Rgb::new(255, 0, 0),
        },
        selected_at: chrono::Utc::now(),
    };
    let value = serde_json::to_value(&event).expect("json");
    assert_eq!(value["type"], "color_selected");
    assert_eq!(value["payload"]["sector"]["id"], 12);
    assert_eq!(value["payload"]["sector"]["color_value"], "#FF0000");
}

#[test]
fn parse_errors_map_to_validation() {
    let err: ApiError = "nope".parse::<Rgb>().expect_err("bad color").into();
    assert_eq!(err.code, ErrorCode::Validation);
}

#[test]
fn escapes_markup_and_quotes() {
    assert_eq!(
        crate::html::escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
        "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
    );
}
