use super::*;

#[test]
fn hex_colors_parse_with_and_without_alpha() {
    assert_eq!(
        Rgba8::parse_hex("#3b82f6").unwrap(),
        Rgba8::rgb(0x3b, 0x82, 0xf6)
    );
    let c = Rgba8::parse_hex("#f472b680").unwrap();
    assert_eq!(c.a, 0x80);
    assert_eq!(c.to_hex(), "#f472b680");
}

#[test]
fn hex_colors_reject_bad_input() {
    for bad in ["3b82f6", "#3b82f", "#zzzzzz", "#ééé"] {
        assert!(Rgba8::parse_hex(bad).is_err(), "{bad}");
    }
}

#[test]
fn colors_round_trip_through_json() {
    let c: Rgba8 = serde_json::from_str("\"#22c55e\"").unwrap();
    assert_eq!(serde_json::to_string(&c).unwrap(), "\"#22c55e\"");
}

#[test]
fn fps_rejects_zero_and_reports_frame_duration() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    let fps = Fps::new(50, 1).unwrap();
    assert_eq!(fps.frame_duration(), std::time::Duration::from_millis(20));
}
