use chrono::NaiveDate;
use infusion_core::{parse_duration_weeks, InvalidDurationError, Point, Position};

#[test]
fn expiring_in_weeks_adds_whole_weeks() {
    let now = NaiveDate::from_ymd_opt(2026, 1, 1)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    let point = Point::expiring_in_weeks(1, Position::new(100, 200), now, 2).unwrap();

    assert!(!point.id.is_nil());
    assert_eq!(point.number, 1);
    assert_eq!(point.position, Position::new(100, 200));
    assert_eq!(point.expires_at - now, chrono::TimeDelta::days(14));
}

#[test]
fn expiry_boundary_is_strict() {
    let now = NaiveDate::from_ymd_opt(2026, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let point = Point::expiring_in_weeks(1, Position::new(0, 0), now, 0).unwrap();

    assert!(!point.is_expired_at(now));
    assert!(point.is_expired_at(now + chrono::TimeDelta::nanoseconds(1)));
}

#[test]
fn distinct_points_get_distinct_ids() {
    let now = NaiveDate::from_ymd_opt(2026, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let a = Point::new(1, Position::new(1, 1), now);
    let b = Point::new(1, Position::new(1, 1), now);
    assert_ne!(a.id, b.id);
}

#[test]
fn point_serialization_uses_expected_wire_fields() {
    let now = NaiveDate::from_ymd_opt(2026, 5, 4)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    let point = Point::new(7, Position::new(-3, 40), now);

    let json = serde_json::to_value(&point).unwrap();
    assert_eq!(json["id"], point.id.to_string());
    assert_eq!(json["number"], 7);
    assert_eq!(json["position"]["x"], -3);
    assert_eq!(json["position"]["y"], 40);
    assert_eq!(json["expires_at"], "2026-05-04T08:00:00");

    let decoded: Point = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, point);
}

#[test]
fn invalid_duration_messages_name_the_input() {
    let err = parse_duration_weeks("abc").unwrap_err();
    assert_eq!(err, InvalidDurationError::NotANumber("abc".to_string()));
    assert!(err.to_string().contains("`abc`"));
}
