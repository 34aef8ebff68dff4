use std::{collections::BTreeMap, io::Write, time::Duration};

use serde::{Deserialize, Serialize};
use stowage_json::{load_settings, JsonSerializer, JsonSerializerOptions, SerdeJsonSerializer, SerializerError};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Plan {
    Free,
    Team { seats: u32 },
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Account {
    name: String,
    plan: Plan,
    sessions: Vec<Session>,
    limits: BTreeMap<String, Duration>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Session {
    device: String,
    expires_in: Duration,
    note: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Elapsed {
    secs: u64,
    nanos: u32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Timer {
    Off,
    After(Duration),
    Every { period: Duration },
}

fn account() -> Account {
    Account {
        name: "ada".to_owned(),
        plan: Plan::Team { seats: 3 },
        sessions: vec![
            Session { device: "laptop".to_owned(), expires_in: Duration::from_secs(3_600), note: None },
            Session { device: "phone".to_owned(), expires_in: Duration::from_millis(1_500), note: Some("x".to_owned()) },
        ],
        limits: BTreeMap::from([("upload".to_owned(), Duration::from_secs(2 * 86_400))]),
    }
}

#[test]
fn when_settings_come_from_file_then_serializer_follows_them() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().expect("temp file should be created");
    writeln!(file, "ignore_null_on_write = false").expect("write should succeed");
    let settings = load_settings(Some(file.path())).expect("settings should load");
    let serializer = SerdeJsonSerializer::new(JsonSerializerOptions::from(settings));

    let text = serializer
        .serialize(&Session { device: "tv".to_owned(), expires_in: Duration::from_secs(1), note: None })
        .expect("serialize should succeed");

    assert_eq!(text, r#"{"device":"tv","expires_in":"0.00:00:01:","note":null}"#);
}

#[test]
fn when_nested_values_hold_durations_then_they_survive_a_write_and_read() {
    let serializer = SerdeJsonSerializer::configured(|options| options.property_name_case_insensitive = true);

    let text = serializer.serialize(&account()).expect("serialize should succeed");
    let read: Account = serializer.deserialize(&text).expect("deserialize should succeed");

    assert!(text.contains(r#""upload":"2.00:00:00:""#), "{text}");
    assert_eq!(read, account());
}

#[test]
fn when_enum_payload_uses_other_casing_then_it_is_rejected() {
    let serializer = SerdeJsonSerializer::configured(|options| options.property_name_case_insensitive = true);

    let result = serializer.deserialize::<Plan>(r#"{"Team":{"SEATS":3}}"#);

    assert!(matches!(result, Err(SerializerError::Format(_))));
}

#[test]
fn when_timespan_text_is_malformed_then_error_explains_the_format() {
    let serializer = SerdeJsonSerializer::configured(|_| {});

    let error = serializer
        .deserialize::<Session>(r#"{"device":"tv","expires_in":"an hour"}"#)
        .expect_err("malformed timespan should fail");

    assert!(error.is_format());
    assert!(error.to_string().contains("expected d.hh:mm:ss:FFF"), "{error}");
}

#[test]
fn when_own_struct_is_shaped_like_a_duration_then_it_round_trips_untouched() {
    let serializer = SerdeJsonSerializer::configured(|_| {});

    let text = serializer.serialize(&Elapsed { secs: 5, nanos: 7 }).expect("serialize should succeed");
    let read: Elapsed = serializer.deserialize(&text).expect("deserialize should succeed");

    assert_eq!(text, r#"{"nanos":7,"secs":5}"#);
    assert_eq!(read, Elapsed { secs: 5, nanos: 7 });
}

#[test]
fn when_enum_variants_carry_durations_then_they_round_trip() {
    let serializer = SerdeJsonSerializer::configured(|_| {});
    let timers = vec![
        Timer::Off,
        Timer::After(Duration::from_secs(3)),
        Timer::Every { period: Duration::from_millis(500) },
    ];

    let text = serializer.serialize(&timers).expect("serialize should succeed");
    let read: Vec<Timer> = serializer.deserialize(&text).expect("deserialize should succeed");

    assert_eq!(text, r#"["Off",{"After":"0.00:00:03:"},{"Every":{"period":"0.00:00:00:5"}}]"#);
    assert_eq!(read, timers);
}

#[test]
fn when_json_value_round_trips_then_nulls_and_lookalike_objects_are_kept() {
    let serializer = SerdeJsonSerializer::configured(|_| {});
    let value = serde_json::json!({ "elapsed": { "secs": 5, "nanos": 7 }, "note": null });

    let text = serializer.serialize(&value).expect("serialize should succeed");
    let read: serde_json::Value = serializer.deserialize(&text).expect("deserialize should succeed");

    assert_eq!(text, r#"{"elapsed":{"nanos":7,"secs":5},"note":null}"#);
    assert_eq!(read, value);
}
