use solance_core::error::CoreError;
use solance_core::models::conversation::{
    truncate_title, Conversation, Message, Role, PLACEHOLDER_TITLE,
};
use solance_core::models::endpoint::{ApiKey, Endpoint, EndpointTable, FailoverCursor};
use solance_core::models::mode::Mode;
use solance_core::models::usage::UsageRecord;

fn ts() -> jiff::Timestamp {
    "2026-10-18T09:30:00Z".parse().unwrap()
}

#[test]
fn new_conversation_has_placeholder_title() {
    let conv = Conversation::new(Mode::Coder, ts());
    assert_eq!(conv.title, PLACEHOLDER_TITLE);
    assert!(conv.has_placeholder_title());
    assert!(conv.messages.is_empty());
}

#[test]
fn title_derived_from_first_user_message() {
    let mut conv = Conversation::new(Mode::Student, ts());
    conv.messages.push(Message::user("Explain photosynthesis like I'm ten please", ts()));
    conv.messages.push(Message::user("second question", ts()));

    assert!(conv.derive_title(20));
    assert_eq!(conv.title, "Explain photosynthes...");

    // Once titled, later calls leave it alone.
    conv.messages[0].text = "changed".to_string();
    assert!(!conv.derive_title(20));
    assert_eq!(conv.title, "Explain photosynthes...");
}

#[test]
fn title_not_derived_without_user_message() {
    let mut conv = Conversation::new(Mode::Chill, ts());
    conv.messages.push(Message::assistant("hi", "gemini-2.5-flash", ts()));
    assert!(!conv.derive_title(30));
    assert_eq!(conv.title, PLACEHOLDER_TITLE);
}

#[test]
fn truncate_title_counts_chars_not_bytes() {
    assert_eq!(truncate_title("  short  ", 30), "short");
    assert_eq!(truncate_title("héllo wörld", 5), "héllo...");
    assert_eq!(truncate_title("abc def", 4), "abc...");
}

#[test]
fn message_without_optional_fields_deserializes() {
    let json = serde_json::json!({
        "id": "4f0e6c1e-8f57-4d5f-9a51-0a5b3c2d1e0f",
        "role": "user",
        "text": "hello",
        "timestamp": "2026-10-18T09:30:00Z"
    });
    let msg: Message = serde_json::from_value(json).unwrap();
    assert_eq!(msg.role, Role::User);
    assert_eq!(msg.model_used, None);
    assert!(!msg.is_error);
}

#[test]
fn error_flag_only_serialized_when_set() {
    let ok = serde_json::to_value(Message::assistant("hi", "m", ts())).unwrap();
    assert!(ok.get("is_error").is_none());
    assert_eq!(ok["model_used"], "m");

    let err = serde_json::to_value(Message::error("boom", ts())).unwrap();
    assert_eq!(err["is_error"], true);
    assert_eq!(err["role"], "assistant");
}

#[test]
fn mode_parses_case_insensitively() {
    assert_eq!("coder".parse::<Mode>().unwrap(), Mode::Coder);
    assert_eq!(" SOLANCE ".parse::<Mode>().unwrap(), Mode::Solance);
    assert!(matches!("pirate".parse::<Mode>(), Err(CoreError::UnknownMode(_))));
}

#[test]
fn every_mode_has_a_system_instruction() {
    for mode in Mode::ALL {
        assert!(!mode.system_instruction().is_empty(), "{mode} has no instruction");
    }
}

#[test]
fn endpoint_table_rejects_empty() {
    assert!(matches!(
        EndpointTable::new(vec![]),
        Err(CoreError::EmptyEndpointTable)
    ));
}

#[test]
fn endpoint_table_counts_credentials() {
    let table = EndpointTable::new(vec![
        Endpoint::new("a", vec![ApiKey::new("k1")]),
        Endpoint::new("b", vec![]),
        Endpoint::new("c", vec![ApiKey::new("k2"), ApiKey::new("k3")]),
    ])
    .unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.total_credentials(), 3);
    assert_eq!(table.get(2).unwrap().model, "c");
    assert!(table.get(3).is_none());
}

#[test]
fn api_key_never_prints_secret() {
    let key = ApiKey::new("AIzaSyD-very-secret-value");
    assert_eq!(key.hint(), "AIza...alue");
    assert_eq!(format!("{key:?}"), "ApiKey(AIza...alue)");
    assert_eq!(ApiKey::new("short").to_string(), "****");
    assert_eq!(key.expose(), "AIzaSyD-very-secret-value");
}

#[test]
fn usage_record_wire_format() {
    let date = jiff::civil::date(2026, 10, 18);
    let record = UsageRecord { count: 3, date };
    let json = serde_json::to_value(record).unwrap();
    assert_eq!(json, serde_json::json!({ "count": 3, "date": "2026-10-18" }));

    assert!(record.is_current(date));
    assert!(!record.is_current(date.tomorrow().unwrap()));
    assert_eq!(record.remaining(25), 22);
    assert_eq!(UsageRecord { count: 40, date }.remaining(25), 0);
}

#[test]
fn cursor_defaults_to_origin() {
    assert_eq!(FailoverCursor::default(), FailoverCursor::new(0, 0));
    assert_eq!(FailoverCursor::new(1, 2).to_string(), "(1, 2)");
}
