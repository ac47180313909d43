//! Integration tests for diagnostic routing and working-memory dumps.

use expert_core::{roundtrip, CaptureRouter, Environment, Session};

#[test]
fn captured_diagnostics_show_the_round_trip() {
    let capture = CaptureRouter::new();
    let mut session = Environment::new();
    session.add_router(Box::new(capture.clone())).unwrap();
    session
        .build("(deftemplate greeting (slot text))")
        .unwrap();

    roundtrip::submit_and_infer(&mut session, "Alice").unwrap();

    let lines = capture.lines();
    assert!(lines.iter().any(|l| l == "deftemplate greeting"));
    assert!(lines
        .iter()
        .any(|l| l.contains(r#"(result (name "Alice"))"#)));
}

#[test]
fn working_memory_serializes_to_json() {
    let mut session = Environment::new();
    session
        .build("(deftemplate person (slot name) (multislot tags))")
        .unwrap();
    session
        .assert_string(r#"(person (name "Ada") (tags "pioneer" "mathematician"))"#)
        .unwrap();

    let dump = serde_json::to_value(session.facts()).unwrap();
    assert_eq!(dump[0]["template"], "person");
    assert_eq!(dump[0]["slots"]["name"], "Ada");
    assert_eq!(dump[0]["slots"]["tags"][0], "pioneer");
}
