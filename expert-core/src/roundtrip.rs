//! The fact round trip: assert user input, run inference, extract.
//!
//! One operation, one linear state machine: register the result
//! template, normalize the input, assert it as a fact, run forward
//! chaining, then scan working memory for result facts. The first
//! three steps abort on failure; extraction is best-effort per fact
//! and never aborts the scan.

use thiserror::Error;

use crate::session::{EngineError, FactView, Session};
use crate::syntax;

/// Template registered for user input before each round trip.
pub const RESULT_TEMPLATE: &str = "(deftemplate result (slot name))";

/// Template name scanned for during extraction.
pub const RESULT_TEMPLATE_NAME: &str = "result";

/// Sentinel substituted for empty or whitespace-only input.
pub const NO_NAME_PLACEHOLDER: &str = "<no-name>";

/// Errors from a round-trip invocation. Each is fatal to the
/// invocation: no retry, no partial results.
#[derive(Debug, Error)]
pub enum RoundTripError {
    #[error("Failed to register result template: {0}")]
    TemplateRegistration(#[source] EngineError),

    #[error("Failed to assert fact: {0}")]
    Assertion(#[source] EngineError),

    #[error("Inference run failed: {0}")]
    Inference(#[source] EngineError),
}

/// Assert `user_text` as a result fact, run inference, and return the
/// extracted result values in working-memory order.
pub fn submit_and_infer<S: Session>(
    session: &mut S,
    user_text: &str,
) -> Result<Vec<String>, RoundTripError> {
    session
        .build(RESULT_TEMPLATE)
        .map_err(RoundTripError::TemplateRegistration)?;

    let value = normalize_input(user_text);
    let literal = format!("(result (name {}))", syntax::quote(value));
    let index = session
        .assert_string(&literal)
        .map_err(RoundTripError::Assertion)?;
    tracing::debug!(session = %session.id(), %index, "asserted input fact");

    let fired = session.run().map_err(RoundTripError::Inference)?;
    tracing::debug!(session = %session.id(), fired, "inference complete");

    Ok(extract_results(session))
}

/// Empty or whitespace-only input becomes the placeholder; anything
/// else passes through unchanged.
pub fn normalize_input(user_text: &str) -> &str {
    if user_text.trim().is_empty() {
        NO_NAME_PLACEHOLDER
    } else {
        user_text
    }
}

/// Scan working memory for result facts, probing access paths per
/// fact: keyed slot access, then attribute access, then the fact's
/// generic rendering. Facts without a readable template name are
/// skipped silently.
fn extract_results<S: Session>(session: &S) -> Vec<String> {
    let mut results = Vec::new();
    for fact in session.facts() {
        let template = match fact.template_name() {
            Ok(name) => name,
            Err(_) => continue,
        };
        if template != RESULT_TEMPLATE_NAME {
            continue;
        }

        let value = match fact.slot("name") {
            Ok(value) => Some(value),
            Err(_) => fact.attr("name"),
        };
        match value {
            Some(value) => results.push(value.as_text()),
            None => results.push(fact.render()),
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedFact, ScriptedSession};
    use crate::value::SlotValue;

    #[test]
    fn test_normalize_input() {
        assert_eq!(normalize_input("Alice"), "Alice");
        assert_eq!(normalize_input("  Alice  "), "  Alice  ");
        assert_eq!(normalize_input(""), NO_NAME_PLACEHOLDER);
        assert_eq!(normalize_input("   \t\n"), NO_NAME_PLACEHOLDER);
    }

    #[test]
    fn test_template_failure_stops_before_assertion() {
        let mut session = ScriptedSession::new().with_build_failure(EngineError::Unavailable);
        let err = submit_and_infer(&mut session, "Alice").unwrap_err();

        assert!(matches!(err, RoundTripError::TemplateRegistration(_)));
        assert!(session.asserted.is_empty());
        assert_eq!(session.runs, 0);
    }

    #[test]
    fn test_assertion_failure_stops_before_run() {
        let mut session = ScriptedSession::new().with_assert_failure(EngineError::MalformedFact {
            message: "bad literal".to_string(),
        });
        let err = submit_and_infer(&mut session, "Alice").unwrap_err();

        assert!(matches!(err, RoundTripError::Assertion(_)));
        assert!(err.to_string().starts_with("Failed to assert fact:"));
        assert_eq!(session.runs, 0);
    }

    #[test]
    fn test_run_failure_stops_before_extraction() {
        let mut session = ScriptedSession::new()
            .with_fact(ScriptedFact::keyed("Alice"))
            .with_run_failure(EngineError::RunawayRun { limit: 10 });
        let err = submit_and_infer(&mut session, "Alice").unwrap_err();

        assert!(matches!(err, RoundTripError::Inference(_)));
    }

    #[test]
    fn test_extraction_probes_keyed_then_attr_then_render() {
        let mut session = ScriptedSession::new()
            .with_fact(ScriptedFact::keyed("by-key"))
            .with_fact(ScriptedFact::attr_only("by-attr"))
            .with_fact(ScriptedFact::opaque("(result)"));

        let results = submit_and_infer(&mut session, "anything").unwrap();
        assert_eq!(results, vec!["by-key", "by-attr", "(result)"]);
    }

    #[test]
    fn test_extraction_skips_malformed_and_foreign_facts() {
        let mut session = ScriptedSession::new()
            .with_fact(ScriptedFact::malformed())
            .with_fact(ScriptedFact::foreign("greeting"))
            .with_fact(ScriptedFact::keyed("Alice"));

        let results = submit_and_infer(&mut session, "Alice").unwrap();
        assert_eq!(results, vec!["Alice"]);
    }

    #[test]
    fn test_asserted_literal_quotes_input() {
        let mut session = ScriptedSession::new();
        submit_and_infer(&mut session, r#"say "hi""#).unwrap();
        assert_eq!(session.asserted, vec![r#"(result (name "say \"hi\""))"#]);
    }

    #[test]
    fn test_multifield_value_extracts_as_joined_text() {
        let mut session = ScriptedSession::new().with_fact(ScriptedFact::with_value(
            SlotValue::Multi(vec![
                SlotValue::Str("Ada".to_string()),
                SlotValue::Str("Lovelace".to_string()),
            ]),
        ));

        let results = submit_and_infer(&mut session, "Ada Lovelace").unwrap();
        assert_eq!(results, vec!["Ada Lovelace"]);
    }
}
