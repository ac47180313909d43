//! Testing utilities.
//!
//! This module provides tools for integration testing:
//! - `ScriptedSession` for exercising the round trip against scripted
//!   failures and heterogeneous fact handles, without the bundled engine
//! - `TestHarness` for complete round trips over the bundled engine
//! - Assertion helpers for verifying result sequences

use crate::bootstrap::{Bootstrapper, SessionFactory};
use crate::roundtrip::{self, RoundTripError, RESULT_TEMPLATE};
use crate::router::Router;
use crate::session::{EngineError, FactAccessError, FactIndex, FactView, Session, SessionId};
use crate::syntax;
use crate::value::SlotValue;

/// A fact handle with scripted access behavior.
///
/// Each constructor produces a different access shape so tests can
/// drive every branch of the extraction fallback ladder.
#[derive(Debug, Clone)]
pub struct ScriptedFact {
    pub template: Option<String>,
    pub keyed: Option<SlotValue>,
    pub attr: Option<SlotValue>,
    pub rendered: String,
}

impl ScriptedFact {
    /// A result fact readable through keyed slot access.
    pub fn keyed(value: &str) -> Self {
        Self {
            template: Some("result".to_string()),
            keyed: Some(SlotValue::Str(value.to_string())),
            attr: None,
            rendered: format!("(result (name {}))", syntax::quote(value)),
        }
    }

    /// A result fact readable only through attribute access.
    pub fn attr_only(value: &str) -> Self {
        Self {
            template: Some("result".to_string()),
            keyed: None,
            attr: Some(SlotValue::Str(value.to_string())),
            rendered: format!("(result (name {}))", syntax::quote(value)),
        }
    }

    /// A result fact with no readable slots at all.
    pub fn opaque(rendered: &str) -> Self {
        Self {
            template: Some("result".to_string()),
            keyed: None,
            attr: None,
            rendered: rendered.to_string(),
        }
    }

    /// A fact belonging to some other template.
    pub fn foreign(template: &str) -> Self {
        Self {
            template: Some(template.to_string()),
            keyed: None,
            attr: None,
            rendered: format!("({template})"),
        }
    }

    /// A fact whose template name cannot be read.
    pub fn malformed() -> Self {
        Self {
            template: None,
            keyed: None,
            attr: None,
            rendered: "<malformed fact>".to_string(),
        }
    }

    /// A result fact carrying an arbitrary keyed value.
    pub fn with_value(value: SlotValue) -> Self {
        Self {
            template: Some("result".to_string()),
            keyed: Some(value),
            attr: None,
            rendered: "(result)".to_string(),
        }
    }
}

impl FactView for ScriptedFact {
    fn template_name(&self) -> Result<&str, FactAccessError> {
        self.template.as_deref().ok_or(FactAccessError::NoTemplate)
    }

    fn slot(&self, name: &str) -> Result<SlotValue, FactAccessError> {
        if name == "name" {
            if let Some(value) = &self.keyed {
                return Ok(value.clone());
            }
        }
        Err(FactAccessError::NoSuchSlot {
            slot: name.to_string(),
        })
    }

    fn attr(&self, name: &str) -> Option<SlotValue> {
        if name == "name" {
            self.attr.clone()
        } else {
            None
        }
    }

    fn render(&self) -> String {
        self.rendered.clone()
    }
}

/// A session that records operations and fails on script.
#[derive(Debug, Clone)]
pub struct ScriptedSession {
    id: SessionId,
    supports_router: bool,
    /// Set when a router was accepted.
    pub router_attached: bool,
    fail_build: Option<EngineError>,
    fail_assert: Option<EngineError>,
    fail_run: Option<EngineError>,
    /// Constructs passed to `build`, in order.
    pub built: Vec<String>,
    /// Fact literals passed to `assert_string`, in order.
    pub asserted: Vec<String>,
    /// Number of completed `run` calls.
    pub runs: usize,
    facts: Vec<ScriptedFact>,
    next_index: u64,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            supports_router: true,
            router_attached: false,
            fail_build: None,
            fail_assert: None,
            fail_run: None,
            built: Vec::new(),
            asserted: Vec::new(),
            runs: 0,
            facts: Vec::new(),
            next_index: 1,
        }
    }

    /// Pretend this binding cannot route diagnostics.
    pub fn without_router_support(mut self) -> Self {
        self.supports_router = false;
        self
    }

    /// Fail the next `build` call with the given error.
    pub fn with_build_failure(mut self, error: EngineError) -> Self {
        self.fail_build = Some(error);
        self
    }

    /// Fail the next `assert_string` call with the given error.
    pub fn with_assert_failure(mut self, error: EngineError) -> Self {
        self.fail_assert = Some(error);
        self
    }

    /// Fail the next `run` call with the given error.
    pub fn with_run_failure(mut self, error: EngineError) -> Self {
        self.fail_run = Some(error);
        self
    }

    /// Add a fact to the scripted working memory.
    pub fn with_fact(mut self, fact: ScriptedFact) -> Self {
        self.facts.push(fact);
        self
    }
}

impl Default for ScriptedSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for ScriptedSession {
    type Fact = ScriptedFact;

    fn id(&self) -> SessionId {
        self.id
    }

    fn build(&mut self, construct: &str) -> Result<(), EngineError> {
        if let Some(error) = self.fail_build.take() {
            return Err(error);
        }
        self.built.push(construct.to_string());
        Ok(())
    }

    fn assert_string(&mut self, fact: &str) -> Result<FactIndex, EngineError> {
        if let Some(error) = self.fail_assert.take() {
            return Err(error);
        }
        self.asserted.push(fact.to_string());
        let index = FactIndex(self.next_index);
        self.next_index += 1;
        Ok(index)
    }

    fn run(&mut self) -> Result<usize, EngineError> {
        if let Some(error) = self.fail_run.take() {
            return Err(error);
        }
        self.runs += 1;
        Ok(0)
    }

    fn facts(&self) -> Vec<ScriptedFact> {
        self.facts.clone()
    }

    fn add_router(&mut self, router: Box<dyn Router>) -> Result<(), EngineError> {
        let _ = router;
        if !self.supports_router {
            return Err(EngineError::Unsupported {
                capability: "diagnostic routers",
            });
        }
        self.router_attached = true;
        Ok(())
    }
}

/// Factory producing clones of a prototype scripted session.
#[derive(Debug, Clone)]
pub struct ScriptedFactory {
    available: bool,
    prototype: ScriptedSession,
}

impl ScriptedFactory {
    /// An available binding handing out fresh scripted sessions.
    pub fn new() -> Self {
        Self::with_session(ScriptedSession::new())
    }

    /// A binding whose engine library is missing.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            prototype: ScriptedSession::new(),
        }
    }

    /// An available binding handing out clones of `session`.
    pub fn with_session(session: ScriptedSession) -> Self {
        Self {
            available: true,
            prototype: session,
        }
    }
}

impl Default for ScriptedFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionFactory for ScriptedFactory {
    type Session = ScriptedSession;

    fn available(&self) -> bool {
        self.available
    }

    fn create(&self) -> Result<ScriptedSession, EngineError> {
        if !self.available {
            return Err(EngineError::Unavailable);
        }
        Ok(self.prototype.clone())
    }
}

/// Runs complete round trips against the bundled engine.
///
/// Extra constructs (rules, additional templates) are loaded into every
/// session after the result template, so rules may match on it.
pub struct TestHarness {
    constructs: Vec<String>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            constructs: Vec::new(),
        }
    }

    /// Load a construct into every session before the round trip.
    pub fn with_construct(mut self, construct: &str) -> Self {
        self.constructs.push(construct.to_string());
        self
    }

    /// Bootstrap a fresh session and run one complete round trip.
    pub fn round_trip(&self, input: &str) -> Result<Vec<String>, RoundTripError> {
        let mut session = Bootstrapper::new()
            .create_session()
            .expect("bundled engine is always available");
        session
            .build(RESULT_TEMPLATE)
            .map_err(RoundTripError::TemplateRegistration)?;
        for construct in &self.constructs {
            session
                .build(construct)
                .map_err(RoundTripError::TemplateRegistration)?;
        }
        roundtrip::submit_and_infer(&mut session, input)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the first extracted result equals `expected`.
#[track_caller]
pub fn assert_first_result(results: &[String], expected: &str) {
    assert_eq!(
        results.first().map(String::as_str),
        Some(expected),
        "Expected first result {expected:?}, got {results:?}"
    );
}

/// Assert the round trip produced no results.
#[track_caller]
pub fn assert_no_results(results: &[String]) {
    assert!(results.is_empty(), "Expected no results, got {results:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_basic_round_trip() {
        let results = TestHarness::new().round_trip("Alice").unwrap();
        assert_first_result(&results, "Alice");
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_harness_with_rule() {
        let results = TestHarness::new()
            .with_construct("(deftemplate greeting (slot text))")
            .with_construct("(defrule greet (result (name ?n)) => (assert (greeting (text ?n))))")
            .round_trip("Alice")
            .unwrap();

        // Only result facts are extracted; the greeting stays behind.
        assert_eq!(results, vec!["Alice"]);
    }

    #[test]
    fn test_scripted_session_records_operations() {
        let mut session = ScriptedSession::new();
        session.build(RESULT_TEMPLATE).unwrap();
        session.assert_string("(result (name \"x\"))").unwrap();
        session.run().unwrap();

        assert_eq!(session.built.len(), 1);
        assert_eq!(session.asserted.len(), 1);
        assert_eq!(session.runs, 1);
    }
}
