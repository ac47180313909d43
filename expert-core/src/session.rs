//! The session surface a rule-engine binding must expose.
//!
//! The round-trip controller is written against these traits, not
//! against the bundled engine, so it works unchanged over any binding
//! that can declare constructs, assert facts from source syntax, run
//! forward chaining, and iterate working memory. Capabilities that
//! vary between bindings (diagnostic routers, attribute-style slot
//! access) have default implementations that report absence; callers
//! probe and fall back rather than branching on the binding type.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::router::Router;
use crate::syntax::SyntaxError;
use crate::value::SlotValue;

/// Errors surfaced by an engine binding.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("inference engine library is not available")]
    Unavailable,

    #[error("engine binding does not support {capability}")]
    Unsupported { capability: &'static str },

    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("malformed construct: {message}")]
    MalformedConstruct { message: String },

    #[error("unknown construct: {name}")]
    UnknownConstruct { name: String },

    #[error("unknown template: {name}")]
    UnknownTemplate { name: String },

    #[error("template {name} is already defined with a different shape")]
    TemplateConflict { name: String },

    #[error("template {template} has no slot named {slot}")]
    UnknownSlot { template: String, slot: String },

    #[error("malformed fact: {message}")]
    MalformedFact { message: String },

    #[error("fact is already asserted: {fact}")]
    DuplicateFact { fact: String },

    #[error("run exceeded {limit} rule firings without reaching fixpoint")]
    RunawayRun { limit: usize },
}

/// Failures reading an individual fact during extraction.
///
/// These are expected heterogeneity, not errors: callers skip the fact
/// or fall back to another access path.
#[derive(Debug, Clone, Error)]
pub enum FactAccessError {
    #[error("fact does not expose a template name")]
    NoTemplate,

    #[error("fact has no slot named {slot}")]
    NoSuchSlot { slot: String },

    #[error("slot access is not supported by this binding")]
    Unsupported,
}

/// Position of a fact in working memory, in assertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FactIndex(pub u64);

impl fmt::Display for FactIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f-{}", self.0)
    }
}

/// Unique identifier for an engine session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An isolated instance of engine state: templates, rules, and facts.
pub trait Session {
    /// Handle type for facts observed in this session's working memory.
    type Fact: FactView;

    fn id(&self) -> SessionId;

    /// Declare a template or rule from source syntax.
    fn build(&mut self, construct: &str) -> Result<(), EngineError>;

    /// Assert one fact literal into working memory.
    fn assert_string(&mut self, fact: &str) -> Result<FactIndex, EngineError>;

    /// Forward-chain to fixpoint. Returns the number of rule firings.
    fn run(&mut self) -> Result<usize, EngineError>;

    /// Snapshot of working memory in assertion order.
    fn facts(&self) -> Vec<Self::Fact>;

    /// Attach a diagnostic sink. Optional capability: bindings that
    /// cannot route diagnostics keep the default and the caller
    /// proceeds without one.
    fn add_router(&mut self, router: Box<dyn Router>) -> Result<(), EngineError> {
        let _ = router;
        Err(EngineError::Unsupported {
            capability: "diagnostic routers",
        })
    }
}

/// Read access to a single fact.
///
/// Bindings disagree on how slots are read; extraction probes `slot`,
/// then `attr`, then falls back to `render`.
pub trait FactView {
    /// The fact's template name. Fails for malformed or foreign facts,
    /// which callers skip silently.
    fn template_name(&self) -> Result<&str, FactAccessError>;

    /// Keyed/subscript slot access.
    fn slot(&self, name: &str) -> Result<SlotValue, FactAccessError>;

    /// Named-attribute slot access. Absent by default.
    fn attr(&self, name: &str) -> Option<SlotValue> {
        let _ = name;
        None
    }

    /// Generic source-syntax representation, the last-resort fallback.
    fn render(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_index_display() {
        assert_eq!(FactIndex(3).to_string(), "f-3");
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
