//! Session bootstrapping.
//!
//! The bootstrapper performs the one-time engine availability check,
//! allocates a fresh session, and attaches a diagnostic router when the
//! binding supports one. Router absence is degraded diagnostics, not an
//! error.

use thiserror::Error;

use crate::environment::Environment;
use crate::router::TracingRouter;
use crate::session::{EngineError, Session};

/// Errors from session bootstrapping.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("inference engine library is not available")]
    EngineUnavailable,
}

/// Produces engine sessions for a particular binding.
pub trait SessionFactory {
    type Session: Session;

    /// Explicit capability check. When this returns false no other
    /// operation may proceed.
    fn available(&self) -> bool;

    fn create(&self) -> Result<Self::Session, EngineError>;
}

/// Factory for the bundled in-process engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentFactory;

impl SessionFactory for EnvironmentFactory {
    type Session = Environment;

    fn available(&self) -> bool {
        true
    }

    fn create(&self) -> Result<Environment, EngineError> {
        Ok(Environment::new())
    }
}

/// Creates fresh sessions, one per user action.
pub struct Bootstrapper<F = EnvironmentFactory> {
    factory: F,
}

impl Bootstrapper {
    /// Bootstrapper over the bundled engine.
    pub fn new() -> Self {
        Self {
            factory: EnvironmentFactory,
        }
    }
}

impl Default for Bootstrapper {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: SessionFactory> Bootstrapper<F> {
    /// Bootstrapper over a custom binding.
    pub fn with_factory(factory: F) -> Self {
        Self { factory }
    }

    /// Allocate a new, empty session. Single attempt, no retries.
    pub fn create_session(&self) -> Result<F::Session, BootstrapError> {
        if !self.factory.available() {
            return Err(BootstrapError::EngineUnavailable);
        }

        let mut session = self.factory.create().map_err(|error| {
            tracing::error!(%error, "engine session creation failed");
            BootstrapError::EngineUnavailable
        })?;

        match session.add_router(Box::new(TracingRouter)) {
            Ok(()) => {
                tracing::debug!(session = %session.id(), "diagnostic router attached");
            }
            Err(EngineError::Unsupported { capability }) => {
                tracing::debug!(
                    session = %session.id(),
                    capability,
                    "binding lacks router support, continuing without diagnostics"
                );
            }
            Err(error) => {
                tracing::warn!(
                    session = %session.id(),
                    %error,
                    "router attachment failed, continuing without diagnostics"
                );
            }
        }

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedFactory, ScriptedSession};

    #[test]
    fn test_create_session_on_bundled_engine() {
        let session = Bootstrapper::new().create_session().unwrap();
        assert_eq!(session.facts().len(), 0);
    }

    #[test]
    fn test_unavailable_engine_blocks_bootstrap() {
        let bootstrapper = Bootstrapper::with_factory(ScriptedFactory::unavailable());
        let err = bootstrapper.create_session().unwrap_err();
        assert!(matches!(err, BootstrapError::EngineUnavailable));
        assert!(err.to_string().contains("not available"));
    }

    #[test]
    fn test_router_attached_when_supported() {
        let bootstrapper = Bootstrapper::with_factory(ScriptedFactory::new());
        let session = bootstrapper.create_session().unwrap();
        assert!(session.router_attached);
    }

    #[test]
    fn test_missing_router_capability_is_tolerated() {
        let factory = ScriptedFactory::with_session(ScriptedSession::new().without_router_support());
        let session = Bootstrapper::with_factory(factory).create_session().unwrap();
        assert!(!session.router_attached);
    }
}
