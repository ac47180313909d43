//! Embeddable forward-chaining rule engine with a fact round-trip API.
//!
//! This crate provides:
//! - A session abstraction over rule-engine bindings (templates, fact
//!   assertion from source syntax, forward chaining, working-memory
//!   iteration)
//! - A bundled in-process engine speaking a CLIPS-like syntax
//! - A bootstrapper that checks engine availability and attaches
//!   diagnostic routing when the binding supports it
//! - The fact round trip: assert one templated fact from user input,
//!   run inference, and extract result values with per-fact fallbacks
//!
//! # Quick Start
//!
//! ```
//! use expert_core::{roundtrip, Bootstrapper};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Bootstrapper::new().create_session()?;
//!     let results = roundtrip::submit_and_infer(&mut session, "Alice")?;
//!     assert_eq!(results, vec!["Alice".to_string()]);
//!     Ok(())
//! }
//! ```

pub mod bootstrap;
pub mod environment;
pub mod roundtrip;
pub mod router;
pub mod session;
pub mod syntax;
pub mod testing;
pub mod value;

// Primary public API
pub use bootstrap::{BootstrapError, Bootstrapper, EnvironmentFactory, SessionFactory};
pub use environment::{Environment, FactRecord, SlotKind, SlotSpec, Template};
pub use roundtrip::{submit_and_infer, RoundTripError, NO_NAME_PLACEHOLDER, RESULT_TEMPLATE};
pub use router::{CaptureRouter, Router, TracingRouter};
pub use session::{EngineError, FactAccessError, FactIndex, FactView, Session, SessionId};
pub use value::SlotValue;
