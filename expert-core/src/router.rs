//! Diagnostic routers: sinks for engine-internal output.

use std::sync::{Arc, Mutex};

/// A sink for engine diagnostics (assertions, rule firings).
pub trait Router: Send {
    /// Route one line of diagnostic output.
    fn route(&mut self, line: &str);
}

/// Router that forwards engine diagnostics to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRouter;

impl Router for TracingRouter {
    fn route(&mut self, line: &str) {
        tracing::debug!(target: "expert_core::engine", "{line}");
    }
}

/// Router that collects diagnostics in memory.
///
/// Clones share the same buffer, so a clone kept outside the session
/// can inspect what the engine routed.
#[derive(Debug, Default, Clone)]
pub struct CaptureRouter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CaptureRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines routed so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }
}

impl Router for CaptureRouter {
    fn route(&mut self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_router_shares_buffer() {
        let capture = CaptureRouter::new();
        let mut clone = capture.clone();
        clone.route("==> f-1 (result (name \"Alice\"))");
        assert_eq!(capture.lines(), vec!["==> f-1 (result (name \"Alice\"))"]);
    }
}
