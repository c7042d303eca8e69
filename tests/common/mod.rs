//! Shared test support: a wiremock-backed controller stub.
//!
//! The library is blocking by design; the stub runs on its own tokio
//! runtime while tests drive the blocking client from the test thread.

use ndfc_rest::ControllerConfig;
use wiremock::{Mock, MockServer};

pub struct MockController {
    runtime: tokio::runtime::Runtime,
    pub server: MockServer,
}

impl MockController {
    pub fn start() -> Self {
        let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
        let server = runtime.block_on(MockServer::start());
        Self { runtime, server }
    }

    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(self.server.register(mock));
    }

    /// Number of requests the stub has received so far.
    pub fn request_count(&self) -> usize {
        self.runtime
            .block_on(self.server.received_requests())
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    pub fn config(&self) -> ControllerConfig {
        ControllerConfig {
            host: self.server.uri(),
            timeout_secs: 5,
            ..ControllerConfig::default()
        }
    }
}
