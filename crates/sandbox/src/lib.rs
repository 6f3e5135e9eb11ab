mod backend;
mod config;
mod error;
mod poller;
mod session;
mod throttle;
mod types;

pub use backend::ExecutionBackend;
pub use config::{Environment, SandboxConfig};
pub use error::{BackendError, BackendResult, Result, SessionError};
pub use session::{DEFAULT_POLL_INTERVAL, SandboxSessionManager};
pub use throttle::ThrottledBackend;
pub use types::{
    ComponentTest, InputValidation, SandboxId, SandboxMetrics, SandboxResult, SessionStatus,
    TestCaseResult, TestReport,
};
