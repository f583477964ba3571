pub mod config;
pub mod error;
pub mod git;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigError};
pub use error::{AppError, AppResult, GitError, GitResult};
pub use git::{GitRunner, GitVersion, RunnerOptions};
pub use protocol::Message;
pub use server::Server;
pub use tools::ToolContext;
pub use transport::{SseOptions, SseTransport, StdioTransport, Transport, TransportError};
