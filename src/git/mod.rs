pub mod executor;
pub mod parser;
pub mod version;

// Re-export commonly used types
pub use executor::{GitRunner, RunnerOptions};
pub use parser::{
    BlameLine, BranchEntry, BranchStatus, CommitResult, DiffResult, DiffStat, DiffSummary,
    LogEntry, RemoteEntry, ShowResult, StatusEntry, StatusResult,
};
pub use version::GitVersion;
