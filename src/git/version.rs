use crate::error::{GitError, GitResult};
use crate::git::executor::GitRunner;

/// Minimum git version whose porcelain and format placeholders we rely on
const MIN_GIT_VERSION: (u32, u32) = (2, 20);

/// Represents a git version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    /// Ask the configured git binary for its version
    pub async fn detect(runner: &GitRunner) -> GitResult<Self> {
        let cwd = std::env::current_dir()?;
        let output = runner.run(&cwd, &["--version"]).await?;
        Self::parse(&output)
    }

    /// Parse git version from string like "git version 2.39.2"
    pub fn parse(version_str: &str) -> GitResult<Self> {
        let mut words = version_str.split_whitespace();
        let version_nums = match (words.next(), words.next(), words.next()) {
            (Some("git"), Some("version"), Some(nums)) => nums,
            _ => {
                return Err(GitError::ParseError(format!(
                    "Unexpected git version format: {}",
                    version_str.trim()
                )));
            }
        };

        let mut nums = version_nums.split('.');
        let major = parse_component(nums.next(), "major", version_nums)?;
        let minor = parse_component(nums.next(), "minor", version_nums)?;
        // Patch may carry a vendor suffix such as "2.windows"
        let patch = nums.next().and_then(|p| p.parse().ok()).unwrap_or(0);

        Ok(GitVersion {
            major,
            minor,
            patch,
        })
    }

    /// Check if this version meets minimum requirements
    pub fn is_supported(&self) -> bool {
        (self.major, self.minor) >= MIN_GIT_VERSION
    }

    /// Detect the installed version and refuse anything too old
    pub async fn validate(runner: &GitRunner) -> GitResult<Self> {
        let version = Self::detect(runner).await?;

        if !version.is_supported() {
            return Err(GitError::GitVersionTooOld(version.to_string()));
        }

        Ok(version)
    }
}

fn parse_component(part: Option<&str>, which: &str, whole: &str) -> GitResult<u32> {
    part.and_then(|p| p.parse().ok())
        .ok_or_else(|| GitError::ParseError(format!("Invalid {} version in {}", which, whole)))
}

impl std::fmt::Display for GitVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
