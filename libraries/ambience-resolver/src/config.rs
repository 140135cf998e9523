//! Resolver configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default helper program
pub const DEFAULT_PROGRAM: &str = "yt-dlp";

/// Default format selector passed to the helper
pub const DEFAULT_FORMAT: &str = "bestaudio";

/// Default program used to locate the helper on the search path
pub const DEFAULT_LOCATE_PROGRAM: &str = "which";

/// How the external helper is invoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Helper executable (default: `yt-dlp`)
    pub program: PathBuf,

    /// Format selector for `-f` (default: `bestaudio`)
    pub format: String,

    /// Program probing for the helper (default: `which`)
    pub locate_program: PathBuf,

    /// Upper bound on one resolution (default: none)
    pub timeout: Option<Duration>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            format: DEFAULT_FORMAT.to_string(),
            locate_program: PathBuf::from(DEFAULT_LOCATE_PROGRAM),
            timeout: None,
        }
    }
}

impl ResolverConfig {
    /// Use a different helper executable
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Bound each resolution by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Arguments for one resolution of `locator`
    pub(crate) fn resolve_args<'a>(&'a self, locator: &'a str) -> [&'a str; 4] {
        ["-f", self.format.as_str(), "--get-url", locator]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_yt_dlp() {
        let config = ResolverConfig::default();
        assert_eq!(config.program, PathBuf::from("yt-dlp"));
        assert_eq!(config.locate_program, PathBuf::from("which"));
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn resolve_args_request_best_audio_url() {
        let config = ResolverConfig::default();
        assert_eq!(
            config.resolve_args("https://video/xyz"),
            ["-f", "bestaudio", "--get-url", "https://video/xyz"]
        );
    }
}
