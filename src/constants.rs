//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Resilient client constants
pub mod chain {
    /// Default maximum retries per provider (attempts = retries + 1)
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (milliseconds); wait = base * 2^attempt
    pub const BASE_DELAY_MS: u64 = 150;
}

/// Provider request constants
pub mod provider {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Default model name
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

    /// Output token cap sent to providers that require one
    pub const MAX_OUTPUT_TOKENS: u32 = 1024;

    /// Characters of prompt echoed by the mock provider
    pub const MOCK_PROMPT_PREFIX_CHARS: usize = 180;

    /// Provider names accepted in configuration
    pub const SUPPORTED: &[&str] = &[
        "mock",
        "openai",
        "anthropic",
        "google",
        "gemini",
        "groq",
        "ollama",
    ];

    /// Providers that cannot run without an API key
    pub const REQUIRES_API_KEY: &[&str] = &["openai", "anthropic", "google", "gemini", "groq"];
}

/// Prompt and generated-content limits
pub mod content {
    /// Maximum characters of diff context embedded in a prompt
    pub const MAX_DIFF_CONTEXT_CHARS: usize = 3000;

    /// Maximum characters of generated section content
    pub const MAX_SECTION_CHARS: usize = 25_000;

    /// Section used when no mapping names one
    pub const DEFAULT_SECTION: &str = "Recent Changes";

    /// Doc file used when none are configured
    pub const FALLBACK_DOC_FILE: &str = "README.md";

    /// Permission bits for rewritten doc files
    pub const DOC_FILE_MODE: u32 = 0o644;
}

/// Source control constants
pub mod git {
    /// Substitution token in the doc commit template
    pub const HASH_TOKEN: &str = "{hash}";

    /// Default doc commit message template
    pub const DEFAULT_COMMIT_TEMPLATE: &str = "docs: auto-update for {hash}";
}

/// State directory layout (relative to the repository root)
pub mod state {
    /// Tool data directory
    pub const DATA_DIR: &str = ".git-doc";

    /// Config file path
    pub const CONFIG_PATH: &str = ".git-doc/config.toml";

    /// State database path
    pub const DB_PATH: &str = ".git-doc/state.db";

    /// Run lock file name inside the data directory
    pub const LOCK_FILE: &str = "run.lock";

    /// Row limit for status listings when none is given
    pub const DEFAULT_LIST_LIMIT: usize = 25;
}
