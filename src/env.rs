//! Runtime environment detection.
//!
//! Single source of truth for the runtime environment (test, development,
//! production) based on the `EMBED_ENV` environment variable.
//!
//! # Environment Variable
//!
//! Set `EMBED_ENV` to one of:
//! - `test` - Test mode (config resolves to a temp-friendly directory)
//! - `development` or `dev` - Development mode (debug signals are logged)
//! - (anything else or unset) - Production mode

/// Runtime environment for the embedding host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production environment (default).
    Production,
    /// Development environment.
    Development,
    /// Test environment.
    Test,
}

impl Environment {
    /// Detect current environment from `EMBED_ENV`.
    #[must_use]
    pub fn current() -> Self {
        Self::parse(std::env::var("EMBED_ENV").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("test") => Self::Test,
            Some("development" | "dev") => Self::Development,
            _ => Self::Production,
        }
    }

    /// Returns `true` if this is the test environment.
    #[must_use]
    pub fn is_test(self) -> bool {
        self == Self::Test
    }

    /// Returns `true` if this is the development environment.
    #[must_use]
    pub fn is_development(self) -> bool {
        self == Self::Development
    }

    /// Returns `true` if this is the production environment.
    #[must_use]
    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Development => write!(f, "development"),
            Self::Test => write!(f, "test"),
        }
    }
}
