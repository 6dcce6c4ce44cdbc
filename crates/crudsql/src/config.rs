//! Configuration for the statement front-end.

use serde::Deserialize;

use crudsql_query::{DialectKind, UnknownDialect};

use crate::crud::Crud;

/// Environment variable naming the dialect, read by [`CrudConfig::from_env`].
pub const DIALECT_ENV: &str = "CRUDSQL_DIALECT";

/// Front-end configuration.
///
/// Deserializes from any serde format; missing fields take their defaults.
///
/// ```
/// use crudsql::{CrudConfig, DialectKind};
///
/// let config: CrudConfig = serde_json::from_str(r#"{"dialect": "sqlserver"}"#).unwrap();
/// assert_eq!(config.dialect, DialectKind::SqlServer);
/// assert_eq!(CrudConfig::default().dialect, DialectKind::Postgres);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct CrudConfig {
    /// SQL dialect statements are rendered for
    pub dialect: DialectKind,
}

impl CrudConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dialect.
    pub fn dialect(mut self, dialect: DialectKind) -> Self {
        self.dialect = dialect;
        self
    }

    /// Read the configuration from the environment.
    ///
    /// An unset or blank `CRUDSQL_DIALECT` keeps the default dialect.
    pub fn from_env() -> Result<Self, UnknownDialect> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, UnknownDialect> {
        let mut config = Self::default();
        if let Some(name) = lookup(DIALECT_ENV).filter(|v| !v.trim().is_empty()) {
            config.dialect = name.parse()?;
        }
        tracing::debug!(dialect = %config.dialect, "Loaded configuration");
        Ok(config)
    }

    /// A front-end with a fresh statement registry.
    pub fn build(self) -> Crud {
        Crud::new(self.dialect.dialect())
    }
}
