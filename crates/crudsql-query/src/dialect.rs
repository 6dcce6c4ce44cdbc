//! SQL dialects.
//!
//! A dialect only decides how identifiers are quoted, how the returned row is
//! requested and which schema an unqualified mapping lands in. Every statement
//! shape, column selection rule and error condition lives in
//! [`statement`](crate::statement) and is shared by all dialects.

use std::any::Any;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a dialect asks for the affected row to be returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    /// `... RETURNING <projection>` at the end of the statement
    Returning,
    /// `OUTPUT <projection>` ahead of `VALUES` / `WHERE`
    Output,
}

impl OutputStyle {
    pub const fn keyword(self) -> &'static str {
        match self {
            OutputStyle::Returning => "RETURNING",
            OutputStyle::Output => "OUTPUT",
        }
    }
}

/// Capability interface for a target SQL surface.
///
/// The statement registry keys cached statements by the implementing type,
/// so two dialect types never share statements even if their names collide.
pub trait Dialect: Any + fmt::Debug + Send + Sync {
    /// Stable identifier used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Quote a table, schema, database or column identifier.
    fn quote_identifier(&self, name: &str) -> String;

    /// Schema used when a mapping does not name one.
    fn default_schema(&self) -> Option<&'static str>;

    /// Where and how the returned row is requested.
    fn output_style(&self) -> OutputStyle;

    /// Reference to a column of the affected row inside the output clause.
    fn output_column(&self, column: &str) -> String {
        self.quote_identifier(column)
    }

    /// Whether a mapping may address an object in another database.
    fn supports_cross_database(&self) -> bool {
        true
    }
}

/// PostgreSQL (`"ident"`, `RETURNING`, schema `public`).
///
/// ```
/// use crudsql_query::{Dialect, Postgres};
///
/// assert_eq!(Postgres.quote_identifier("user\"name"), "\"user\"\"name\"");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn default_schema(&self) -> Option<&'static str> {
        Some("public")
    }

    fn output_style(&self) -> OutputStyle {
        OutputStyle::Returning
    }

    // a session is bound to one database; other databases are unreachable
    fn supports_cross_database(&self) -> bool {
        false
    }
}

/// Microsoft SQL Server (`[ident]`, `OUTPUT INSERTED.`, schema `dbo`).
///
/// ```
/// use crudsql_query::{Dialect, SqlServer};
///
/// assert_eq!(SqlServer.quote_identifier("a]b"), "[a]]b]");
/// assert_eq!(SqlServer.output_column("Name"), "INSERTED.[Name]");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServer;

impl Dialect for SqlServer {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn default_schema(&self) -> Option<&'static str> {
        Some("dbo")
    }

    fn output_style(&self) -> OutputStyle {
        OutputStyle::Output
    }

    fn output_column(&self, column: &str) -> String {
        format!("INSERTED.{}", self.quote_identifier(column))
    }
}

/// SQLite 3.35+ (`"ident"`, `RETURNING`, schema `main`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn default_schema(&self) -> Option<&'static str> {
        Some("main")
    }

    fn output_style(&self) -> OutputStyle {
        OutputStyle::Returning
    }

    // attached databases are addressed as schemas, not a separate segment
    fn supports_cross_database(&self) -> bool {
        false
    }
}

/// The built-in dialects, selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Postgres,
    SqlServer,
    Sqlite,
}

static POSTGRES: Postgres = Postgres;
static SQL_SERVER: SqlServer = SqlServer;
static SQLITE: Sqlite = Sqlite;

impl DialectKind {
    /// The shared dialect instance for this kind.
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            DialectKind::Postgres => &POSTGRES,
            DialectKind::SqlServer => &SQL_SERVER,
            DialectKind::Sqlite => &SQLITE,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DialectKind::Postgres => "postgres",
            DialectKind::SqlServer => "sqlserver",
            DialectKind::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a dialect name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDialect(pub String);

impl fmt::Display for UnknownDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown SQL dialect '{}'", self.0)
    }
}

impl std::error::Error for UnknownDialect {}

impl FromStr for DialectKind {
    type Err = UnknownDialect;

    /// Parse a dialect name (case-insensitive, common aliases accepted).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" | "pgsql" => Ok(DialectKind::Postgres),
            "sqlserver" | "mssql" | "sqlclient" | "tsql" => Ok(DialectKind::SqlServer),
            "sqlite" | "sqlite3" => Ok(DialectKind::Sqlite),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}
