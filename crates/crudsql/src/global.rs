//! One-time, process-wide dialect selection.
//!
//! The dialect is chosen once per process, either explicitly through
//! [`configure`] or implicitly (the default, PostgreSQL) by the first call to
//! [`global`]. After that the choice is fixed.
//!
//! ```
//! use crudsql::{CrudConfig, DialectKind, global};
//!
//! global::configure(CrudConfig::new().dialect(DialectKind::SqlServer));
//! assert_eq!(global::global_dialect(), Some(DialectKind::SqlServer));
//! assert_eq!(global::global().dialect().name(), "sqlserver");
//!
//! // already chosen
//! assert!(!global::configure(CrudConfig::new().dialect(DialectKind::Sqlite)));
//! ```

use std::sync::OnceLock;

use crudsql_query::DialectKind;

use crate::config::CrudConfig;
use crate::crud::Crud;

static DIALECT: OnceLock<DialectKind> = OnceLock::new();
static CRUD: OnceLock<Crud> = OnceLock::new();

/// Select the process-wide dialect.
///
/// Returns `false`, leaving the earlier choice in place, if a dialect was
/// already selected.
pub fn configure(config: CrudConfig) -> bool {
    let accepted = DIALECT.set(config.dialect).is_ok();
    if accepted {
        tracing::debug!(dialect = %config.dialect, "Selected process-wide dialect");
    } else {
        tracing::warn!(
            requested = %config.dialect,
            active = ?DIALECT.get(),
            "Process-wide dialect already selected; ignoring"
        );
    }
    accepted
}

/// The selected dialect, if one has been chosen.
#[must_use]
pub fn global_dialect() -> Option<DialectKind> {
    DIALECT.get().copied()
}

/// The process-wide front-end, bound to the selected dialect.
pub fn global() -> &'static Crud {
    CRUD.get_or_init(|| {
        let kind = *DIALECT.get_or_init(|| CrudConfig::default().dialect);
        CrudConfig::new().dialect(kind).build()
    })
}
