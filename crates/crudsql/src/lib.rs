//! Cached, dialect-aware CRUD statement generation.
//!
//! `crudsql` is the facade crate. It re-exports the mapping traits and value
//! types from `crudsql-core`, the dialects and statement sets from
//! `crudsql-query` and the change tracker from `crudsql-tracker`, and adds a
//! small front-end that pairs cached SQL text with bound parameter values.
//!
//! # Example
//!
//! ```
//! use crudsql::prelude::*;
//!
//! #[derive(Default)]
//! struct Hero {
//!     id: i64,
//!     name: String,
//!     age: Option<i32>,
//! }
//!
//! impl Shape for Hero {
//!     fn properties() -> Vec<Property<Self>> {
//!         vec![
//!             Property::field("Id", |h: &Hero| &h.id, |h: &mut Hero| &mut h.id)
//!                 .key()
//!                 .generated(),
//!             Property::field("Name", |h: &Hero| &h.name, |h: &mut Hero| &mut h.name),
//!             Property::field("Age", |h: &Hero| &h.age, |h: &mut Hero| &mut h.age),
//!         ]
//!     }
//! }
//!
//! impl Model for Hero {
//!     const TABLE_NAME: &'static str = "heroes";
//! }
//!
//! let crud = CrudConfig::new().dialect(DialectKind::Sqlite).build();
//! let hero = Hero { id: 1, name: "Spider-Man".into(), age: None };
//!
//! let insert = crud.insert(&hero).unwrap();
//! assert_eq!(
//!     insert.sql(),
//!     r#"INSERT INTO "main"."heroes" ("Name", "Age") VALUES (@Name, @Age) RETURNING "Id" AS "Id", "Name" AS "Name", "Age" AS "Age""#
//! );
//!
//! // partial update from a sparse patch
//! let mut current = hero;
//! let changes = current.set_properties(&Hero { age: Some(26), ..Hero::default() }).unwrap();
//! let update = crud.update_changes(&changes).unwrap();
//! assert_eq!(
//!     update.sql(),
//!     r#"UPDATE "main"."heroes" SET "Age" = @Age WHERE "Id" = @Id RETURNING "Id" AS "Id", "Name" AS "Name", "Age" AS "Age""#
//! );
//! ```

pub mod config;
pub mod crud;
pub mod global;

pub use config::{CrudConfig, DIALECT_ENV};
pub use crud::{Crud, Statement};

pub use crudsql_core::{
    AccessorCache, ChangeSet, ConfigError, ConfigErrorKind, Error, LookupError, Model,
    ObjectIdentity, PARAM_SIGIL, Property, PropertyAccessor, PropertyDescriptor, PropertyFlags,
    Result, Shape, TypeError, Value, bind, parameter_name,
};
pub use crudsql_query::{
    Dialect, DialectKind, OutputStyle, Postgres, Schema, SqlServer, Sqlite, StatementKind,
    StatementRegistry, StatementSet, UnknownDialect,
};
pub use crudsql_tracker::{ChangeTracker, SetProperties};

/// Common imports.
///
/// ```
/// use crudsql::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ChangeSet, ChangeTracker, Crud, CrudConfig, Dialect, DialectKind, Error, Model, Property,
        Result, SetProperties, Shape, Statement, StatementKind, Value,
    };
}
