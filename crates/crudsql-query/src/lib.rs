//! Dialect-parameterized CRUD statement assembly for crudsql.
//!
//! `crudsql-query` is the **statement compilation layer**. It reflects a
//! [`Model`](crudsql_core::Model) into a [`Schema`], renders the canonical
//! insert, update, delete and find-by-key statements once per
//! `(model, dialect)` pair and keeps them in a [`StatementRegistry`].
//!
//! # Role In The Architecture
//!
//! - **Dialects**: [`Postgres`], [`SqlServer`] and [`Sqlite`] supply quoting,
//!   output-clause grammar and a default schema. Nothing else varies.
//! - **Statement sets**: [`StatementSet`] holds the rendered text and
//!   assembles partial statements from changed property names.
//! - **Registry**: [`StatementRegistry`] builds each set exactly once, even
//!   under concurrent first access.
//!
//! Execution of the rendered text is left to the caller.

pub mod dialect;
pub mod registry;
pub mod schema;
pub mod statement;

pub use dialect::{Dialect, DialectKind, OutputStyle, Postgres, SqlServer, Sqlite, UnknownDialect};
pub use registry::StatementRegistry;
pub use schema::Schema;
pub use statement::{StatementKind, StatementSet};
