//! Core types and traits for crudsql.
//!
//! This crate holds the leaf abstractions the statement compiler and the
//! change tracker are built on:
//!
//! - `Shape` and `Model` traits, the declarative mapping of a type
//! - `Property` declarations and the immutable `PropertyDescriptor`
//! - `ObjectIdentity` for database/schema/table paths
//! - the process-lifetime accessor cache (`accessor`)
//! - `ChangeSet`, the output of change tracking
//! - `Value` and the error taxonomy

pub mod accessor;
pub mod changeset;
pub mod error;
pub mod identity;
pub mod model;
pub mod params;
pub mod property;
pub mod value;

pub use accessor::{AccessorCache, Accessors, PropertyAccessor, accessor, accessors};
pub use changeset::ChangeSet;
pub use error::{ConfigError, ConfigErrorKind, Error, LookupError, Result, TypeError};
pub use identity::ObjectIdentity;
pub use model::{Model, Shape};
pub use params::{PARAM_SIGIL, bind, parameter_name};
pub use property::{Property, PropertyDescriptor, PropertyFlags};
pub use value::Value;
