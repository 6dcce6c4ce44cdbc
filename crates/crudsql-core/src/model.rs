//! Shape and Model traits: the declarative mapping consumed by the core.
//!
//! There is no runtime annotation discovery. A type states its properties by
//! implementing [`Shape`], and a type that maps to a table or view adds the
//! object path by implementing [`Model`].

use crate::property::Property;

/// A type with declared properties.
///
/// Every mapped model is a shape. Ad hoc payload structs used only as the
/// source of a partial change are shapes too; they do not need a table.
///
/// # Example
///
/// ```
/// use crudsql_core::{Property, Shape};
///
/// struct RenameHero {
///     name: String,
/// }
///
/// impl Shape for RenameHero {
///     fn properties() -> Vec<Property<Self>> {
///         vec![Property::readonly("Name", |p: &RenameHero| p.name.clone())]
///     }
/// }
///
/// assert_eq!(RenameHero::properties().len(), 1);
/// ```
pub trait Shape: Sized + Send + Sync + 'static {
    /// Declared properties in declaration order.
    fn properties() -> Vec<Property<Self>>;
}

/// A shape mapped to a database table or view.
///
/// ```
/// use crudsql_core::{Model, Property, Shape};
///
/// #[derive(Default)]
/// struct Hero {
///     id: i32,
///     name: String,
/// }
///
/// impl Shape for Hero {
///     fn properties() -> Vec<Property<Self>> {
///         vec![
///             Property::field("Id", |h: &Hero| &h.id, |h: &mut Hero| &mut h.id)
///                 .key()
///                 .generated(),
///             Property::field("Name", |h: &Hero| &h.name, |h: &mut Hero| &mut h.name),
///         ]
///     }
/// }
///
/// impl Model for Hero {
///     const TABLE_NAME: &'static str = "Heroes";
///     const SCHEMA_NAME: Option<&'static str> = Some("league");
/// }
///
/// assert_eq!(Hero::TABLE_NAME, "Heroes");
/// assert_eq!(Hero::DATABASE_NAME, None);
/// ```
pub trait Model: Shape {
    /// The name of the table or view.
    const TABLE_NAME: &'static str;

    /// Explicit schema; `None` falls back to the dialect's default schema.
    const SCHEMA_NAME: Option<&'static str> = None;

    /// Explicit database; `None` addresses the connection's current database.
    const DATABASE_NAME: Option<&'static str> = None;
}
