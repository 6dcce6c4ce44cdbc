//! Object identity: the database/schema/table path of a mapped object.

use std::fmt;

/// The path addressing a table or view: `[database?, schema?, table]`.
///
/// The table segment is always present. Whether the other two appear depends
/// on the mapping and on the dialect's schema policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectIdentity {
    pub database: Option<&'static str>,
    pub schema: Option<&'static str>,
    pub table: &'static str,
}

impl ObjectIdentity {
    pub const fn new(table: &'static str) -> Self {
        Self {
            database: None,
            schema: None,
            table,
        }
    }

    pub const fn with_schema(mut self, schema: Option<&'static str>) -> Self {
        self.schema = schema;
        self
    }

    pub const fn with_database(mut self, database: Option<&'static str>) -> Self {
        self.database = database;
        self
    }

    /// Present path segments, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = &'static str> {
        [self.database, self.schema, Some(self.table)]
            .into_iter()
            .flatten()
    }

    /// Render the path with each segment passed through `quote`.
    ///
    /// ```
    /// use crudsql_core::ObjectIdentity;
    ///
    /// let id = ObjectIdentity::new("heroes").with_schema(Some("public"));
    /// assert_eq!(id.qualified(|s| format!("<{s}>")), "<public>.<heroes>");
    /// ```
    pub fn qualified(&self, quote: impl Fn(&str) -> String) -> String {
        self.segments()
            .map(|segment| quote(segment))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified(|s| s.to_string()))
    }
}
