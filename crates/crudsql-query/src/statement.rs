//! CRUD statement assembly.
//!
//! Each statement shape is written once here and parameterized over a
//! [`Dialect`]. A [`StatementSet`] renders the canonical statements of one
//! model under one dialect when it is built and never changes afterwards;
//! partial statements are assembled on demand from a changeset's names.
//!
//! Shapes (Returning style / Output style):
//!
//! ```text
//! INSERT INTO t (c..) VALUES (@p..) RETURNING proj    INSERT INTO t (c..) OUTPUT proj VALUES (@p..)
//! INSERT INTO t DEFAULT VALUES RETURNING proj         INSERT INTO t OUTPUT proj DEFAULT VALUES
//! UPDATE t SET c = @p.. WHERE k = @k.. RETURNING proj UPDATE t SET c = @p.. OUTPUT proj WHERE k = @k..
//! DELETE FROM t WHERE c = @p AND ..                   (same)
//! SELECT c AS p, .. FROM t WHERE k = @k AND ..        (same)
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crudsql_core::error::ConfigErrorKind;
use crudsql_core::{Error, LookupError, Model, PropertyDescriptor, Result, parameter_name};

use crate::dialect::{Dialect, OutputStyle};
use crate::schema::Schema;

/// The canonical statements of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
    FindByKey,
}

/// Quoting and output grammar of one dialect applied to one schema.
struct Renderer<'a> {
    dialect: &'a dyn Dialect,
    object: Cow<'a, str>,
    projection: Cow<'a, str>,
}

impl<'a> Renderer<'a> {
    fn new(dialect: &'a dyn Dialect, schema: &Schema) -> Self {
        let object = schema
            .identity()
            .qualified(|segment| dialect.quote_identifier(segment));
        let projection = schema
            .properties()
            .iter()
            .map(|p| {
                format!(
                    "{} AS {}",
                    dialect.output_column(p.column_name),
                    dialect.quote_identifier(p.name)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            dialect,
            object: Cow::Owned(object),
            projection: Cow::Owned(projection),
        }
    }

    fn columns(&self, props: &[&PropertyDescriptor]) -> String {
        props
            .iter()
            .map(|p| self.dialect.quote_identifier(p.column_name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn parameters(props: &[&PropertyDescriptor]) -> String {
        props
            .iter()
            .map(|p| parameter_name(p.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn assignment(&self, p: &PropertyDescriptor) -> String {
        format!(
            "{} = {}",
            self.dialect.quote_identifier(p.column_name),
            parameter_name(p.name)
        )
    }

    fn assignments(&self, props: &[&PropertyDescriptor], separator: &str) -> String {
        props
            .iter()
            .map(|p| self.assignment(p))
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn insert(&self, props: &[&PropertyDescriptor]) -> String {
        let values = if props.is_empty() {
            "DEFAULT VALUES".to_string()
        } else {
            format!("VALUES ({})", Self::parameters(props))
        };
        let target = if props.is_empty() {
            self.object.to_string()
        } else {
            format!("{} ({})", self.object, self.columns(props))
        };
        let style = self.dialect.output_style();
        let output = format!("{} {}", style.keyword(), self.projection);
        match style {
            OutputStyle::Returning => format!("INSERT INTO {} {} {}", target, values, output),
            OutputStyle::Output => format!("INSERT INTO {} {} {}", target, output, values),
        }
    }

    fn update(&self, set: &[&PropertyDescriptor], keys: &[&PropertyDescriptor]) -> String {
        let set = self.assignments(set, ", ");
        let predicate = self.assignments(keys, " AND ");
        let style = self.dialect.output_style();
        let output = format!("{} {}", style.keyword(), self.projection);
        match style {
            OutputStyle::Returning => format!(
                "UPDATE {} SET {} WHERE {} {}",
                self.object, set, predicate, output
            ),
            OutputStyle::Output => format!(
                "UPDATE {} SET {} {} WHERE {}",
                self.object, set, output, predicate
            ),
        }
    }

    fn delete(&self, props: &[&PropertyDescriptor]) -> String {
        format!(
            "DELETE FROM {} WHERE {}",
            self.object,
            self.assignments(props, " AND ")
        )
    }

    fn find_by_key(&self, props: &[&PropertyDescriptor], keys: &[&PropertyDescriptor]) -> String {
        let select = props
            .iter()
            .map(|p| {
                format!(
                    "{} AS {}",
                    self.dialect.quote_identifier(p.column_name),
                    self.dialect.quote_identifier(p.name)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "SELECT {} FROM {} WHERE {}",
            select,
            self.object,
            self.assignments(keys, " AND ")
        )
    }
}

/// The cached statements of one model under one dialect.
///
/// Statements that need a key are rendered, or rejected, when the set is
/// built. A keyless model still gets its insert statement; asking it for
/// update, delete or find-by-key returns the same configuration error every
/// time.
pub struct StatementSet {
    dialect: &'static dyn Dialect,
    schema: Schema,
    object: String,
    projection: String,
    insert: Arc<str>,
    update: Result<Arc<str>>,
    delete: Result<Arc<str>>,
    find_by_key: Result<Arc<str>>,
}

impl StatementSet {
    /// Reflect `M` and render its canonical statements.
    #[tracing::instrument(level = "debug", skip(dialect), fields(model = std::any::type_name::<M>(), dialect = dialect.name()))]
    pub fn build<M: Model>(dialect: &'static dyn Dialect) -> Result<Self> {
        let schema = Schema::reflect::<M>(dialect)?;
        let set = Self::from_schema(schema, dialect);
        if let Err(e) = &set.delete {
            tracing::warn!(error = %e, "Key-dependent statements unavailable");
        }
        tracing::debug!(
            object = %set.object,
            properties = set.schema.properties().len(),
            insert_columns = set.schema.writable().count(),
            keys = set.schema.keys().count(),
            "Built statement set"
        );
        Ok(set)
    }

    /// Render the canonical statements of an already reflected schema.
    pub fn from_schema(schema: Schema, dialect: &'static dyn Dialect) -> Self {
        let render = Renderer::new(dialect, &schema);
        let all: Vec<_> = schema.properties().iter().collect();
        let writable: Vec<_> = schema.writable().collect();
        let keys: Vec<_> = schema.keys().collect();

        let insert = Arc::from(render.insert(&writable));

        let keyed = if !schema.has_key() {
            Err(Error::config(
                ConfigErrorKind::NoKey,
                schema.model(),
                "no key properties defined",
            ))
        } else {
            Ok(())
        };
        let delete = keyed.clone().map(|()| Arc::from(render.delete(&all)));
        let find_by_key = keyed
            .clone()
            .map(|()| Arc::from(render.find_by_key(&all, &keys)));
        let update = keyed.and_then(|()| {
            if writable.is_empty() {
                Err(Error::config(
                    ConfigErrorKind::NoUpdatableProperty,
                    schema.model(),
                    "no properties defined that can be updated",
                ))
            } else {
                Ok(Arc::from(render.update(&writable, &keys)))
            }
        });

        let Renderer {
            object, projection, ..
        } = render;
        Self {
            dialect,
            schema,
            object: object.into_owned(),
            projection: projection.into_owned(),
            insert,
            update,
            delete,
            find_by_key,
        }
    }

    /// The dialect the statements were rendered for.
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The quoted object path, e.g. `"public"."Heroes"`.
    pub fn object(&self) -> &str {
        &self.object
    }

    /// The returned-row projection: every mapped property aliased to its name.
    pub fn projection(&self) -> &str {
        &self.projection
    }

    /// Full insert: every non-generated property, returning the whole row.
    pub fn insert(&self) -> &str {
        &self.insert
    }

    /// Full update: every non-generated property, matched on keys.
    pub fn update(&self) -> Result<&str> {
        self.update.as_deref().map_err(Clone::clone)
    }

    /// Delete, matched on every mapped property's current value.
    pub fn delete(&self) -> Result<&str> {
        self.delete.as_deref().map_err(Clone::clone)
    }

    /// Select every mapped property by key.
    pub fn find_by_key(&self) -> Result<&str> {
        self.find_by_key.as_deref().map_err(Clone::clone)
    }

    /// Shared handle to a canonical statement's text.
    pub fn text(&self, kind: StatementKind) -> Result<Arc<str>> {
        match kind {
            StatementKind::Insert => Ok(Arc::clone(&self.insert)),
            StatementKind::Update => self.update.clone(),
            StatementKind::Delete => self.delete.clone(),
            StatementKind::FindByKey => self.find_by_key.clone(),
        }
    }

    /// Property names bound as parameters by a canonical statement.
    pub fn parameters(&self, kind: StatementKind) -> Vec<&'static str> {
        let names: Vec<_> = match kind {
            StatementKind::Insert => self.schema.writable().map(|p| p.name).collect(),
            StatementKind::Update => self
                .schema
                .writable()
                .chain(self.schema.keys())
                .map(|p| p.name)
                .collect(),
            StatementKind::Delete => self.schema.properties().iter().map(|p| p.name).collect(),
            StatementKind::FindByKey => self.schema.keys().map(|p| p.name).collect(),
        };
        dedup(names)
    }

    fn resolve<'s>(&'s self, names: &[&str]) -> Result<Vec<&'s PropertyDescriptor>> {
        names
            .iter()
            .map(|name| {
                self.schema.find(name).ok_or_else(|| {
                    Error::Lookup(LookupError {
                        model: self.schema.model(),
                        property: (*name).to_string(),
                    })
                })
            })
            .collect()
    }

    /// Insert restricted to the changed properties.
    ///
    /// No names degrades to a columnless insert that still returns the row.
    pub fn insert_partial(&self, names: &[&str]) -> Result<String> {
        let props = self.resolve(names)?;
        Ok(self.renderer_for_partial().insert(&props))
    }

    /// Update restricted to the changed properties, matched on keys.
    pub fn update_partial(&self, names: &[&str]) -> Result<String> {
        if !self.schema.has_key() {
            return Err(Error::config(
                ConfigErrorKind::NoKey,
                self.schema.model(),
                "no key properties defined",
            ));
        }
        if names.is_empty() {
            return Err(Error::config(
                ConfigErrorKind::EmptyChangeset,
                self.schema.model(),
                "no properties changed",
            ));
        }
        let props = self.resolve(names)?;
        let keys: Vec<_> = self.schema.keys().collect();
        Ok(self.renderer_for_partial().update(&props, &keys))
    }

    /// Parameters bound by [`update_partial`](Self::update_partial).
    pub fn update_partial_parameters(&self, names: &[&str]) -> Result<Vec<&'static str>> {
        let props = self.resolve(names)?;
        Ok(dedup(
            props
                .into_iter()
                .chain(self.schema.keys())
                .map(|p| p.name)
                .collect(),
        ))
    }

    /// Parameters bound by [`insert_partial`](Self::insert_partial).
    pub fn insert_partial_parameters(&self, names: &[&str]) -> Result<Vec<&'static str>> {
        Ok(self.resolve(names)?.into_iter().map(|p| p.name).collect())
    }

    /// Renderer reusing the cached object path and projection.
    fn renderer_for_partial(&self) -> Renderer<'_> {
        Renderer {
            dialect: self.dialect,
            object: Cow::Borrowed(&self.object),
            projection: Cow::Borrowed(&self.projection),
        }
    }
}

impl fmt::Debug for StatementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementSet")
            .field("dialect", &self.dialect.name())
            .field("model", &self.schema.model())
            .field("object", &self.object)
            .field("insert", &self.insert)
            .field("update", &self.update)
            .field("delete", &self.delete)
            .field("find_by_key", &self.find_by_key)
            .finish_non_exhaustive()
    }
}

fn dedup(names: Vec<&'static str>) -> Vec<&'static str> {
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Postgres, SqlServer, Sqlite};
    use crudsql_core::{Property, Shape};

    static POSTGRES: Postgres = Postgres;
    static SQL_SERVER: SqlServer = SqlServer;
    static SQLITE: Sqlite = Sqlite;

    #[derive(Default)]
    struct Hero {
        id: i32,
        code: [u8; 16],
        name: String,
        tag: String,
    }

    impl Shape for Hero {
        fn properties() -> Vec<Property<Self>> {
            vec![
                Property::field("Id", |h: &Hero| &h.id, |h: &mut Hero| &mut h.id)
                    .key()
                    .generated(),
                Property::field("Code", |h: &Hero| &h.code, |h: &mut Hero| &mut h.code)
                    .key()
                    .generated(),
                Property::field("Name", |h: &Hero| &h.name, |h: &mut Hero| &mut h.name),
                Property::field("Tag", |h: &Hero| &h.tag, |h: &mut Hero| &mut h.tag)
                    .column("Alias"),
            ]
        }
    }

    impl Model for Hero {
        const TABLE_NAME: &'static str = "Heroes";
    }

    struct Note {
        body: String,
    }

    impl Shape for Note {
        fn properties() -> Vec<Property<Self>> {
            vec![Property::field("Body", |n: &Note| &n.body, |n: &mut Note| &mut n.body)]
        }
    }

    impl Model for Note {
        const TABLE_NAME: &'static str = "Notes";
    }

    struct Counter {
        id: i64,
    }

    impl Shape for Counter {
        fn properties() -> Vec<Property<Self>> {
            vec![
                Property::field("Id", |c: &Counter| &c.id, |c: &mut Counter| &mut c.id)
                    .key()
                    .generated(),
            ]
        }
    }

    impl Model for Counter {
        const TABLE_NAME: &'static str = "Counters";
        const SCHEMA_NAME: Option<&'static str> = Some("stats");
    }

    /// Key assigned by the application, so it is written as well as matched.
    struct Sku {
        code: String,
        price: i32,
    }

    impl Shape for Sku {
        fn properties() -> Vec<Property<Self>> {
            vec![
                Property::field("Code", |s: &Sku| &s.code, |s: &mut Sku| &mut s.code).key(),
                Property::field("Price", |s: &Sku| &s.price, |s: &mut Sku| &mut s.price),
            ]
        }
    }

    impl Model for Sku {
        const TABLE_NAME: &'static str = "Skus";
    }

    const HERO_PROJECTION: &str = r#""Id" AS "Id", "Code" AS "Code", "Name" AS "Name", "Alias" AS "Tag""#;

    #[test]
    fn insert_skips_generated_and_returns_every_property() {
        let set = StatementSet::build::<Hero>(&POSTGRES).unwrap();
        assert_eq!(
            set.insert(),
            format!(
                r#"INSERT INTO "public"."Heroes" ("Name", "Alias") VALUES (@Name, @Tag) RETURNING {HERO_PROJECTION}"#
            )
        );
        assert_eq!(set.projection(), HERO_PROJECTION);
    }

    #[test]
    fn insert_columns_and_parameters_match_non_generated_count() {
        let set = StatementSet::build::<Hero>(&POSTGRES).unwrap();
        let params = set.parameters(StatementKind::Insert);
        assert_eq!(params, vec!["Name", "Tag"]);
        let columns = set.schema().writable().count();
        assert_eq!(columns, set.schema().properties().len() - 2);
        assert_eq!(set.insert().matches('@').count(), columns);
    }

    #[test]
    fn find_by_key_matches_on_keys_only() {
        let set = StatementSet::build::<Hero>(&POSTGRES).unwrap();
        assert_eq!(
            set.find_by_key().unwrap(),
            format!(
                r#"SELECT {HERO_PROJECTION} FROM "public"."Heroes" WHERE "Id" = @Id AND "Code" = @Code"#
            )
        );
        assert_eq!(set.parameters(StatementKind::FindByKey), vec!["Id", "Code"]);
    }

    #[test]
    fn update_sets_writable_and_matches_keys() {
        let set = StatementSet::build::<Hero>(&POSTGRES).unwrap();
        assert_eq!(
            set.update().unwrap(),
            format!(
                r#"UPDATE "public"."Heroes" SET "Name" = @Name, "Alias" = @Tag WHERE "Id" = @Id AND "Code" = @Code RETURNING {HERO_PROJECTION}"#
            )
        );
        assert_eq!(
            set.parameters(StatementKind::Update),
            vec!["Name", "Tag", "Id", "Code"]
        );
    }

    #[test]
    fn delete_matches_every_mapped_property() {
        let set = StatementSet::build::<Hero>(&POSTGRES).unwrap();
        assert_eq!(
            set.delete().unwrap(),
            r#"DELETE FROM "public"."Heroes" WHERE "Id" = @Id AND "Code" = @Code AND "Name" = @Name AND "Alias" = @Tag"#
        );
        assert_eq!(set.parameters(StatementKind::Delete).len(), 4);
    }

    #[test]
    fn sql_server_places_output_before_values_and_where() {
        let set = StatementSet::build::<Hero>(&SQL_SERVER).unwrap();
        let projection =
            "INSERTED.[Id] AS [Id], INSERTED.[Code] AS [Code], INSERTED.[Name] AS [Name], INSERTED.[Alias] AS [Tag]";
        assert_eq!(
            set.insert(),
            format!("INSERT INTO [dbo].[Heroes] ([Name], [Alias]) OUTPUT {projection} VALUES (@Name, @Tag)")
        );
        assert_eq!(
            set.update().unwrap(),
            format!(
                "UPDATE [dbo].[Heroes] SET [Name] = @Name, [Alias] = @Tag OUTPUT {projection} WHERE [Id] = @Id AND [Code] = @Code"
            )
        );
        assert_eq!(
            set.find_by_key().unwrap(),
            "SELECT [Id] AS [Id], [Code] AS [Code], [Name] AS [Name], [Alias] AS [Tag] FROM [dbo].[Heroes] WHERE [Id] = @Id AND [Code] = @Code"
        );
    }

    #[test]
    fn keyless_model_can_only_insert() {
        let set = StatementSet::build::<Note>(&SQLITE).unwrap();
        assert_eq!(
            set.insert(),
            r#"INSERT INTO "main"."Notes" ("Body") VALUES (@Body) RETURNING "Body" AS "Body""#
        );
        for kind in [StatementKind::Update, StatementKind::Delete, StatementKind::FindByKey] {
            let err = set.text(kind).unwrap_err();
            assert_eq!(err.config_kind(), Some(ConfigErrorKind::NoKey));
        }
        assert_eq!(set.update().unwrap_err(), set.update().unwrap_err());
        let err = set.update_partial(&["Body"]).unwrap_err();
        assert_eq!(err.config_kind(), Some(ConfigErrorKind::NoKey));
    }

    #[test]
    fn all_generated_model_inserts_default_values() {
        let set = StatementSet::build::<Counter>(&POSTGRES).unwrap();
        assert_eq!(
            set.insert(),
            r#"INSERT INTO "stats"."Counters" DEFAULT VALUES RETURNING "Id" AS "Id""#
        );
        let err = set.update().unwrap_err();
        assert_eq!(err.config_kind(), Some(ConfigErrorKind::NoUpdatableProperty));
        assert!(set.delete().is_ok());

        let ms = StatementSet::build::<Counter>(&SQL_SERVER).unwrap();
        assert_eq!(
            ms.insert(),
            "INSERT INTO [stats].[Counters] OUTPUT INSERTED.[Id] AS [Id] DEFAULT VALUES"
        );
    }

    #[test]
    fn partial_statements_follow_changed_names() {
        let set = StatementSet::build::<Hero>(&POSTGRES).unwrap();
        assert_eq!(
            set.insert_partial(&["Tag"]).unwrap(),
            format!(r#"INSERT INTO "public"."Heroes" ("Alias") VALUES (@Tag) RETURNING {HERO_PROJECTION}"#)
        );
        assert_eq!(
            set.update_partial(&["Tag"]).unwrap(),
            format!(
                r#"UPDATE "public"."Heroes" SET "Alias" = @Tag WHERE "Id" = @Id AND "Code" = @Code RETURNING {HERO_PROJECTION}"#
            )
        );
        assert_eq!(
            set.update_partial_parameters(&["Tag"]).unwrap(),
            vec!["Tag", "Id", "Code"]
        );
        assert_eq!(set.insert_partial_parameters(&["Name"]).unwrap(), vec!["Name"]);
    }

    #[test]
    fn partial_insert_with_no_names_still_returns_the_row() {
        let set = StatementSet::build::<Hero>(&POSTGRES).unwrap();
        assert_eq!(
            set.insert_partial(&[]).unwrap(),
            format!(r#"INSERT INTO "public"."Heroes" DEFAULT VALUES RETURNING {HERO_PROJECTION}"#)
        );
    }

    #[test]
    fn partial_errors() {
        let set = StatementSet::build::<Hero>(&POSTGRES).unwrap();
        let err = set.update_partial(&[]).unwrap_err();
        assert_eq!(err.config_kind(), Some(ConfigErrorKind::EmptyChangeset));

        let err = set.insert_partial(&["Power"]).unwrap_err();
        assert!(err.is_lookup());
        assert!(err.to_string().contains("'Power'"));
        assert!(set.update_partial(&["Name", "Power"]).unwrap_err().is_lookup());
    }

    #[test]
    fn canonical_text_is_shared() {
        let set = StatementSet::build::<Hero>(&POSTGRES).unwrap();
        let a = set.text(StatementKind::Insert).unwrap();
        let b = set.text(StatementKind::Insert).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(format!("{set:?}").contains("Heroes"));
    }

    #[test]
    fn assigned_key_reuses_one_parameter_in_set_and_where() {
        let set = StatementSet::build::<Sku>(&POSTGRES).unwrap();
        assert_eq!(
            set.update().unwrap(),
            r#"UPDATE "public"."Skus" SET "Code" = @Code, "Price" = @Price WHERE "Code" = @Code RETURNING "Code" AS "Code", "Price" AS "Price""#
        );
        assert_eq!(set.parameters(StatementKind::Update), vec!["Code", "Price"]);
        assert_eq!(
            set.update_partial_parameters(&["Price", "Code"]).unwrap(),
            vec!["Price", "Code"]
        );
        assert_eq!(set.parameters(StatementKind::Insert), vec!["Code", "Price"]);
    }
}
