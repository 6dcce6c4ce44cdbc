//! Statement front-end: cached SQL text paired with bound parameter values.

use std::fmt;
use std::sync::Arc;

use crudsql_core::{ChangeSet, Model, Result, Shape, Value, bind};
use crudsql_query::{Dialect, StatementKind, StatementRegistry, StatementSet};

/// SQL text ready to execute and its named parameter values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: Arc<str>,
    /// `(parameter name, value)` in first-appearance order
    pub params: Vec<(String, Value)>,
}

impl Statement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Value bound to a parameter, by name with or without its sigil.
    pub fn param(&self, name: &str) -> Option<&Value> {
        let name = name.strip_prefix(crudsql_core::PARAM_SIGIL).unwrap_or(name);
        self.params
            .iter()
            .find(|(n, _)| n.strip_prefix(crudsql_core::PARAM_SIGIL) == Some(name))
            .map(|(_, v)| v)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Builds statements for any model under one dialect.
///
/// Cloning shares the statement registry.
#[derive(Clone)]
pub struct Crud {
    dialect: &'static dyn Dialect,
    registry: Arc<StatementRegistry>,
}

impl Crud {
    /// A front-end with its own registry.
    pub fn new(dialect: &'static dyn Dialect) -> Self {
        Self::with_registry(dialect, Arc::new(StatementRegistry::new()))
    }

    pub fn with_registry(dialect: &'static dyn Dialect, registry: Arc<StatementRegistry>) -> Self {
        Self { dialect, registry }
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    pub fn registry(&self) -> &Arc<StatementRegistry> {
        &self.registry
    }

    /// The cached statement set of `M`.
    pub fn statements<M: Model>(&self) -> Result<Arc<StatementSet>> {
        self.registry.get::<M>(self.dialect)
    }

    fn canonical<M: Model, S: Shape>(&self, kind: StatementKind, source: &S) -> Result<Statement> {
        let set = self.statements::<M>()?;
        let sql = set.text(kind)?;
        let params = bind(source, set.parameters(kind))?;
        tracing::trace!(model = set.schema().model(), ?kind, params = params.len(), "Bound statement");
        Ok(Statement { sql, params })
    }

    /// Insert every non-generated property of `entity`.
    pub fn insert<M: Model>(&self, entity: &M) -> Result<Statement> {
        self.canonical::<M, M>(StatementKind::Insert, entity)
    }

    /// Update every non-generated property of `entity`, matched on its keys.
    pub fn update<M: Model>(&self, entity: &M) -> Result<Statement> {
        self.canonical::<M, M>(StatementKind::Update, entity)
    }

    /// Delete the row matching every mapped property of `entity`.
    pub fn delete<M: Model>(&self, entity: &M) -> Result<Statement> {
        self.canonical::<M, M>(StatementKind::Delete, entity)
    }

    /// Select a row of `M` by key.
    ///
    /// `key` supplies the key values by property name: a key-shaped payload
    /// or an instance of the model itself.
    pub fn find_by_key<M: Model, K: Shape>(&self, key: &K) -> Result<Statement> {
        self.canonical::<M, K>(StatementKind::FindByKey, key)
    }

    /// Insert only the properties recorded in `changes`.
    #[tracing::instrument(level = "debug", skip(self, changes), fields(model = std::any::type_name::<M>(), changed = changes.len()))]
    pub fn insert_changes<M: Model>(&self, changes: &ChangeSet<'_, M>) -> Result<Statement> {
        let set = self.statements::<M>()?;
        let sql = set.insert_partial(changes.names())?;
        let params = bind(changes.target(), set.insert_partial_parameters(changes.names())?)?;
        Ok(Statement {
            sql: Arc::from(sql),
            params,
        })
    }

    /// Update only the properties recorded in `changes`, matched on keys.
    #[tracing::instrument(level = "debug", skip(self, changes), fields(model = std::any::type_name::<M>(), changed = changes.len()))]
    pub fn update_changes<M: Model>(&self, changes: &ChangeSet<'_, M>) -> Result<Statement> {
        let set = self.statements::<M>()?;
        let sql = set.update_partial(changes.names())?;
        let params = bind(changes.target(), set.update_partial_parameters(changes.names())?)?;
        Ok(Statement {
            sql: Arc::from(sql),
            params,
        })
    }
}

impl fmt::Debug for Crud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crud")
            .field("dialect", &self.dialect.name())
            .field("statement_sets", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crudsql_core::Property;
    use crudsql_query::DialectKind;
    use crudsql_tracker::SetProperties;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Order {
        id: i64,
        status: String,
        total: f64,
    }

    impl Shape for Order {
        fn properties() -> Vec<Property<Self>> {
            vec![
                Property::field("Id", |o: &Order| &o.id, |o: &mut Order| &mut o.id)
                    .key()
                    .generated(),
                Property::field("Status", |o: &Order| &o.status, |o: &mut Order| &mut o.status),
                Property::field("Total", |o: &Order| &o.total, |o: &mut Order| &mut o.total),
            ]
        }
    }

    impl Model for Order {
        const TABLE_NAME: &'static str = "Orders";
        const SCHEMA_NAME: Option<&'static str> = Some("sales");
    }

    struct OrderKey(i64);

    impl Shape for OrderKey {
        fn properties() -> Vec<Property<Self>> {
            vec![Property::readonly("Id", |k: &OrderKey| k.0)]
        }
    }

    struct Setting {
        key: String,
        value: String,
    }

    impl Shape for Setting {
        fn properties() -> Vec<Property<Self>> {
            vec![
                Property::field("Key", |s: &Setting| &s.key, |s: &mut Setting| &mut s.key).key(),
                Property::field("Value", |s: &Setting| &s.value, |s: &mut Setting| &mut s.value),
            ]
        }
    }

    impl Model for Setting {
        const TABLE_NAME: &'static str = "Settings";
    }

    fn crud() -> Crud {
        Crud::new(DialectKind::Postgres.dialect())
    }

    fn order() -> Order {
        Order {
            id: 3,
            status: "open".into(),
            total: 12.5,
        }
    }

    #[test]
    fn insert_binds_non_generated_properties() {
        let stmt = crud().insert(&order()).unwrap();
        assert!(stmt.sql().starts_with(r#"INSERT INTO "sales"."Orders" ("Status", "Total")"#));
        assert_eq!(
            stmt.params,
            vec![
                ("@Status".to_string(), Value::Text("open".into())),
                ("@Total".to_string(), Value::Double(12.5)),
            ]
        );
    }

    #[test]
    fn update_binds_set_then_keys() {
        let stmt = crud().update(&order()).unwrap();
        let names: Vec<_> = stmt.params.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["@Status", "@Total", "@Id"]);
        assert_eq!(stmt.param("Id"), Some(&Value::BigInt(3)));
        assert_eq!(stmt.param("@Id"), Some(&Value::BigInt(3)));
    }

    #[test]
    fn delete_binds_every_property() {
        let stmt = crud().delete(&order()).unwrap();
        assert_eq!(stmt.params.len(), 3);
        assert!(stmt.to_string().starts_with("DELETE FROM"));
    }

    #[test]
    fn find_by_key_accepts_key_payload_or_model() {
        let crud = crud();
        let by_payload = crud.find_by_key::<Order, _>(&OrderKey(3)).unwrap();
        let by_model = crud.find_by_key::<Order, _>(&order()).unwrap();
        assert_eq!(by_payload, by_model);
        assert!(Arc::ptr_eq(&by_payload.sql, &by_model.sql));
    }

    #[test]
    fn find_by_key_payload_missing_key_is_a_lookup_error() {
        struct Wrong;
        impl Shape for Wrong {
            fn properties() -> Vec<Property<Self>> {
                vec![Property::readonly("Status", |_: &Wrong| "x".to_string())]
            }
        }

        let err = crud().find_by_key::<Order, _>(&Wrong).unwrap_err();
        assert!(err.is_lookup());
    }

    #[test]
    fn partial_statements_from_changes() {
        let crud = crud();
        let mut current = order();
        let patch = Order {
            status: "shipped".into(),
            ..Order::default()
        };
        let changes = current.set_properties(&patch).unwrap();

        let update = crud.update_changes(&changes).unwrap();
        assert_eq!(
            update.sql(),
            r#"UPDATE "sales"."Orders" SET "Status" = @Status WHERE "Id" = @Id RETURNING "Id" AS "Id", "Status" AS "Status", "Total" AS "Total""#
        );
        assert_eq!(
            update.params,
            vec![
                ("@Status".to_string(), Value::Text("shipped".into())),
                ("@Id".to_string(), Value::BigInt(3)),
            ]
        );

        let insert = crud.insert_changes(&changes).unwrap();
        assert_eq!(insert.params.len(), 1);
        assert!(insert.sql().contains(r#"("Status") VALUES (@Status)"#));
    }

    #[test]
    fn empty_changes_cannot_update() {
        let mut current = order();
        let changes = current.set_properties(&Order::default()).unwrap();
        let err = crud().update_changes(&changes).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn assigned_key_is_bound_once() {
        let setting = Setting {
            key: "theme".into(),
            value: "dark".into(),
        };
        let stmt = crud().update(&setting).unwrap();
        assert_eq!(stmt.sql().matches(r#""Key" = @Key"#).count(), 2);
        assert_eq!(
            stmt.params,
            vec![
                ("@Key".to_string(), Value::Text("theme".into())),
                ("@Value".to_string(), Value::Text("dark".into())),
            ]
        );
    }
}
