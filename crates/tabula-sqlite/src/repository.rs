//! SQLite repository.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use serde_json::Map;
use tracing::{debug, info, instrument};

use tabula_core::traits::Repository;
use tabula_core::{
    Error, ID_FIELD, InvalidInputError, Record, RecordId, Result, Schema, StorageError, timestamp,
};

use crate::columns::{Column, ColumnKind, columns, quote};

fn map_db(err: rusqlite::Error) -> Error {
    StorageError::Database {
        message: err.to_string(),
    }
    .into()
}

/// A [`Repository`] storing one entity type in one SQLite table.
///
/// The table is named after the schema's resource and holds an
/// autoincrementing `seq` key (insertion order), the text `id`, and one
/// column per schema field and timestamp. Opening the repository creates
/// the table if needed and adds any schema column the table lacks. Tables
/// keyed by an integer `id` are rebuilt into this layout.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    conn: Arc<Mutex<Connection>>,
    table: Arc<Table>,
    path: Option<PathBuf>,
}

#[derive(Debug)]
struct Table {
    name: String,
    columns: Vec<Column>,
}

impl SqliteRepository {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>, schema: &Schema) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let conn = Connection::open(path).map_err(map_db)?;
        info!(path = %path.display(), "Opened SQLite database");

        let mut repo = Self::from_connection(conn, schema)?;
        repo.path = Some(path.to_path_buf());
        Ok(repo)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory(schema: &Schema) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(map_db)?;
        Self::from_connection(conn, schema)
    }

    fn from_connection(conn: Connection, schema: &Schema) -> Result<Self> {
        let table = Table {
            name: schema.resource().to_string(),
            columns: columns(schema),
        };

        table.migrate(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            table: Arc::new(table),
            path: None,
        })
    }

    /// Database file path, if not in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection, &Table) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let table = Arc::clone(&self.table);

        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StorageError::Task {
                message: "connection mutex poisoned".to_string(),
            })?;
            f(&*guard, &*table)
        })
        .await
        .map_err(|e| StorageError::Task {
            message: e.to_string(),
        })?
    }
}

impl Table {
    fn quoted(&self) -> String {
        quote(&self.name)
    }

    fn select_list(&self) -> String {
        std::iter::once("id".to_string())
            .chain(self.columns.iter().map(|c| quote(&c.name)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Create the table, then add any columns it is missing.
    fn create_sql(&self) -> String {
        let mut create = format!(
            "CREATE TABLE IF NOT EXISTS {} (seq INTEGER PRIMARY KEY AUTOINCREMENT, id TEXT NOT NULL UNIQUE",
            self.quoted()
        );
        for column in &self.columns {
            create.push_str(", ");
            create.push_str(&column.definition());
        }
        create.push(')');
        create
    }

    fn migrate(&self, conn: &Connection) -> Result<()> {
        let existing = self.existing_columns(conn)?;
        if !existing.is_empty() && !existing.contains("seq") {
            self.rebuild_legacy(conn, &existing)?;
        }

        conn.execute(&self.create_sql(), []).map_err(map_db)?;

        let existing = self.existing_columns(conn)?;
        for column in self.columns.iter().filter(|c| !existing.contains(&c.name)) {
            info!(table = %self.name, column = %column.name, "Adding missing column");

            conn.execute(
                &format!(
                    "ALTER TABLE {} ADD COLUMN {} {}",
                    self.quoted(),
                    quote(&column.name),
                    column.sql_type()
                ),
                [],
            )
            .map_err(map_db)?;

            if column.kind == ColumnKind::Timestamp {
                self.backfill(conn, column)?;
            }
        }

        Ok(())
    }

    /// Move a table keyed by an integer `id` into the `seq` + text id layout.
    ///
    /// Old ids keep their value as decimal strings and rows keep their order.
    /// Columns the schema does not know about are refused rather than dropped.
    fn rebuild_legacy(&self, conn: &Connection, existing: &HashSet<String>) -> Result<()> {
        let unknown: Vec<_> = existing
            .iter()
            .filter(|name| name.as_str() != ID_FIELD && !self.columns.iter().any(|c| &c.name == *name))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() || !existing.contains(ID_FIELD) {
            return Err(StorageError::Database {
                message: format!(
                    "table {} has an unsupported layout (unknown columns: {})",
                    self.name,
                    unknown.join(", ")
                ),
            }
            .into());
        }

        info!(table = %self.name, "Rebuilding table with text ids");

        let legacy = quote(&format!("{}_legacy", self.name));
        let copied: Vec<_> = self
            .columns
            .iter()
            .filter(|c| existing.contains(&c.name))
            .collect();
        let mut names = String::from("id");
        let mut values = String::from("CAST(id AS TEXT)");
        for column in &copied {
            names.push_str(", ");
            names.push_str(&quote(&column.name));
            values.push_str(", ");
            values.push_str(&quote(&column.name));
        }

        let tx = conn.unchecked_transaction().map_err(map_db)?;
        tx.execute(
            &format!("ALTER TABLE {} RENAME TO {legacy}", self.quoted()),
            [],
        )
        .map_err(map_db)?;
        tx.execute(&self.create_sql(), []).map_err(map_db)?;
        let rows = tx
            .execute(
                &format!(
                    "INSERT INTO {} ({names}) SELECT {values} FROM {legacy} ORDER BY rowid",
                    self.quoted()
                ),
                [],
            )
            .map_err(map_db)?;
        tx.execute(&format!("DROP TABLE {legacy}"), [])
            .map_err(map_db)?;
        for column in copied.iter().filter(|c| c.kind == ColumnKind::Timestamp) {
            self.backfill(&tx, column)?;
        }
        tx.commit().map_err(map_db)?;

        info!(table = %self.name, rows, "Rebuilt table");
        Ok(())
    }

    fn backfill(&self, conn: &Connection, column: &Column) -> Result<()> {
        let filled = conn
            .execute(
                &format!(
                    "UPDATE {table} SET {col} = ?1 WHERE {col} IS NULL OR {col} = ''",
                    table = self.quoted(),
                    col = quote(&column.name)
                ),
                params![timestamp()],
            )
            .map_err(map_db)?;
        info!(column = %column.name, rows = filled, "Back-filled timestamp column");
        Ok(())
    }

    fn existing_columns(&self, conn: &Connection) -> Result<HashSet<String>> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({})", self.quoted()))
            .map_err(map_db)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(map_db)?
            .collect::<rusqlite::Result<HashSet<_>>>()
            .map_err(map_db)?;
        Ok(names)
    }

    fn read_row(&self, row: &Row<'_>) -> rusqlite::Result<Record> {
        let id = match row.get_ref(0)? {
            rusqlite::types::ValueRef::Integer(i) => i.to_string(),
            _ => row.get::<_, String>(0)?,
        };
        let id = RecordId::new(id).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

        let mut fields = Map::new();
        for (index, column) in self.columns.iter().enumerate() {
            if let Some(value) = column.from_sql(row.get_ref(index + 1)?) {
                fields.insert(column.name.clone(), value);
            }
        }

        Ok(Record::new(id, fields))
    }

    fn find(&self, conn: &Connection, id: &RecordId) -> Result<Option<Record>> {
        conn.query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?1",
                self.select_list(),
                self.quoted()
            ),
            params![id.as_str()],
            |row| self.read_row(row),
        )
        .optional()
        .map_err(map_db)
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn list(&self) -> Result<Vec<Record>> {
        self.with_conn(|conn, table| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM {} ORDER BY rowid",
                    table.select_list(),
                    table.quoted()
                ))
                .map_err(map_db)?;
            let records = stmt
                .query_map([], |row| table.read_row(row))
                .map_err(map_db)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_db)?;
            Ok(records)
        })
        .await
    }

    async fn get(&self, id: &RecordId) -> Result<Record> {
        let id = id.clone();
        self.with_conn(move |conn, table| {
            table.find(conn, &id)?.ok_or_else(|| Error::NotFound {
                id: id.to_string(),
            })
        })
        .await
    }

    #[instrument(skip(self, record), fields(id = %record.id()))]
    async fn insert(&self, record: Record) -> Result<Record> {
        self.with_conn(move |conn, table| {
            let names: Vec<_> = std::iter::once("id".to_string())
                .chain(table.columns.iter().map(|c| quote(&c.name)))
                .collect();
            let placeholders: Vec<_> = (1..=names.len()).map(|i| format!("?{i}")).collect();

            let values = std::iter::once(rusqlite::types::Value::Text(record.id().to_string()))
                .chain(table.columns.iter().map(|c| c.to_sql(record.get(&c.name))));

            if table.find(conn, record.id())?.is_some() {
                return Err(InvalidInputError::RecordId {
                    value: record.id().to_string(),
                    reason: "already in use".to_string(),
                }
                .into());
            }

            conn.execute(
                &format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table.quoted(),
                    names.join(", "),
                    placeholders.join(", ")
                ),
                params_from_iter(values),
            )
            .map_err(map_db)?;

            debug!("Inserted row");
            Ok(record)
        })
        .await
    }

    #[instrument(skip(self, record), fields(id = %record.id()))]
    async fn replace(&self, record: Record) -> Result<Record> {
        self.with_conn(move |conn, table| {
            let assignments: Vec<_> = table
                .columns
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{} = ?{}", quote(&c.name), i + 1))
                .collect();

            let values = table
                .columns
                .iter()
                .map(|c| c.to_sql(record.get(&c.name)))
                .chain(std::iter::once(rusqlite::types::Value::Text(
                    record.id().to_string(),
                )));

            let changed = conn
                .execute(
                    &format!(
                        "UPDATE {} SET {} WHERE id = ?{}",
                        table.quoted(),
                        assignments.join(", "),
                        table.columns.len() + 1
                    ),
                    params_from_iter(values),
                )
                .map_err(map_db)?;

            if changed == 0 {
                return Err(Error::NotFound {
                    id: record.id().to_string(),
                });
            }

            debug!("Updated row");
            Ok(record)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn remove(&self, id: &RecordId) -> Result<Record> {
        let id = id.clone();
        self.with_conn(move |conn, table| {
            let tx = conn.unchecked_transaction().map_err(map_db)?;

            let record = table.find(&tx, &id)?.ok_or_else(|| Error::NotFound {
                id: id.to_string(),
            })?;

            tx.execute(
                &format!("DELETE FROM {} WHERE id = ?1", table.quoted()),
                params![id.as_str()],
            )
            .map_err(map_db)?;
            tx.commit().map_err(map_db)?;

            debug!("Deleted row");
            Ok(record)
        })
        .await
    }

    async fn count(&self) -> Result<usize> {
        self.with_conn(|conn, table| {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table.quoted()), [], |row| {
                    row.get(0)
                })
                .map_err(map_db)?;
            Ok(usize::try_from(count).unwrap_or_default())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabula_core::{EntityService, FieldSpec};
    use tempfile::TempDir;

    fn products() -> Schema {
        Schema::new("produtos", "Product")
            .field(FieldSpec::text("nome").required().min_len(2).max_len(100))
            .field(FieldSpec::number("preco").required().min(0.0).max(999_999.99))
            .field(FieldSpec::text("descricao").max_len(500))
            .updated_at("updated_at")
    }

    fn record(id: &str, nome: &str, preco: f64) -> Record {
        Record::from_value(json!({"id": id, "nome": nome, "preco": preco})).unwrap()
    }

    #[tokio::test]
    async fn crud_roundtrip() {
        let repo = SqliteRepository::open_in_memory(&products()).unwrap();

        repo.insert(record("p1", "Mouse", 129.0)).await.unwrap();
        repo.insert(record("p2", "Fone", 199.9)).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);

        let found = repo.get(&RecordId::new("p2").unwrap()).await.unwrap();
        assert_eq!(found.get("nome").unwrap(), "Fone");
        assert_eq!(found.get("preco").unwrap(), 199.9);
        assert!(found.get("descricao").is_none());

        repo.replace(record("p1", "Mouse X", 99.5)).await.unwrap();
        let listed = repo.list().await.unwrap();
        assert_eq!(listed[0].get("nome").unwrap(), "Mouse X");
        assert_eq!(listed[1].id().as_str(), "p2");

        let removed = repo.remove(&RecordId::new("p1").unwrap()).await.unwrap();
        assert_eq!(removed.get("nome").unwrap(), "Mouse X");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let repo = SqliteRepository::open_in_memory(&products()).unwrap();
        let ghost = RecordId::new("ghost").unwrap();

        assert!(matches!(repo.get(&ghost).await, Err(Error::NotFound { .. })));
        assert!(matches!(repo.remove(&ghost).await, Err(Error::NotFound { .. })));
        assert!(matches!(
            repo.replace(record("ghost", "Nada", 1.0)).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let repo = SqliteRepository::open_in_memory(&products()).unwrap();
        repo.insert(record("p1", "Mouse", 1.0)).await.unwrap();

        let err = repo.insert(record("p1", "Mouse", 1.0)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("produtos.db");

        {
            let repo = SqliteRepository::open(&path, &products()).unwrap();
            repo.insert(record("p1", "Camiseta", 59.9)).await.unwrap();
        }

        let repo = SqliteRepository::open(&path, &products()).unwrap();
        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].get("preco").unwrap(), 59.9);
    }

    #[tokio::test]
    async fn missing_timestamp_column_is_added_and_filled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("produtos.db");

        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE produtos (seq INTEGER PRIMARY KEY AUTOINCREMENT, id TEXT NOT NULL UNIQUE, \
                 nome TEXT NOT NULL, preco REAL NOT NULL, descricao TEXT);
                 INSERT INTO produtos (id, nome, preco) VALUES ('old', 'Antigo', 10.0);",
            )
            .unwrap();
        }

        let repo = SqliteRepository::open(&path, &products()).unwrap();
        let old = repo.get(&RecordId::new("old").unwrap()).await.unwrap();
        assert!(old.get("updated_at").unwrap().as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn integer_id_table_is_rebuilt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("produtos.db");

        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE produtos (id INTEGER PRIMARY KEY AUTOINCREMENT, nome TEXT NOT NULL, \
                 preco REAL NOT NULL, descricao TEXT, updated_at TEXT);
                 INSERT INTO produtos (nome, preco, descricao) VALUES ('Camiseta', 59.9, 'Algodão');
                 INSERT INTO produtos (nome, preco, updated_at)
                     VALUES ('Mouse', 129.0, '2024-01-01T00:00:00.000Z');",
            )
            .unwrap();
        }

        let service = EntityService::new(
            products(),
            SqliteRepository::open(&path, &products()).unwrap(),
        );

        let old = service.get(&RecordId::new("1").unwrap()).await.unwrap();
        assert_eq!(old.get("nome").unwrap(), "Camiseta");
        assert_eq!(old.get("descricao").unwrap(), "Algodão");
        assert!(old.get("updated_at").unwrap().as_str().unwrap().ends_with('Z'));

        let mouse = service.get(&RecordId::new("2").unwrap()).await.unwrap();
        assert_eq!(mouse.get("updated_at").unwrap(), "2024-01-01T00:00:00.000Z");

        let created = service
            .create(&json!({"nome": "Fone", "preco": 199.9}))
            .await
            .unwrap();
        service
            .update(&RecordId::new("1").unwrap(), &json!({"preco": 49.9}))
            .await
            .unwrap();

        let ids: Vec<_> = service
            .list()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id().as_str().to_string())
            .collect();
        assert_eq!(ids, ["1", "2", created.id().as_str()]);

        // Reopening the rebuilt table leaves it alone.
        let repo = SqliteRepository::open(&path, &products()).unwrap();
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn unknown_legacy_columns_are_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("produtos.db");

        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE produtos (id INTEGER PRIMARY KEY AUTOINCREMENT, nome TEXT NOT NULL, \
                 preco REAL NOT NULL, estoque INTEGER);
                 INSERT INTO produtos (nome, preco, estoque) VALUES ('Caneca', 25.0, 3);",
            )
            .unwrap();
        }

        let err = SqliteRepository::open(&path, &products()).unwrap_err();
        assert!(matches!(
            err,
            Error::StorageUnavailable(StorageError::Database { ref message }) if message.contains("estoque")
        ));

        let conn = Connection::open(&path).unwrap();
        let kept: i64 = conn
            .query_row("SELECT COUNT(*) FROM produtos", [], |row| row.get(0))
            .unwrap();
        assert_eq!(kept, 1);
    }

    #[tokio::test]
    async fn service_over_sqlite() {
        let service = EntityService::new(
            products(),
            SqliteRepository::open_in_memory(&products()).unwrap(),
        );

        let created = service
            .create(&json!({"nome": "Mouse Gamer X", "preco": 129.0}))
            .await
            .unwrap();
        let updated = service
            .update(created.id(), &json!({"preco": 119.0}))
            .await
            .unwrap();

        assert_eq!(updated.get("nome").unwrap(), "Mouse Gamer X");
        assert_eq!(updated.get("preco").unwrap(), 119.0);
        assert_eq!(service.get(created.id()).await.unwrap(), updated);
    }
}
