use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params_from_iter, types::Value as SqlValue};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use dsicola_api::db::{self, Built};
use dsicola_api::{Role, crypto, service};

/// Shared database state
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    /// Lock the connection, recovering from a poisoned mutex.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Initialize the database: open connection, enable WAL, run migrations
pub fn init_db(data_dir: &Path) -> Result<Db> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join("dsicola.db");
    let conn = Connection::open(&db_path).context("opening SQLite database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    run_migrations(&conn)?;

    Ok(Db {
        conn: Arc::new(Mutex::new(conn)),
    })
}

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in db::migrations::MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
            [name],
            |row| row.get(0),
        )?;

        if !already_applied {
            conn.execute_batch(sql)
                .with_context(|| format!("running migration {name}"))?;
            conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])?;
            tracing::info!("applied migration: {name}");
        }
    }

    Ok(())
}

/// Create the platform super admin from env credentials unless one exists.
pub fn bootstrap_super_admin(store: &Db, email: &str, password: &str, iterations: u32) -> Result<()> {
    let conn = store.conn();
    let exists: bool = sq_query_row(&conn, db::users::super_admin_exists(), |row| row.get(0))?;
    if exists {
        return Ok(());
    }

    let email = service::validate_email(email).map_err(anyhow::Error::msg)?;
    service::validate_password(password).map_err(anyhow::Error::msg)?;
    let password_hash = crypto::hash_password(password, iterations).map_err(anyhow::Error::msg)?;
    let id = uuid::Uuid::new_v4().to_string();

    sq_execute(
        &conn,
        db::users::insert(&db::users::NewUser {
            id: &id,
            instituicao_id: None,
            email: &email,
            nome: "Super Admin",
            role: Role::SuperAdmin.as_str(),
            password_hash: &password_hash,
            numero_identificacao: None,
            telefone: None,
            must_change_password: false,
        }),
    )
    .context("creating super admin")?;

    tracing::info!(email = %email, "super admin created");
    Ok(())
}

// ---------------------------------------------------------------------------
// sea-query bridge
// ---------------------------------------------------------------------------

fn bind(values: sea_query::Values) -> impl Iterator<Item = SqlValue> {
    values.0.into_iter().map(to_sql_value)
}

fn to_sql_value(value: sea_query::Value) -> SqlValue {
    use sea_query::Value as V;
    match value {
        V::Bool(Some(b)) => SqlValue::Integer(i64::from(b)),
        V::TinyInt(Some(i)) => SqlValue::Integer(i64::from(i)),
        V::SmallInt(Some(i)) => SqlValue::Integer(i64::from(i)),
        V::Int(Some(i)) => SqlValue::Integer(i64::from(i)),
        V::BigInt(Some(i)) => SqlValue::Integer(i),
        V::TinyUnsigned(Some(u)) => SqlValue::Integer(i64::from(u)),
        V::SmallUnsigned(Some(u)) => SqlValue::Integer(i64::from(u)),
        V::Unsigned(Some(u)) => SqlValue::Integer(i64::from(u)),
        V::BigUnsigned(Some(u)) => SqlValue::Integer(i64::try_from(u).unwrap_or(i64::MAX)),
        V::Float(Some(f)) => SqlValue::Real(f64::from(f)),
        V::Double(Some(f)) => SqlValue::Real(f),
        V::String(Some(s)) => SqlValue::Text(*s),
        V::Char(Some(c)) => SqlValue::Text(c.to_string()),
        V::Bytes(Some(b)) => SqlValue::Blob(*b),
        _ => SqlValue::Null,
    }
}

/// Run a built INSERT/UPDATE/DELETE; returns affected rows.
pub fn sq_execute(conn: &Connection, (sql, values): Built) -> rusqlite::Result<usize> {
    conn.execute(&sql, params_from_iter(bind(values)))
}

/// Run a built SELECT expecting exactly one row.
pub fn sq_query_row<T, F>(conn: &Connection, (sql, values): Built, f: F) -> rusqlite::Result<T>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    conn.query_row(&sql, params_from_iter(bind(values)), f)
}

/// Run a built SELECT returning at most one row.
pub fn sq_query_opt<T, F>(conn: &Connection, built: Built, f: F) -> rusqlite::Result<Option<T>>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    sq_query_row(conn, built, f).optional()
}

/// Run a built SELECT and map every row.
pub fn sq_query_map<T, F>(conn: &Connection, (sql, values): Built, f: F) -> rusqlite::Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(bind(values)), f)?;
    rows.collect()
}
