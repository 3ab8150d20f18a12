//! Customer registration repository
//!
//! SQLite implementation of the reconciler's storage port. Blocking
//! rusqlite calls run on `spawn_blocking`.

use std::sync::Arc;

use async_trait::async_trait;
use erpsync_core::RegistrationStore;
use erpsync_domain::{
    CatalogTable, CustomerRegistration, ErpSyncError, NewRegistration, Result as DomainResult,
    SyncBinding,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::task;

use super::manager::{map_sql_error, DbManager};

const REGISTRATION_COLUMNS: &str = "id, tax_id, legal_name, trade_name, carrier_id, price_list_id,
     billing_method_id, activity_branch_id, external_id, raw_response, synced_at, last_error,
     created_at, updated_at";

/// SQLite-backed customer registration repository
#[derive(Clone)]
pub struct SqliteRegistrationRepository {
    db: Arc<DbManager>,
}

impl SqliteRegistrationRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Insert or replace a catalog row (portal-side catalog maintenance).
    pub async fn upsert_catalog_entry(
        &self,
        table: CatalogTable,
        id: i64,
        code: Option<&str>,
        name: &str,
    ) -> DomainResult<()> {
        let code = code.map(str::to_string);
        let name = name.to_string();
        self.blocking(move |conn| upsert_catalog_row(conn, table, id, code.as_deref(), &name))
            .await
    }

    /// Remove a catalog row.
    pub async fn delete_catalog_entry(&self, table: CatalogTable, id: i64) -> DomainResult<()> {
        self.blocking(move |conn| delete_catalog_row(conn, table, id)).await
    }

    /// Registrations that exist locally but have no ERP binding yet.
    pub async fn list_unbound(&self) -> DomainResult<Vec<CustomerRegistration>> {
        self.blocking(query_unbound).await
    }

    async fn blocking<T, F>(&self, op: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<T> {
            let conn = db.get_connection()?;
            op(&conn).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl RegistrationStore for SqliteRegistrationRepository {
    async fn get_by_id(&self, id: i64) -> DomainResult<Option<CustomerRegistration>> {
        self.blocking(move |conn| query_registration(conn, "id = ?1", params![id])).await
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> DomainResult<Option<CustomerRegistration>> {
        let external_id = external_id.to_string();
        self.blocking(move |conn| query_registration(conn, "external_id = ?1", params![external_id]))
            .await
    }

    async fn find_by_tax_id(&self, tax_id: &str) -> DomainResult<Option<CustomerRegistration>> {
        let tax_id = tax_id.to_string();
        self.blocking(move |conn| query_registration(conn, "tax_id = ?1", params![tax_id])).await
    }

    async fn insert(&self, row: &NewRegistration) -> DomainResult<i64> {
        let row = row.clone();
        self.blocking(move |conn| insert_registration(conn, &row)).await
    }

    async fn update(&self, id: i64, binding: &SyncBinding) -> DomainResult<()> {
        let binding = binding.clone();
        let updated = self.blocking(move |conn| update_binding(conn, id, &binding)).await?;

        if updated == 0 {
            return Err(ErpSyncError::NotFound(format!("customer registration {id}")));
        }
        Ok(())
    }

    async fn catalog_contains(&self, table: CatalogTable, id: i64) -> DomainResult<bool> {
        self.blocking(move |conn| query_catalog_exists(conn, table, id)).await
    }
}

// ============================================================================
// SQL Operations (synchronous)
// ============================================================================

fn query_registration(
    conn: &Connection,
    predicate: &str,
    params: &[&dyn rusqlite::ToSql],
) -> rusqlite::Result<Option<CustomerRegistration>> {
    let sql = format!("SELECT {REGISTRATION_COLUMNS} FROM customer_registrations WHERE {predicate}");
    conn.query_row(&sql, params, map_registration_row).optional()
}

fn query_unbound(conn: &Connection) -> rusqlite::Result<Vec<CustomerRegistration>> {
    let sql = format!(
        "SELECT {REGISTRATION_COLUMNS} FROM customer_registrations
         WHERE external_id IS NULL ORDER BY created_at ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map_registration_row)?;
    rows.collect()
}

fn insert_registration(conn: &Connection, row: &NewRegistration) -> rusqlite::Result<i64> {
    let now = chrono::Utc::now().timestamp();

    conn.execute(
        "INSERT INTO customer_registrations (
             tax_id, legal_name, trade_name, carrier_id, price_list_id, billing_method_id,
             activity_branch_id, external_id, raw_response, synced_at, last_error,
             created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
        params![
            &row.tax_id,
            &row.legal_name,
            &row.trade_name,
            row.catalog.carrier_id,
            row.catalog.price_list_id,
            row.catalog.billing_method_id,
            row.catalog.activity_branch_id,
            &row.binding.external_id,
            &row.binding.raw_response,
            row.binding.synced_at,
            &row.binding.last_error,
            now,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

fn update_binding(conn: &Connection, id: i64, binding: &SyncBinding) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE customer_registrations SET
             external_id = COALESCE(?2, external_id),
             raw_response = COALESCE(?3, raw_response),
             synced_at = COALESCE(?4, synced_at),
             last_error = ?5,
             updated_at = ?6
         WHERE id = ?1",
        params![
            id,
            &binding.external_id,
            &binding.raw_response,
            binding.synced_at,
            &binding.last_error,
            chrono::Utc::now().timestamp(),
        ],
    )
}

fn query_catalog_exists(conn: &Connection, table: CatalogTable, id: i64) -> rusqlite::Result<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table.table_name());
    conn.query_row(&sql, params![id], |row| row.get(0))
}

fn upsert_catalog_row(
    conn: &Connection,
    table: CatalogTable,
    id: i64,
    code: Option<&str>,
    name: &str,
) -> rusqlite::Result<()> {
    let sql = format!(
        "INSERT INTO {} (id, code, name) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET code = excluded.code, name = excluded.name",
        table.table_name()
    );
    conn.execute(&sql, params![id, code, name])?;
    Ok(())
}

fn delete_catalog_row(conn: &Connection, table: CatalogTable, id: i64) -> rusqlite::Result<()> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", table.table_name());
    conn.execute(&sql, params![id])?;
    Ok(())
}

fn map_registration_row(row: &Row<'_>) -> rusqlite::Result<CustomerRegistration> {
    Ok(CustomerRegistration {
        id: row.get(0)?,
        tax_id: row.get(1)?,
        legal_name: row.get(2)?,
        trade_name: row.get(3)?,
        carrier_id: row.get(4)?,
        price_list_id: row.get(5)?,
        billing_method_id: row.get(6)?,
        activity_branch_id: row.get(7)?,
        external_id: row.get(8)?,
        raw_response: row.get(9)?,
        synced_at: row.get(10)?,
        last_error: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

// ============================================================================
// Error Mapping
// ============================================================================

fn map_join_error(err: task::JoinError) -> ErpSyncError {
    if err.is_cancelled() {
        ErpSyncError::Internal("blocking task cancelled".into())
    } else {
        ErpSyncError::Internal(format!("blocking task failed: {err}"))
    }
}

// ============================================================================
// Tests
// ============================================================================
