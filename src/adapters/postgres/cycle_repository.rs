//! PostgreSQL implementation of CycleRepository.
//!
//! Persists cycle records to the `cycles` table. The partial unique index
//! `uq_cycles_user_in_progress` backs the one-running-cycle rule.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::cycle::{CycleDates, CycleRecord};
use crate::domain::foundation::{
    CycleId, CycleStatus, DomainError, ErrorCode, Timestamp, UserId,
};
use crate::ports::CycleRepository;

const SELECT_COLUMNS: &str =
    "id, user_id, status, start_date, end_date, notes, created_at, updated_at";

/// PostgreSQL implementation of CycleRepository.
#[derive(Clone)]
pub struct PostgresCycleRepository {
    pool: PgPool,
}

impl PostgresCycleRepository {
    /// Creates a new PostgresCycleRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CycleRepository for PostgresCycleRepository {
    async fn create(&self, record: &CycleRecord) -> Result<CycleRecord, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO cycles (
                id, user_id, status, start_date, end_date, notes, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.user_id.as_str())
        .bind(record.status.as_db_str())
        .bind(record.start_date.as_datetime())
        .bind(record.end_date.as_datetime())
        .bind(record.notes.as_deref())
        .bind(record.created_at.as_datetime())
        .bind(record.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => DomainError::new(
                ErrorCode::CycleAlreadyInProgress,
                format!("User {} already has a cycle in progress", record.user_id),
            )
            .with_detail("user_id", record.user_id.as_str()),
            _ => DomainError::database(format!("Failed to insert cycle: {}", e)),
        })?;

        Ok(record.clone())
    }

    async fn update_dates(
        &self,
        id: &CycleId,
        dates: &CycleDates,
    ) -> Result<CycleRecord, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE cycles SET
                start_date = $2,
                end_date = $3,
                updated_at = $4
            WHERE id = $1 AND status = 'in_progress'
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(dates.start_date().as_datetime())
        .bind(dates.end_date().as_datetime())
        .bind(Timestamp::now().as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update cycle dates: {}", e)))?;

        match row {
            Some(row) => row_to_record(&row),
            None => Err(not_found(id)),
        }
    }

    async fn complete(
        &self,
        id: &CycleId,
        dates: &CycleDates,
    ) -> Result<CycleRecord, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE cycles SET
                status = $2,
                start_date = $3,
                end_date = $4,
                updated_at = $5
            WHERE id = $1
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(CycleStatus::Completed.as_db_str())
        .bind(dates.start_date().as_datetime())
        .bind(dates.end_date().as_datetime())
        .bind(Timestamp::now().as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to complete cycle: {}", e)))?;

        match row {
            Some(row) => row_to_record(&row),
            None => Err(not_found(id)),
        }
    }

    async fn find_by_id(&self, id: &CycleId) -> Result<Option<CycleRecord>, DomainError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM cycles WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to fetch cycle: {}", e)))?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn find_in_progress(&self, user_id: &UserId) -> Result<Option<CycleRecord>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM cycles WHERE user_id = $1 AND status = 'in_progress'"
        ))
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch active cycle: {}", e)))?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn find_last_completed(
        &self,
        user_id: &UserId,
    ) -> Result<Option<CycleRecord>, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM cycles
            WHERE user_id = $1 AND status = 'completed'
            ORDER BY end_date DESC
            LIMIT 1
            "#
        ))
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch last cycle: {}", e)))?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<CycleRecord>, DomainError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM cycles
            WHERE user_id = $1
            ORDER BY start_date DESC
            LIMIT $2
            "#
        ))
        .bind(user_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list cycles: {}", e)))?;

        rows.iter().map(row_to_record).collect()
    }

    async fn list_completed(&self, user_id: &UserId) -> Result<Vec<CycleRecord>, DomainError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM cycles
            WHERE user_id = $1 AND status = 'completed'
            ORDER BY start_date DESC
            "#
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list completed cycles: {}", e)))?;

        rows.iter().map(row_to_record).collect()
    }

    async fn delete(&self, id: &CycleId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM cycles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to delete cycle: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM cycles WHERE user_id = $1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to delete user cycles: {}", e)))?;

        Ok(result.rows_affected())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Helper Functions
// ════════════════════════════════════════════════════════════════════════════════

fn not_found(id: &CycleId) -> DomainError {
    DomainError::new(ErrorCode::CycleNotFound, format!("Cycle not found: {}", id))
        .with_detail("cycle_id", id.to_string())
}

fn row_to_record(row: &sqlx::postgres::PgRow) -> Result<CycleRecord, DomainError> {
    let id: Uuid = row.get("id");
    let user_id: String = row.get("user_id");
    let status: String = row.get("status");
    let start_date: chrono::DateTime<chrono::Utc> = row.get("start_date");
    let end_date: chrono::DateTime<chrono::Utc> = row.get("end_date");
    let notes: Option<String> = row.get("notes");
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
    let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

    Ok(CycleRecord {
        id: CycleId::from_uuid(id),
        user_id: UserId::new(user_id)
            .map_err(|e| DomainError::new(ErrorCode::InvalidFormat, e.to_string()))?,
        status: str_to_cycle_status(&status)?,
        start_date: Timestamp::from_datetime(start_date),
        end_date: Timestamp::from_datetime(end_date),
        notes,
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
    })
}

fn str_to_cycle_status(s: &str) -> Result<CycleStatus, DomainError> {
    CycleStatus::from_db_str(s).ok_or_else(|| {
        DomainError::new(
            ErrorCode::InvalidFormat,
            format!("Invalid cycle status: {}", s),
        )
    })
}
