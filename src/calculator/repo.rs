use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{calculator::engine::Operation, error::ApiError};

/// One past arithmetic operation. Rows are append-only: never updated, only
/// read, aggregated or bulk-deleted per user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub operation: Operation,
    pub operands: serde_json::Value,
    pub result: f64,
    pub user_agent: Option<String>,
    pub client_ip: Option<String>,
    pub created_at: OffsetDateTime,
}

pub struct NewCalculation<'a> {
    pub user_id: Uuid,
    pub operation: Operation,
    pub operands: serde_json::Value,
    pub result: f64,
    pub user_agent: Option<&'a str>,
    pub client_ip: Option<&'a str>,
}

/// Normalized history query: limit already clamped to 1..=100, offset >= 0.
#[derive(Debug, Clone)]
pub struct HistoryFilter {
    pub limit: i64,
    pub offset: i64,
    pub operation: Option<Operation>,
    pub start_date: Option<OffsetDateTime>,
    pub end_date: Option<OffsetDateTime>,
}

/// History page plus the total count matching the filter.
#[derive(Debug)]
pub struct HistoryPage {
    pub entries: Vec<Calculation>,
    pub total: i64,
}

impl HistoryPage {
    pub fn has_more(&self, filter: &HistoryFilter) -> bool {
        filter.offset + filter.limit < self.total
    }
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OperationStat {
    pub operation: Operation,
    pub count: i64,
    pub last_used: OffsetDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_calculations: i64,
    pub operation_stats: Vec<OperationStat>,
    pub first_calculation: Option<OffsetDateTime>,
    pub last_calculation: Option<OffsetDateTime>,
}

const CALC_COLUMNS: &str =
    "id, user_id, operation, operands, result, user_agent, client_ip, created_at";

impl Calculation {
    pub async fn record(db: &PgPool, new: NewCalculation<'_>) -> Result<Calculation, ApiError> {
        let row = sqlx::query_as::<_, Calculation>(&format!(
            r#"
            INSERT INTO calculations (user_id, operation, operands, result, user_agent, client_ip)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CALC_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.operation)
        .bind(new.operands)
        .bind(new.result)
        .bind(new.user_agent)
        .bind(new.client_ip)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    /// Entries for one user only, newest first, with optional operation and
    /// inclusive date-range filters.
    pub async fn history(
        db: &PgPool,
        user_id: Uuid,
        filter: &HistoryFilter,
    ) -> Result<HistoryPage, ApiError> {
        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM calculations
            WHERE user_id = $1
              AND ($2::calc_operation IS NULL OR operation = $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
              AND ($4::timestamptz IS NULL OR created_at <= $4)
            "#,
        )
        .bind(user_id)
        .bind(filter.operation)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(db)
        .await?;

        let entries = sqlx::query_as::<_, Calculation>(&format!(
            r#"
            SELECT {CALC_COLUMNS}
            FROM calculations
            WHERE user_id = $1
              AND ($2::calc_operation IS NULL OR operation = $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
              AND ($4::timestamptz IS NULL OR created_at <= $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(user_id)
        .bind(filter.operation)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(db)
        .await?;

        Ok(HistoryPage { entries, total })
    }

    /// Delete all entries for the user; returns how many were removed.
    pub async fn clear(db: &PgPool, user_id: Uuid) -> Result<u64, ApiError> {
        let result = sqlx::query("DELETE FROM calculations WHERE user_id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn stats(db: &PgPool, user_id: Uuid) -> Result<UserStats, ApiError> {
        let operation_stats = sqlx::query_as::<_, OperationStat>(
            r#"
            SELECT operation, COUNT(*) AS count, MAX(created_at) AS last_used
            FROM calculations
            WHERE user_id = $1
            GROUP BY operation
            ORDER BY count DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;

        let (total_calculations, first_calculation, last_calculation): (
            i64,
            Option<OffsetDateTime>,
            Option<OffsetDateTime>,
        ) = sqlx::query_as(
            "SELECT COUNT(*), MIN(created_at), MAX(created_at) FROM calculations WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(db)
        .await?;

        Ok(UserStats {
            total_calculations,
            operation_stats,
            first_calculation,
            last_calculation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(limit: i64, offset: i64) -> HistoryFilter {
        HistoryFilter {
            limit,
            offset,
            operation: None,
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn has_more_reflects_remaining_rows() {
        let page = HistoryPage {
            entries: Vec::new(),
            total: 3,
        };
        assert!(page.has_more(&filter(2, 0)));
        assert!(!page.has_more(&filter(2, 2)));
        assert!(!page.has_more(&filter(20, 0)));
    }

    #[test]
    fn empty_stats_shape() {
        let stats = UserStats {
            total_calculations: 0,
            operation_stats: Vec::new(),
            first_calculation: None,
            last_calculation: None,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalCalculations"], 0);
        assert!(json["operationStats"].as_array().unwrap().is_empty());
        assert!(json["firstCalculation"].is_null());
    }
}
