use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::calculator::engine::Operation;
use crate::calculator::repo::{Calculation, HistoryFilter};

/// Operands arrive as raw JSON values: numbers and numeric strings are both
/// accepted, the shared parse decides.
#[derive(Debug, Deserialize)]
pub struct BinaryOperands {
    pub a: serde_json::Value,
    pub b: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct UnaryOperand {
    pub a: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct CalculationResponse {
    pub success: bool,
    pub operation: Operation,
    pub operands: serde_json::Value,
    pub result: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation_id: Option<Uuid>,
    pub saved_to_history: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub operation: Option<Operation>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
}

fn default_limit() -> i64 {
    20
}

impl HistoryParams {
    /// Clamp to the store contract: limit 1..=100 (default 20), offset >= 0.
    pub fn normalized(self) -> HistoryFilter {
        HistoryFilter {
            limit: self.limit.clamp(1, 100),
            offset: self.offset.max(0),
            operation: self.operation,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    pub operation: Option<Operation>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub data: Vec<Calculation>,
    pub pagination: Pagination,
    pub filters: AppliedFilters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearedHistoryResponse {
    pub success: bool,
    pub message: &'static str,
    pub deleted_count: u64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse<T> {
    pub success: bool,
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_params_defaults() {
        let params: HistoryParams = serde_json::from_str("{}").unwrap();
        let filter = params.normalized();
        assert_eq!(filter.limit, 20);
        assert_eq!(filter.offset, 0);
        assert!(filter.operation.is_none());
    }

    #[test]
    fn history_params_clamp_out_of_range_values() {
        let params: HistoryParams =
            serde_json::from_str(r#"{"limit": 500, "offset": -3}"#).unwrap();
        let filter = params.normalized();
        assert_eq!(filter.limit, 100);
        assert_eq!(filter.offset, 0);
    }

    #[test]
    fn history_params_parse_filters() {
        let params: HistoryParams = serde_json::from_str(
            r#"{"operation": "division", "startDate": "2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(params.operation, Some(Operation::Division));
        assert!(params.start_date.is_some());
        assert!(params.end_date.is_none());
    }

    #[test]
    fn calculation_response_omits_id_for_anonymous_callers() {
        let response = CalculationResponse {
            success: true,
            operation: Operation::Addition,
            operands: serde_json::json!({"a": 10.0, "b": 5.0}),
            result: 15.0,
            calculation_id: None,
            saved_to_history: false,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("calculation_id").is_none());
        assert_eq!(json["saved_to_history"], false);
        assert_eq!(json["result"], 15.0);
    }
}
