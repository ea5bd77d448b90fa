//! Transactions, budgets and monthly finance reports

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracker_core::finance::{category_breakdown, monthly_trend, spent_by_category, MonthTotals};
use tracker_core::{BudgetProgress, CategoryTotal, MonthKey, MonthlySummary, TransactionKind};
use uuid::Uuid;

use super::current_month;
use crate::db::repos::{
    Budget, BudgetInput, Transaction, TransactionFilter, TransactionInput, TransactionRepo,
};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, Json, Path, Query};
use crate::http::server::AppState;
use crate::models::fields::{optional_text, positive, required_text, MAX_TEXT_LEN, MAX_TITLE_LEN, MONEY};
use crate::models::{Paginated, Pagination, PaginationParams, ValidationError};

/// Default and maximum length of a trend series, in months.
const DEFAULT_TREND_MONTHS: u32 = 6;
const MAX_TREND_MONTHS: u32 = 36;

#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub category: String,
    pub description: Option<String>,
    pub occurred_on: NaiveDate,
}

impl TransactionRequest {
    fn validate(self) -> Result<TransactionInput, ValidationError> {
        Ok(TransactionInput {
            kind: self.kind,
            amount: positive("amount", self.amount, MONEY)?,
            category: required_text("category", &self.category, MAX_TITLE_LEN)?,
            description: optional_text("description", self.description.as_deref(), MAX_TEXT_LEN)?,
            occurred_on: self.occurred_on,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    pub month: Option<MonthKey>,
    pub category: Option<String>,
    pub kind: Option<TransactionKind>,
}

#[derive(Debug, Deserialize)]
pub struct BudgetRequest {
    pub category: String,
    pub month: MonthKey,
    pub amount: Decimal,
}

impl BudgetRequest {
    fn validate(self) -> Result<BudgetInput, ValidationError> {
        Ok(BudgetInput {
            category: required_text("category", &self.category, MAX_TITLE_LEN)?,
            month: self.month,
            amount: positive("amount", self.amount, MONEY)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub month: Option<MonthKey>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendQuery {
    pub month: Option<MonthKey>,
    pub months: Option<u32>,
}

/// Monthly totals plus per-category breakdowns
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: MonthlySummary,
    pub expense_breakdown: Vec<CategoryTotal>,
    pub income_breakdown: Vec<CategoryTotal>,
}

#[derive(Debug, Serialize)]
pub struct BudgetProgressResponse {
    pub budget_id: Uuid,
    pub category: String,
    pub month: MonthKey,
    #[serde(flatten)]
    pub progress: BudgetProgress,
}

// ---- transactions ----

/// GET /api/transactions
async fn list_transactions(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Paginated<Transaction>>, ApiError> {
    let filter = TransactionFilter {
        month: query.month,
        category: query.category.filter(|c| !c.trim().is_empty()),
        kind: query.kind,
    };
    let page = TransactionRepo::new(&state.pool)
        .list(user, &filter, Pagination::from(params))
        .await?;
    Ok(Json(page))
}

/// POST /api/transactions
async fn create_transaction(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let input = req.validate()?;
    let txn = TransactionRepo::new(&state.pool).create(user, input).await?;
    Ok((StatusCode::CREATED, Json(txn)))
}

/// GET /api/transactions/{id}
async fn get_transaction(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, ApiError> {
    Ok(Json(TransactionRepo::new(&state.pool).get(user, id).await?))
}

/// PUT /api/transactions/{id}
async fn update_transaction(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<TransactionRequest>,
) -> Result<Json<Transaction>, ApiError> {
    let input = req.validate()?;
    Ok(Json(TransactionRepo::new(&state.pool).update(user, id, input).await?))
}

/// DELETE /api/transactions/{id}
async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    TransactionRepo::new(&state.pool).delete(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- reports ----

/// GET /api/finance/summary?month=YYYY-MM
async fn summary(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<MonthQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let month = query.month.unwrap_or_else(current_month);
    let rows = TransactionRepo::new(&state.pool).in_month(user, month).await?;

    Ok(Json(SummaryResponse {
        summary: MonthlySummary::from_entries(month, &rows),
        expense_breakdown: category_breakdown(&rows, TransactionKind::Expense),
        income_breakdown: category_breakdown(&rows, TransactionKind::Income),
    }))
}

/// GET /api/finance/trend?month=YYYY-MM&months=N
async fn trend(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<TrendQuery>,
) -> Result<Json<Vec<MonthTotals>>, ApiError> {
    let end = query.month.unwrap_or_else(current_month);
    let months = query.months.unwrap_or(DEFAULT_TREND_MONTHS);
    if months == 0 || months > MAX_TREND_MONTHS {
        return Err(ValidationError::InvalidRange {
            field: "months",
            reason: "must be between 1 and 36",
        }
        .into());
    }

    let mut start = end;
    for _ in 1..months {
        start = start.prev();
    }

    let rows = TransactionRepo::new(&state.pool)
        .between(user, start.first_day(), end.last_day())
        .await?;
    Ok(Json(monthly_trend(&rows, end, months)))
}

// ---- budgets ----

/// GET /api/budgets?month=YYYY-MM
async fn list_budgets(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<Budget>>, ApiError> {
    let budgets = TransactionRepo::new(&state.pool)
        .list_budgets(user, query.month)
        .await?;
    Ok(Json(budgets))
}

/// POST /api/budgets
async fn create_budget(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<BudgetRequest>,
) -> Result<(StatusCode, Json<Budget>), ApiError> {
    let input = req.validate()?;
    let budget = TransactionRepo::new(&state.pool).create_budget(user, input).await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

/// GET /api/budgets/{id}
async fn get_budget(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Budget>, ApiError> {
    Ok(Json(TransactionRepo::new(&state.pool).get_budget(user, id).await?))
}

/// PUT /api/budgets/{id}
async fn update_budget(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<BudgetRequest>,
) -> Result<Json<Budget>, ApiError> {
    let input = req.validate()?;
    Ok(Json(
        TransactionRepo::new(&state.pool).update_budget(user, id, input).await?,
    ))
}

/// DELETE /api/budgets/{id}
async fn delete_budget(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    TransactionRepo::new(&state.pool).delete_budget(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/budgets/progress?month=YYYY-MM - spending against each budget
async fn budget_progress(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<BudgetProgressResponse>>, ApiError> {
    let month = query.month.unwrap_or_else(current_month);
    let repo = TransactionRepo::new(&state.pool);

    let budgets = repo.list_budgets(user, Some(month)).await?;
    let rows = repo.in_month(user, month).await?;
    let spent = spent_by_category(&rows);

    Ok(Json(progress_report(month, budgets, &spent)))
}

fn progress_report(
    month: MonthKey,
    budgets: Vec<Budget>,
    spent: &std::collections::BTreeMap<String, Decimal>,
) -> Vec<BudgetProgressResponse> {
    budgets
        .into_iter()
        .map(|b| {
            let used = spent.get(&b.category).copied().unwrap_or(Decimal::ZERO);
            BudgetProgressResponse {
                budget_id: b.id,
                progress: BudgetProgress::new(b.amount, used),
                category: b.category,
                month,
            }
        })
        .collect()
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route(
            "/transactions/{id}",
            get(get_transaction).put(update_transaction).delete(delete_transaction),
        )
        .route("/finance/summary", get(summary))
        .route("/finance/trend", get(trend))
        .route("/budgets", get(list_budgets).post(create_budget))
        .route("/budgets/progress", get(budget_progress))
        .route(
            "/budgets/{id}",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use tracker_core::BudgetStatus;

    #[test]
    fn zero_amount_rejected() {
        let req: TransactionRequest = serde_json::from_value(serde_json::json!({
            "kind": "expense",
            "amount": "0",
            "category": "food",
            "occurred_on": "2024-03-01"
        }))
        .unwrap();
        assert_eq!(
            req.validate().unwrap_err(),
            ValidationError::NotPositive { field: "amount" }
        );
    }

    #[test]
    fn sub_cent_amount_rejected_before_database() {
        let req: TransactionRequest = serde_json::from_value(serde_json::json!({
            "kind": "expense",
            "amount": "0.004",
            "category": "food",
            "occurred_on": "2024-03-01"
        }))
        .unwrap();
        assert_eq!(
            req.validate().unwrap_err(),
            ValidationError::TooPrecise { field: "amount", scale: 2 }
        );
    }

    #[test]
    fn amount_wider_than_column_rejected() {
        let req: TransactionRequest = serde_json::from_value(serde_json::json!({
            "kind": "income",
            "amount": "1000000000000",
            "category": "salary",
            "occurred_on": "2024-03-01"
        }))
        .unwrap();
        assert_eq!(
            req.validate().unwrap_err(),
            ValidationError::TooLarge { field: "amount" }
        );
    }

    #[test]
    fn budget_month_must_be_year_month() {
        let bad: Result<BudgetRequest, _> = serde_json::from_value(serde_json::json!({
            "category": "food",
            "month": "2024-3",
            "amount": 100
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn progress_defaults_to_zero_spent() {
        let month: MonthKey = "2024-03".parse().unwrap();
        let now = Utc::now();
        let budget = |category: &str, amount| Budget {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            category: category.into(),
            month: month.first_day(),
            amount,
            created_at: now,
            updated_at: now,
        };
        let spent = BTreeMap::from([("food".to_string(), dec!(450))]);

        let report = progress_report(month, vec![budget("food", dec!(400)), budget("fun", dec!(50))], &spent);
        assert_eq!(report[0].progress.status, BudgetStatus::Over);
        assert_eq!(report[0].progress.remaining, dec!(-50));
        assert_eq!(report[1].progress.spent, Decimal::ZERO);
        assert_eq!(report[1].progress.status, BudgetStatus::Under);
    }
}
