use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::AppState;
use crate::aggregate::{
    self, CategoryTotal, ExpenseFilter, ExpenseStats, MonthlyTotal, Summary, order_expenses,
    requested_sort,
};
use crate::constants::{CSV_FILENAME, ERR_EXPENSE_NOT_FOUND};
use crate::database::Db;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, ApiQuery, AuthUser};
use crate::export::{to_csv, to_stored};
use crate::models::{
    CountResponse, Expense, ExpensePayload, ExpenseQuery, ExpenseResponse, ExportFormat,
    ExportQuery, MessageResponse, MonthQuery, StoredExpense,
};
use crate::utils::now_rfc3339;
use crate::validation::{ValidExpense, validate_expense, validate_payload};

const EXPENSE_COLUMNS: &str =
    "id, user_id, category, amount, date, description, created_at, updated_at";

pub fn extract_expense_from_row(row: &libsql::Row) -> anyhow::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
        description: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn new_expense(user_id: &str, valid: &ValidExpense) -> Expense {
    let now = now_rfc3339();
    Expense {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        category: valid.category.clone(),
        amount: valid.amount,
        date: valid.date.clone(),
        description: valid.description.clone(),
        created_at: now.clone(),
        updated_at: now,
    }
}

async fn write_expense(conn: &libsql::Connection, expense: &Expense) -> libsql::Result<u64> {
    conn.execute(
        "INSERT INTO expenses (id, user_id, category, amount, date, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        (
            expense.id.as_str(),
            expense.user_id.as_str(),
            expense.category.as_str(),
            expense.amount,
            expense.date.as_str(),
            expense.description.as_str(),
            expense.created_at.as_str(),
            expense.updated_at.as_str(),
        ),
    )
    .await
}

pub async fn insert_expense(db: &Db, user_id: &str, valid: &ValidExpense) -> anyhow::Result<Expense> {
    let expense = new_expense(user_id, valid);
    let conn = db.write().await;
    write_expense(&conn, &expense).await?;
    Ok(expense)
}

/// Inserts every row in one transaction; a failed row rolls the batch back.
pub async fn insert_expenses(
    db: &Db,
    user_id: &str,
    rows: &[ValidExpense],
) -> anyhow::Result<Vec<Expense>> {
    let conn = db.write().await;
    let tx = conn.transaction().await?;

    let mut inserted = Vec::with_capacity(rows.len());
    for valid in rows {
        let expense = new_expense(user_id, valid);
        if let Err(e) = write_expense(&tx, &expense).await {
            tx.rollback().await?;
            return Err(e.into());
        }
        inserted.push(expense);
    }

    tx.commit().await?;
    Ok(inserted)
}

/// All of a user's expenses in insertion order.
pub async fn fetch_expenses(db: &Db, user_id: &str) -> anyhow::Result<Vec<Expense>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!(
                "SELECT {} FROM expenses WHERE user_id = ? ORDER BY rowid",
                EXPENSE_COLUMNS
            ),
            [user_id],
        )
        .await?;

    let mut expenses = Vec::new();
    while let Some(row) = rows.next().await? {
        expenses.push(extract_expense_from_row(&row)?);
    }
    Ok(expenses)
}

pub async fn fetch_expense(db: &Db, user_id: &str, expense_id: &str) -> anyhow::Result<Option<Expense>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!(
                "SELECT {} FROM expenses WHERE id = ? AND user_id = ?",
                EXPENSE_COLUMNS
            ),
            (expense_id, user_id),
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_expense_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Overwrites the editable fields of an owned expense; `id` and
/// `created_at` are untouched. `None` when the expense does not exist or
/// belongs to someone else.
pub async fn apply_expense_update(
    db: &Db,
    user_id: &str,
    expense_id: &str,
    valid: &ValidExpense,
) -> anyhow::Result<Option<Expense>> {
    let now = now_rfc3339();
    let changed = {
        let conn = db.write().await;
        conn.execute(
            "UPDATE expenses SET category = ?, amount = ?, date = ?, description = ?, updated_at = ? WHERE id = ? AND user_id = ?",
            (
                valid.category.as_str(),
                valid.amount,
                valid.date.as_str(),
                valid.description.as_str(),
                now.as_str(),
                expense_id,
                user_id,
            ),
        )
        .await?
    };

    if changed == 0 {
        return Ok(None);
    }
    fetch_expense(db, user_id, expense_id).await
}

pub async fn remove_expense(db: &Db, user_id: &str, expense_id: &str) -> anyhow::Result<bool> {
    let conn = db.write().await;
    let removed = conn
        .execute(
            "DELETE FROM expenses WHERE id = ? AND user_id = ?",
            (expense_id, user_id),
        )
        .await?;
    Ok(removed > 0)
}

pub async fn remove_all_expenses(db: &Db, user_id: &str) -> anyhow::Result<u64> {
    let conn = db.write().await;
    let removed = conn
        .execute("DELETE FROM expenses WHERE user_id = ?", [user_id])
        .await?;
    Ok(removed)
}

async fn month_scoped(state: &AppState, user_id: &str, month: Option<&str>) -> ApiResult<Vec<Expense>> {
    let all = fetch_expenses(&state.db, user_id).await?;
    let filter = ExpenseFilter::new(month, None, None);
    Ok(aggregate::filter_expenses(&all, &filter))
}

pub async fn list_expenses(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiQuery(query): ApiQuery<ExpenseQuery>,
) -> ApiResult<Json<Vec<Expense>>> {
    let all = fetch_expenses(&state.db, &user.id).await?;

    let mut expenses = aggregate::filter_expenses(&all, &ExpenseFilter::from(&query));
    order_expenses(&mut expenses, requested_sort(&query));

    Ok(Json(expenses))
}

pub async fn create_expense(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<ExpensePayload>,
) -> ApiResult<(StatusCode, Json<ExpenseResponse>)> {
    let valid = validate_payload(&payload)?;

    let expense = insert_expense(&state.db, &user.id, &valid).await?;
    tracing::info!(user_id = %user.id, expense_id = %expense.id, "expense created");

    Ok((
        StatusCode::CREATED,
        Json(ExpenseResponse {
            success: true,
            message: "Expense created successfully".to_string(),
            expense,
        }),
    ))
}

pub async fn update_expense(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(expense_id): Path<String>,
    ApiJson(payload): ApiJson<ExpensePayload>,
) -> ApiResult<Json<ExpenseResponse>> {
    let valid = validate_payload(&payload)?;

    let expense = apply_expense_update(&state.db, &user.id, &expense_id, &valid)
        .await?
        .ok_or_else(|| ApiError::not_found(ERR_EXPENSE_NOT_FOUND))?;
    tracing::info!(user_id = %user.id, %expense_id, "expense updated");

    Ok(Json(ExpenseResponse {
        success: true,
        message: "Expense updated successfully".to_string(),
        expense,
    }))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(expense_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {

    if !remove_expense(&state.db, &user.id, &expense_id).await? {
        return Err(ApiError::not_found(ERR_EXPENSE_NOT_FOUND));
    }
    tracing::info!(user_id = %user.id, %expense_id, "expense deleted");

    Ok(Json(MessageResponse::ok("Expense deleted successfully")))
}

pub async fn clear_expenses(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<CountResponse>> {
    let count = remove_all_expenses(&state.db, &user.id).await?;
    tracing::info!(user_id = %user.id, count, "expenses cleared");

    Ok(Json(CountResponse {
        success: true,
        count,
    }))
}

pub async fn expense_stats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiQuery(query): ApiQuery<MonthQuery>,
) -> ApiResult<Json<ExpenseStats>> {
    let expenses = month_scoped(&state, &user.id, query.month.as_deref()).await?;
    Ok(Json(aggregate::stats(&expenses)))
}

pub async fn category_breakdown(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiQuery(query): ApiQuery<MonthQuery>,
) -> ApiResult<Json<Vec<CategoryTotal>>> {
    let expenses = month_scoped(&state, &user.id, query.month.as_deref()).await?;
    Ok(Json(aggregate::category_totals(&expenses)))
}

pub async fn monthly_breakdown(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<MonthlyTotal>>> {
    let expenses = fetch_expenses(&state.db, &user.id).await?;
    Ok(Json(aggregate::monthly_totals(&expenses)))
}

pub async fn expense_summary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiQuery(query): ApiQuery<ExpenseQuery>,
) -> ApiResult<Json<Summary>> {
    let all = fetch_expenses(&state.db, &user.id).await?;

    let mut summary = aggregate::summarize(&all, &ExpenseFilter::from(&query));
    order_expenses(&mut summary.expenses, requested_sort(&query));

    Ok(Json(summary))
}

pub async fn export_expenses(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiQuery(query): ApiQuery<ExportQuery>,
) -> ApiResult<Response> {
    let expenses = fetch_expenses(&state.db, &user.id).await?;

    let response = match query.format {
        ExportFormat::Csv => (
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", CSV_FILENAME),
                ),
            ],
            to_csv(&expenses),
        )
            .into_response(),
        ExportFormat::Json => Json(to_stored(&expenses)).into_response(),
    };
    Ok(response)
}

/// Imports rows in the browser storage layout. Every row is validated
/// before the batch is written in one transaction; stored ids are replaced
/// with fresh ones.
pub async fn import_expenses(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(rows): ApiJson<Vec<StoredExpense>>,
) -> ApiResult<(StatusCode, Json<CountResponse>)> {

    let mut valid_rows = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let (category, amount, date) =
            validate_expense(row.category.as_deref(), row.amount.as_ref(), row.date.as_deref())
                .map_err(|e| ApiError::bad_request(format!("Row {}: {}", index, e)))?;
        valid_rows.push(ValidExpense {
            category,
            amount,
            date,
            description: String::new(),
        });
    }

    let count = insert_expenses(&state.db, &user.id, &valid_rows).await?.len() as u64;
    tracing::info!(user_id = %user.id, count, "expenses imported");

    Ok((
        StatusCode::CREATED,
        Json(CountResponse {
            success: true,
            count,
        }),
    ))
}
