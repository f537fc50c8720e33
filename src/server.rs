// 🌐 Web Server - ledger and gallery pages plus a small JSON API

use anyhow::{anyhow, Result};
use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::config::IMAGE_URL_PREFIX;
use crate::db;
use crate::gallery::list_images_or_empty;
use crate::ledger::{Ledger, SortKey, Transaction};
use crate::render::{render_gallery_page, render_ledger_page, LedgerView};

// ============================================================================
// STATE
// ============================================================================

/// Where each request gets its ledger from
#[derive(Clone)]
pub enum LedgerStore {
    /// Fresh seed records on every request; additions vanish afterwards
    Seeded,
    /// Records loaded from and appended to SQLite
    Sqlite(Arc<Mutex<Connection>>),
}

impl LedgerStore {
    pub fn sqlite(conn: Connection) -> Self {
        LedgerStore::Sqlite(Arc::new(Mutex::new(conn)))
    }

    fn load(&self) -> Result<Ledger> {
        match self {
            LedgerStore::Seeded => Ok(Ledger::seeded()),
            LedgerStore::Sqlite(db) => {
                let conn = db.lock().map_err(|_| anyhow!("database lock poisoned"))?;
                db::load_ledger(&conn)
            }
        }
    }

    fn append(&self, ledger: &mut Ledger, new_tx: &NewTransaction) -> Result<Transaction> {
        match self {
            LedgerStore::Seeded => Ok(ledger
                .add(new_tx.date, new_tx.amount, &new_tx.description, &new_tx.merchant)
                .clone()),
            LedgerStore::Sqlite(db) => {
                let conn = db.lock().map_err(|_| anyhow!("database lock poisoned"))?;
                let inserted = db::append_transaction(
                    &conn,
                    new_tx.date,
                    new_tx.amount,
                    &new_tx.description,
                    &new_tx.merchant,
                )?;

                Ok(ledger.push(inserted).clone())
            }
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: LedgerStore,
    pub image_dir: PathBuf,
}

// ============================================================================
// REQUEST TYPES
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct SortQuery {
    pub sort: Option<String>,
}

impl SortQuery {
    fn key(&self) -> Option<SortKey> {
        self.sort.as_deref().and_then(SortKey::parse)
    }
}

/// Fields of the three ledger forms; every form posts a subset
#[derive(Debug, Default, Deserialize)]
pub struct LedgerForm {
    pub search: Option<String>,
    pub search_id: Option<String>,
    pub date: Option<String>,
    pub amount: Option<String>,
    pub description: Option<String>,
    pub merchant: Option<String>,
    pub add: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub amount: f64,
    pub description: String,
    pub merchant: String,
}

impl LedgerForm {
    /// Validate the add-transaction fields
    pub fn new_transaction(&self) -> std::result::Result<NewTransaction, &'static str> {
        let date = self
            .date
            .as_deref()
            .map(str::trim)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .ok_or("Date must be a valid YYYY-MM-DD date.")?;

        let amount = self
            .amount
            .as_deref()
            .map(str::trim)
            .and_then(|a| a.parse::<f64>().ok())
            .filter(|a| a.is_finite())
            .ok_or("Amount must be a number.")?;

        let description = required_text(self.description.as_deref())
            .ok_or("Description is required.")?;
        let merchant = required_text(self.merchant.as_deref())
            .ok_or("Merchant is required.")?;

        Ok(NewTransaction {
            date,
            amount,
            description,
            merchant,
        })
    }
}

fn required_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Integer prefix of `value` after leading whitespace: "2abc" -> 2, " 1.9" -> 1.
/// Input without leading digits reads as 0, which matches no record.
pub fn parse_leading_int(value: &str) -> i64 {
    let trimmed = value.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let mut n: i64 = 0;
    for d in digits.chars().map_while(|c| c.to_digit(10)) {
        n = n.saturating_mul(10).saturating_add(d as i64);
    }

    if negative {
        -n
    } else {
        n
    }
}

// ============================================================================
// LEDGER PAGE
// ============================================================================

/// Runs search, ID lookup, sort and append in the same order as the page
/// always has: both searches see the unsorted ledger, additions land last.
fn build_ledger_page(store: &LedgerStore, sort: Option<SortKey>, form: &LedgerForm) -> Result<String> {
    let mut ledger = store.load()?;

    let search_results = match &form.search {
        Some(term) => ledger.find_by_description(term.trim()),
        None => Vec::new(),
    };

    let found_by_id = form
        .search_id
        .as_deref()
        .map(parse_leading_int)
        .and_then(|id| ledger.find_by_id(id).cloned());

    if let Some(key) = sort {
        ledger.sort(key);
    }

    let mut notice = None;
    if form.add.is_some() {
        match form.new_transaction() {
            Ok(new_tx) => match store.append(&mut ledger, &new_tx) {
                Ok(added) => {
                    tracing::info!(id = added.id, amount = added.amount, "transaction added");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "transaction not added");
                    notice = Some(e.to_string());
                }
            },
            Err(msg) => {
                tracing::debug!(reason = msg, "rejected add form");
                notice = Some(msg.to_string());
            }
        }
    }

    let view = LedgerView {
        transactions: ledger.transactions(),
        search_results: &search_results,
        found_by_id: found_by_id.as_ref(),
        notice: notice.as_deref(),
        today: Local::now().date_naive(),
    };

    Ok(render_ledger_page(&view))
}

fn html_or_500(page: Result<String>) -> Response {
    match page {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render ledger");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// GET / - Ledger page
async fn ledger_page(State(state): State<AppState>, Query(query): Query<SortQuery>) -> Response {
    html_or_500(build_ledger_page(&state.store, query.key(), &LedgerForm::default()))
}

/// POST / - Ledger page after a search or add form
async fn ledger_submit(
    State(state): State<AppState>,
    Query(query): Query<SortQuery>,
    Form(form): Form<LedgerForm>,
) -> Response {
    html_or_500(build_ledger_page(&state.store, query.key(), &form))
}

// ============================================================================
// GALLERY PAGE
// ============================================================================

/// GET /gallery - Image grid of the gallery directory
async fn gallery_page(State(state): State<AppState>) -> impl IntoResponse {
    let files = list_images_or_empty(&state.image_dir);
    tracing::debug!(count = files.len(), "rendering gallery");
    Html(render_gallery_page(IMAGE_URL_PREFIX, &files))
}

// ============================================================================
// JSON API
// ============================================================================

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(data: T, error: String) -> Self {
        Self {
            success: false,
            data,
            error: Some(error),
        }
    }
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/transactions - Ledger as JSON, honouring `sort`
async fn get_transactions(State(state): State<AppState>, Query(query): Query<SortQuery>) -> Response {
    match state.store.load() {
        Ok(mut ledger) => {
            if let Some(key) = query.key() {
                ledger.sort(key);
            }
            (StatusCode::OK, Json(ApiResponse::ok(ledger.into_transactions()))).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to load transactions");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(Vec::<Transaction>::new(), e.to_string())),
            )
                .into_response()
        }
    }
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/transactions", get(get_transactions));

    Router::new()
        .route("/", get(ledger_page).post(ledger_submit))
        .route("/ledger", get(ledger_page).post(ledger_submit))
        .route("/gallery", get(gallery_page))
        .nest("/api", api_routes)
        .nest_service(IMAGE_URL_PREFIX, ServeDir::new(state.image_dir.clone()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn seeded_state(image_dir: PathBuf) -> AppState {
        AppState {
            store: LedgerStore::Seeded,
            image_dir,
        }
    }

    fn sqlite_state(image_dir: PathBuf) -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        db::setup_database(&conn).unwrap();
        db::seed_if_empty(&conn).unwrap();
        AppState {
            store: LedgerStore::sqlite(conn),
            image_dir,
        }
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_req(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn form(pairs: &[(&str, &str)]) -> LedgerForm {
        let mut form = LedgerForm::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "date" => form.date = value,
                "amount" => form.amount = value,
                "description" => form.description = value,
                "merchant" => form.merchant = value,
                _ => {}
            }
        }
        form
    }

    #[test]
    fn test_new_transaction_validation() {
        let valid = form(&[
            ("date", "2024-05-01"),
            ("amount", "19.99"),
            ("description", " Books "),
            ("merchant", "Library"),
        ]);
        let parsed = valid.new_transaction().unwrap();
        assert_eq!(parsed.amount, 19.99);
        assert_eq!(parsed.description, "Books");

        let bad_date = form(&[("date", "05/01/2024"), ("amount", "1"), ("description", "x"), ("merchant", "y")]);
        assert!(bad_date.new_transaction().is_err());

        let bad_amount = form(&[("date", "2024-05-01"), ("amount", "abc"), ("description", "x"), ("merchant", "y")]);
        assert_eq!(bad_amount.new_transaction(), Err("Amount must be a number."));

        let missing_merchant = form(&[("date", "2024-05-01"), ("amount", "1"), ("description", "x")]);
        assert_eq!(missing_merchant.new_transaction(), Err("Merchant is required."));
    }

    #[tokio::test]
    async fn test_get_ledger_page() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(seeded_state(dir.path().to_path_buf()));

        let (status, body) = send(app, get_req("/")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<td>Payment for groceries</td>"));
        assert!(body.contains("<td><strong>175.50 $</strong></td>"));
    }

    #[tokio::test]
    async fn test_sort_by_amount_and_date() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(seeded_state(dir.path().to_path_buf()));

        let (_, by_amount) = send(app.clone(), get_req("/?sort=amount")).await;
        let groceries = by_amount.find("Payment for groceries").unwrap();
        let dinner = by_amount.find("Dinner with friends").unwrap();
        assert!(groceries < dinner);

        let (_, by_date) = send(app, get_req("/ledger?sort=date")).await;
        let groceries = by_date.find("Payment for groceries").unwrap();
        let dinner = by_date.find("Dinner with friends").unwrap();
        assert!(dinner < groceries);
    }

    #[tokio::test]
    async fn test_post_search_forms() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(seeded_state(dir.path().to_path_buf()));

        let (status, body) = send(app.clone(), post_req("/", "search=++DINNER+")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.matches("<td>Dinner with friends</td>").count(), 2);
        assert!(body.contains("No transaction found with this ID."));

        let (_, body) = send(app.clone(), post_req("/", "search_id=1")).await;
        assert_eq!(body.matches("<td>Payment for groceries</td>").count(), 2);
        assert!(body.contains("No results found."));

        let (_, body) = send(app.clone(), post_req("/", "search_id=abc")).await;
        assert!(body.contains("No transaction found with this ID."));

        let (_, body) = send(app, post_req("/", "search_id=2abc")).await;
        assert_eq!(body.matches("<td>Dinner with friends</td>").count(), 2);
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("2"), 2);
        assert_eq!(parse_leading_int("2abc"), 2);
        assert_eq!(parse_leading_int(" 1.9"), 1);
        assert_eq!(parse_leading_int("-3"), -3);
        assert_eq!(parse_leading_int("+7x"), 7);
        assert_eq!(parse_leading_int("abc"), 0);
        assert_eq!(parse_leading_int(""), 0);
    }

    #[tokio::test]
    async fn test_add_is_forgotten_in_seeded_mode() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(seeded_state(dir.path().to_path_buf()));

        let (_, body) = send(
            app.clone(),
            post_req(
                "/?sort=amount",
                "date=2024-01-15&amount=500&description=New+phone&merchant=Phone+Shop&add=",
            ),
        )
        .await;
        assert!(body.contains("<td>New phone</td>"));
        assert!(body.contains("<td>500.00 $</td>"));
        assert!(body.contains("<td><strong>675.50 $</strong></td>"));
        // appended after sorting, so it stays last despite the largest amount
        assert!(body.find("Dinner with friends").unwrap() < body.find("New phone").unwrap());

        let (_, body) = send(app, get_req("/")).await;
        assert!(!body.contains("New phone"));
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_amount() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(seeded_state(dir.path().to_path_buf()));

        let (status, body) = send(
            app,
            post_req("/", "date=2024-01-15&amount=lots&description=x&merchant=y&add="),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<p class=\"notice\">Amount must be a number.</p>"));
        assert!(body.contains("<td><strong>175.50 $</strong></td>"));
    }

    #[tokio::test]
    async fn test_add_persists_in_sqlite_mode() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(sqlite_state(dir.path().to_path_buf()));

        send(
            app.clone(),
            post_req("/", "date=2024-01-15&amount=12.5&description=Tea&merchant=Tea+House&add="),
        )
        .await;

        let (_, body) = send(app, get_req("/")).await;
        assert!(body.contains("<td>Tea</td>"));
        assert!(body.contains("<td><strong>188.00 $</strong></td>"));
    }

    #[tokio::test]
    async fn test_identical_adds_both_persist_in_sqlite_mode() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(sqlite_state(dir.path().to_path_buf()));
        let add = "date=2025-02-01&amount=3.5&description=Coffee&merchant=Cafe&add=";

        send(app.clone(), post_req("/", add)).await;
        let (status, body) = send(app.clone(), post_req("/", add)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("class=\"notice\""));

        let (_, body) = send(app, get_req("/")).await;
        assert_eq!(body.matches("<td>Coffee</td>").count(), 2);
        assert!(body.contains("<td><strong>182.50 $</strong></td>"));
    }

    #[tokio::test]
    async fn test_gallery_page_and_images() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b cat.jpg"), b"jpeg").unwrap();
        std::fs::write(dir.path().join("a.png"), b"png").unwrap();
        let app = router(seeded_state(dir.path().to_path_buf()));

        let (status, body) = send(app.clone(), get_req("/gallery")).await;
        assert_eq!(status, StatusCode::OK);
        let first = body.find("src=\"/image/a.png\"").unwrap();
        let second = body.find("src=\"/image/b%20cat.jpg\"").unwrap();
        assert!(first < second);

        let (status, body) = send(app, get_req("/image/b%20cat.jpg")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "jpeg");
    }

    #[tokio::test]
    async fn test_gallery_with_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(seeded_state(dir.path().join("missing")));

        let (status, body) = send(app, get_req("/gallery")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("<img"));
    }

    #[tokio::test]
    async fn test_api_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(seeded_state(dir.path().to_path_buf()));

        let (_, body) = send(app.clone(), get_req("/api/health")).await;
        let health: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(health["success"], true);
        assert_eq!(health["data"], "OK");

        let (status, body) = send(app, get_req("/api/transactions?sort=date")).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["data"][0]["id"], 2);
        assert_eq!(json["data"][0]["date"], "2020-02-15");
        assert_eq!(json["data"][1]["amount"], 100.0);
    }
}
