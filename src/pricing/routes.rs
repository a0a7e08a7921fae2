//! JSON API for catalog selection, quoting, tickets and history.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::document::DocumentSink;
use crate::error::Result;
use crate::AppState;

use super::models::OptionCatalog;
use super::requests::{CatalogQuery, IssueQuoteRequest, QuoteFormRequest};
use super::responses::{HistoryRecordResponse, IssuedQuoteResponse, QuoteResponse};
use super::services;

/// Routes mounted under `/api`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/catalog/categories", get(categories))
        .route("/catalog/packages", get(packages))
        .route("/catalog/transports", get(transports))
        .route("/catalog/routes", get(routes))
        .route("/catalog/reload", post(reload))
        .route("/options", get(options))
        .route("/quotes/preview", post(preview))
        .route("/quotes", post(issue))
        .route("/quotes/:reference/ticket", get(ticket))
        .route("/quotes/:reference/invoice", post(invoice))
        .route("/history", get(history))
}

async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let catalog = state.catalog.get().await?;
    Ok(Json(catalog.categories()))
}

async fn packages(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<String>>> {
    let catalog = state.catalog.get().await?;
    Ok(Json(catalog.packages(&query.category)))
}

async fn transports(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<String>>> {
    let catalog = state.catalog.get().await?;
    Ok(Json(catalog.transports(&query.category, &query.package)))
}

async fn routes(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<String>>> {
    let catalog = state.catalog.get().await?;
    Ok(Json(catalog.routes(&query.category, &query.package, &query.transport)))
}

async fn reload(State(state): State<AppState>) -> StatusCode {
    state.catalog.invalidate();
    StatusCode::NO_CONTENT
}

async fn options(State(state): State<AppState>) -> Json<OptionCatalog> {
    Json(state.options.as_ref().clone())
}

async fn preview(
    State(state): State<AppState>,
    Json(form): Json<QuoteFormRequest>,
) -> Result<Json<QuoteResponse>> {
    let catalog = state.catalog.get().await?;
    let breakdown = services::price_quote(
        &catalog,
        &state.options,
        state.config.exchange_rate,
        state.config.default_margin,
        &form,
    )?;

    Ok(Json(QuoteResponse::from_breakdown(
        &breakdown,
        &state.config.primary_currency,
        &state.config.secondary_currency,
    )))
}

async fn issue(
    State(state): State<AppState>,
    Json(request): Json<IssueQuoteRequest>,
) -> Result<(StatusCode, Json<IssuedQuoteResponse>)> {
    let catalog = state.catalog.get().await?;
    let breakdown = services::price_quote(
        &catalog,
        &state.options,
        state.config.exchange_rate,
        state.config.default_margin,
        &request.quote,
    )?;

    let record = services::issue_quote(&state.history, &breakdown, &request.client, &request.contact).await?;

    let response = IssuedQuoteResponse {
        ticket_url: format!("/api/quotes/{}/ticket", record.reference),
        receipt_url: format!("/receipts/{}", record.reference),
        reference: record.reference,
        client: record.client,
        quote: QuoteResponse::from_breakdown(
            &breakdown,
            &state.config.primary_currency,
            &state.config.secondary_currency,
        ),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

async fn ticket(State(state): State<AppState>, Path(reference): Path<String>) -> Result<Response> {
    let bytes = services::quote_document(&state.history, state.tickets.as_ref(), &reference).await?;
    Ok(download(state.tickets.as_ref(), &reference, bytes))
}

async fn invoice(State(state): State<AppState>, Path(reference): Path<String>) -> Result<Response> {
    let (invoice_reference, bytes) = services::invoice_document(
        &state.history,
        state.tickets.as_ref(),
        &reference,
        state.config.invoice_prefix,
    )
    .await?;

    let mut response = download(state.tickets.as_ref(), &invoice_reference, bytes);
    if let Ok(value) = invoice_reference.parse() {
        response.headers_mut().insert("x-invoice-reference", value);
    }
    Ok(response)
}

async fn history(State(state): State<AppState>) -> Result<Json<Vec<HistoryRecordResponse>>> {
    let records = state.history.list().await?;
    Ok(Json(
        records
            .iter()
            .map(|r| HistoryRecordResponse::new(r, &state.config.primary_currency))
            .collect(),
    ))
}

fn download(sink: &dyn DocumentSink, reference: &str, bytes: Vec<u8>) -> Response {
    // header values must stay visible ASCII
    let file_stem: String = reference
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let disposition = format!("attachment; filename=\"{}.{}\"", file_stem, sink.file_extension());

    (
        [
            (header::CONTENT_TYPE, sink.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}
