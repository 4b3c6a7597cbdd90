//! JSON handlers over the shared campaign book.
//!
//! Every mutating handler takes the book lock once, applies the change and
//! publishes a one-line notification on the stream channel.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use calendar_core::clock::CalendarState;
use calendar_core::config::CalendarConfig;
use calendar_core::error::{CalendarError, ErrorKind};
use calendar_core::event::CalendarEvent;
use calendar_core::season::SeasonMonths;
use calendar_core::weather::WeatherSample;
use calendar_core::CampaignDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};

use crate::AppState;

#[derive(Debug)]
pub struct ApiError(CalendarError);

impl From<CalendarError> for ApiError {
    fn from(err: CalendarError) -> Self {
        Self(err)
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Configuration | ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Invariant => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Configuration => "configuration",
        ErrorKind::Validation => "validation",
        ErrorKind::NotFound => "not_found",
        ErrorKind::Conflict => "conflict",
        ErrorKind::Invariant => "invariant",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        } else {
            debug!(error = %self.0, status = status.as_u16(), "request rejected");
        }
        let body = json!({ "error": kind_label(kind), "message": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct StateView {
    pub revision: u64,
    pub state: CalendarState,
}

#[derive(Debug, Serialize)]
pub struct ConfigView {
    pub revision: u64,
    pub config: CalendarConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceBody {
    pub days: i64,
    #[serde(default)]
    pub expected_revision: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearBody {
    pub year: i64,
    #[serde(default)]
    pub expected_revision: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconfigureBody {
    pub month_names: Vec<String>,
    #[serde(default)]
    pub season_months: Option<SeasonMonths>,
    #[serde(default)]
    pub expected_revision: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherBody {
    pub start: CampaignDate,
    pub day_count: i64,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub year: u32,
    pub month: u32,
    pub day: u32,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: u32,
    pub month: u32,
}

fn notify(app: &AppState, campaign: &str, op: &str, revision: u64) {
    let note = json!({ "campaign": campaign, "op": op, "revision": revision });
    if app.tx.send(note.to_string()).is_err() {
        debug!(campaign, op, "no stream subscribers");
    }
}

pub async fn get_state(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StateView>> {
    let book = app.book.lock().await;
    let state = book.state(&id)?.clone();
    let revision = book.campaign(&id)?.revision;
    Ok(Json(StateView { revision, state }))
}

pub async fn get_config(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ConfigView>> {
    let book = app.book.lock().await;
    let campaign = book.campaign(&id)?;
    Ok(Json(ConfigView {
        revision: campaign.revision,
        config: campaign.config.clone(),
    }))
}

/// An empty body selects the default calendar; anything else must parse.
fn config_from_body(body: &[u8]) -> Result<CalendarConfig, CalendarError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CalendarConfig::default());
    }
    serde_json::from_slice(body).map_err(|err| CalendarError::MalformedConfig {
        reason: err.to_string(),
    })
}

pub async fn initialize(
    State(app): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<StateView>)> {
    let config = config_from_body(&body)?;
    let mut book = app.book.lock().await;
    let state = book.initialize(&id, config)?.clone();
    let revision = book.campaign(&id)?.revision;
    notify(&app, &id, "initialize", revision);
    Ok((StatusCode::CREATED, Json(StateView { revision, state })))
}

pub async fn advance(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AdvanceBody>,
) -> ApiResult<Json<StateView>> {
    let mut book = app.book.lock().await;
    let state = book
        .advance(&id, body.days, body.expected_revision)?
        .clone();
    let revision = book.campaign(&id)?.revision;
    notify(&app, &id, "advance", revision);
    Ok(Json(StateView { revision, state }))
}

pub async fn set_year(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<YearBody>,
) -> ApiResult<Json<StateView>> {
    let mut book = app.book.lock().await;
    let state = book
        .set_year(&id, body.year, body.expected_revision)?
        .clone();
    let revision = book.campaign(&id)?.revision;
    notify(&app, &id, "set_year", revision);
    Ok(Json(StateView { revision, state }))
}

pub async fn reconfigure(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ReconfigureBody>,
) -> ApiResult<Json<ConfigView>> {
    let mut book = app.book.lock().await;
    let config = book
        .reconfigure(
            &id,
            body.month_names,
            body.season_months,
            body.expected_revision,
        )?
        .clone();
    let revision = book.campaign(&id)?.revision;
    notify(&app, &id, "reconfigure", revision);
    Ok(Json(ConfigView { revision, config }))
}

/// Weather entries keyed by their persisted `"{year}-{month}-{day}"` form.
pub async fn generate_weather(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<WeatherBody>,
) -> ApiResult<Json<BTreeMap<String, WeatherSample>>> {
    let mut book = app.book.lock().await;
    let generated = book.generate_weather(&id, body.start, body.day_count, body.seed)?;
    let revision = book.campaign(&id)?.revision;
    notify(&app, &id, "weather", revision);
    Ok(Json(
        generated
            .into_iter()
            .map(|(key, sample)| (key.to_string(), sample))
            .collect(),
    ))
}

pub async fn create_event(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(event): Json<CalendarEvent>,
) -> ApiResult<(StatusCode, Json<CalendarEvent>)> {
    let mut book = app.book.lock().await;
    let created = book.create_event(&id, event)?.clone();
    let revision = book.campaign(&id)?.revision;
    notify(&app, &id, "create_event", revision);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_event(
    State(app): State<AppState>,
    Path((id, event_id)): Path<(String, String)>,
    Json(mut event): Json<CalendarEvent>,
) -> ApiResult<Json<CalendarEvent>> {
    event.id = event_id;
    let mut book = app.book.lock().await;
    let updated = book.update_event(&id, event)?.clone();
    let revision = book.campaign(&id)?.revision;
    notify(&app, &id, "update_event", revision);
    Ok(Json(updated))
}

pub async fn delete_event(
    State(app): State<AppState>,
    Path((id, event_id)): Path<(String, String)>,
) -> ApiResult<Json<CalendarEvent>> {
    let mut book = app.book.lock().await;
    let deleted = book.delete_event(&id, &event_id)?;
    let revision = book.campaign(&id)?.revision;
    notify(&app, &id, "delete_event", revision);
    Ok(Json(deleted))
}

pub async fn events_on(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<Vec<CalendarEvent>>> {
    let book = app.book.lock().await;
    let date = CampaignDate::new(query.year, query.month, query.day)
        .validate(book.config(&id)?.total_months())?;
    let events = book.events_on(&id, date)?;
    Ok(Json(events.into_iter().cloned().collect()))
}

pub async fn month_agenda(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<MonthQuery>,
) -> ApiResult<Json<BTreeMap<u32, Vec<CalendarEvent>>>> {
    let book = app.book.lock().await;
    let agenda = book.month_agenda(&id, query.year, query.month)?;
    Ok(Json(
        agenda
            .into_iter()
            .map(|(day, events)| (day, events.into_iter().cloned().collect()))
            .collect(),
    ))
}
