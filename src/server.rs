use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Form, Path, State};
use axum::http::header::HOST;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Local;
use serde::Deserialize;
use thiserror::Error;

use crate::calculator;
use crate::config::Config;
use crate::models::{AttendanceRecord, RecordError, SavedRecord, Target, TargetError};
use crate::pages::{self, IndexView};
use crate::share;
use crate::store::{RecordStore, StoreError};

pub struct AppState<S> {
    store: Arc<S>,
    config: Arc<Config>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: RecordStore> AppState<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Raw form fields, kept as text so bad input can be echoed back.
#[derive(Debug, Default, Deserialize)]
pub struct AttendanceForm {
    #[serde(default)]
    pub total: String,
    #[serde(default)]
    pub attended: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Enter valid numbers")]
    NotNumeric,
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Target(#[from] TargetError),
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ServerError(#[from] StoreError);

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Could not update saved attendance data",
        )
            .into_response()
    }
}

pub fn router<S: RecordStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(index::<S>).post(submit::<S>))
        .route("/check/{token}", get(check::<S>))
        .route("/clear", post(clear::<S>))
        .with_state(state)
}

pub async fn serve<S: RecordStore + 'static>(config: Config, store: S) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, target_percent = config.target.value(), "attendance tracker listening");
    axum::serve(listener, router(AppState::new(store, config)))
        .await
        .context("server stopped unexpectedly")?;
    Ok(())
}

fn parse_count(raw: &str) -> Result<i64, FormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse().map_err(|_| FormError::NotNumeric)
}

pub fn parse_form(
    form: &AttendanceForm,
    default_target: Target,
) -> Result<(AttendanceRecord, Target), FormError> {
    let total = parse_count(&form.total)?;
    let attended = parse_count(&form.attended)?;
    let record = AttendanceRecord::new(total, attended)?;

    let target = match form.target.trim() {
        "" => default_target,
        raw => Target::new(raw.parse().map_err(|_| FormError::NotNumeric)?)?,
    };

    Ok((record, target))
}

fn base_url(config: &Config, headers: &HeaderMap) -> String {
    if let Some(base) = &config.base_url {
        return base.clone();
    }
    match headers.get(HOST).and_then(|value| value.to_str().ok()) {
        Some(host) => format!("http://{host}/"),
        None => format!("http://{}:{}/", config.host, config.port),
    }
}

async fn load_saved<S: RecordStore>(store: &S) -> Option<SavedRecord> {
    match store.load().await {
        Ok(saved) => saved,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring saved attendance record");
            None
        }
    }
}

async fn index<S: RecordStore>(State(state): State<AppState<S>>) -> Html<String> {
    let saved = load_saved(state.store()).await;

    let report = saved.as_ref().and_then(|saved| match saved.record() {
        Ok(record) => calculator::calculate(&record, saved.target),
        Err(err) => {
            tracing::warn!(error = %err, "saved attendance record is inconsistent");
            None
        }
    });

    let view = match &saved {
        Some(saved) => IndexView {
            total: saved.total.to_string(),
            attended: saved.attended.to_string(),
            target: saved.target.value().to_string(),
            report: report.as_ref(),
            last_updated: Some(saved.last_updated_label()),
            ..Default::default()
        },
        None => IndexView {
            target: state.config.target.value().to_string(),
            ..Default::default()
        },
    };

    Html(pages::index_page(&view))
}

async fn submit<S: RecordStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Form(form): Form<AttendanceForm>,
) -> Html<String> {
    let (record, target) = match parse_form(&form, state.config.target) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::info!(error = %err, "rejected attendance form");
            let message = err.to_string();
            let view = IndexView {
                total: form.total,
                attended: form.attended,
                target: form.target,
                error: Some(&message),
                ..Default::default()
            };
            return Html(pages::index_page(&view));
        }
    };

    let saved = SavedRecord::new(record, target, Local::now().naive_local());
    if let Err(err) = state.store().save(&saved).await {
        tracing::error!(error = %err, "failed to save attendance record");
    }

    let report = calculator::calculate(&record, target);
    let share_link = (form.action == "generate_link").then(|| {
        share::share_url(&base_url(&state.config, &headers), &share::encode(&record))
    });

    let view = IndexView {
        total: record.total().to_string(),
        attended: record.attended().to_string(),
        target: target.value().to_string(),
        report: report.as_ref(),
        error: None,
        share_link: share_link.as_deref(),
        last_updated: Some(saved.last_updated_label()),
    };

    Html(pages::index_page(&view))
}

async fn check<S: RecordStore>(
    State(state): State<AppState<S>>,
    Path(token): Path<String>,
) -> Html<String> {
    let (total, attended) = share::decode(&token);

    let report = if total == 0 {
        None
    } else {
        AttendanceRecord::new(i64::from(total), i64::from(attended))
            .ok()
            .and_then(|record| calculator::calculate(&record, state.config.target))
    };

    Html(pages::check_page(report.as_ref()))
}

async fn clear<S: RecordStore>(
    State(state): State<AppState<S>>,
) -> Result<Html<String>, ServerError> {
    state.store().clear().await?;
    tracing::info!("cleared saved attendance record");

    let view = IndexView {
        target: state.config.target.value().to_string(),
        ..Default::default()
    };
    Ok(Html(pages::index_page(&view)))
}
