//! The clinical-records backend: patient CRUD plus the daily-visit ledger.
//!
//! Every route requires a valid token; none requires the administrative
//! role. The daily-visit ledger keeps at most one record per calendar day,
//! created on first request.
use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use axum::{
    Json, Router,
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, NaiveDate, Utc};
use scc::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    auth::{Identity, TokenService},
    core::error::{ApiError, ApiResult},
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Patient {
    pub id: i64,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub phone: Option<String>,
    pub identity_no: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One calendar day on which at least one visit was recorded.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DailyVisit {
    pub id: i64,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Concurrent patient + daily-visit store. The `visits` map is keyed by
/// calendar date, so per-day uniqueness is the map's own insert semantics.
pub struct PatientStore {
    patients: HashMap<i64, Patient>,
    visits: HashMap<NaiveDate, DailyVisit>,
    next_patient_id: AtomicI64,
    next_visit_id: AtomicI64,
}

/// Outcome of the find-or-create on today's visit record.
pub enum VisitOutcome {
    Created(DailyVisit),
    Existing(DailyVisit),
}

impl PatientStore {
    pub fn new() -> Self {
        Self {
            patients: HashMap::new(),
            visits: HashMap::new(),
            next_patient_id: AtomicI64::new(1),
            next_visit_id: AtomicI64::new(1),
        }
    }

    pub fn create(&self, fields: PatientFields) -> Patient {
        let id = self.next_patient_id.fetch_add(1, Ordering::Relaxed);
        let now = Utc::now();
        let patient = Patient {
            id,
            name: fields.name,
            age: fields.age,
            phone: fields.phone,
            identity_no: fields.identity_no,
            status: fields.status,
            created_at: now,
            updated_at: now,
        };
        let _ = self.patients.insert(id, patient.clone());
        patient
    }

    pub fn list(&self) -> Vec<Patient> {
        let mut patients = Vec::new();
        self.patients.scan(|_, patient| {
            patients.push(patient.clone());
        });
        patients.sort_by_key(|p| p.id);
        patients
    }

    /// Partial update: absent fields keep their stored value.
    pub fn update(&self, id: i64, fields: PatientFields) -> Option<Patient> {
        self.patients.update(&id, |_, patient| {
            if fields.name.is_some() {
                patient.name = fields.name.clone();
            }
            if fields.age.is_some() {
                patient.age = fields.age;
            }
            if fields.phone.is_some() {
                patient.phone = fields.phone.clone();
            }
            if fields.identity_no.is_some() {
                patient.identity_no = fields.identity_no.clone();
            }
            if fields.status.is_some() {
                patient.status = fields.status.clone();
            }
            patient.updated_at = Utc::now();
            patient.clone()
        })
    }

    pub fn delete(&self, id: i64) -> bool {
        self.patients.remove(&id).is_some()
    }

    /// Visit days newest-first.
    pub fn visit_days(&self) -> Vec<DailyVisit> {
        let mut days = Vec::new();
        self.visits.scan(|_, visit| {
            days.push(visit.clone());
        });
        days.sort_by(|a, b| b.date.cmp(&a.date));
        days
    }

    /// Record a visit for `date`, or return the existing record. Exactly one
    /// record per day survives concurrent calls.
    pub fn record_visit(&self, date: NaiveDate) -> VisitOutcome {
        let id = self.next_visit_id.fetch_add(1, Ordering::Relaxed);
        let visit = DailyVisit {
            id,
            date,
            created_at: Utc::now(),
        };
        match self.visits.insert(date, visit.clone()) {
            Ok(()) => VisitOutcome::Created(visit),
            Err(_) => {
                // Lost the race or the day already existed
                let existing = self
                    .visits
                    .read(&date, |_, visit| visit.clone())
                    .unwrap_or(visit);
                VisitOutcome::Existing(existing)
            }
        }
    }
}

/// Optional patient attributes shared by create and partial update.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct PatientFields {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub phone: Option<String>,
    pub identity_no: Option<String>,
    pub status: Option<String>,
}

#[derive(Clone)]
pub struct PatientState {
    pub store: Arc<PatientStore>,
    pub tokens: Arc<TokenService>,
}

impl FromRef<PatientState> for Arc<TokenService> {
    fn from_ref(state: &PatientState) -> Self {
        state.tokens.clone()
    }
}

pub fn router(state: PatientState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", get(list_patients).post(create_patient))
        .route("/patients/days", get(list_visit_days).post(record_todays_visit))
        .route(
            "/patients/{id}",
            axum::routing::put(update_patient).delete(delete_patient),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn list_patients(State(state): State<PatientState>, _user: Identity) -> Json<Vec<Patient>> {
    Json(state.store.list())
}

async fn create_patient(
    State(state): State<PatientState>,
    user: Identity,
    Json(fields): Json<PatientFields>,
) -> Json<Patient> {
    let patient = state.store.create(fields);
    tracing::info!(patient = patient.id, by = %user.username, "patient record created");
    Json(patient)
}

async fn update_patient(
    State(state): State<PatientState>,
    _user: Identity,
    Path(id): Path<i64>,
    Json(fields): Json<PatientFields>,
) -> ApiResult<Json<serde_json::Value>> {
    let patient = state
        .store
        .update(id, fields)
        .ok_or_else(|| ApiError::NotFound("Patient not found".to_string()))?;
    Ok(Json(json!({
        "message": "Patient updated successfully",
        "patient": patient,
    })))
}

async fn delete_patient(
    State(state): State<PatientState>,
    _user: Identity,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    if !state.store.delete(id) {
        return Err(ApiError::NotFound("Patient not found".to_string()));
    }
    Ok(Json(json!({ "message": "Patient deleted" })))
}

async fn list_visit_days(
    State(state): State<PatientState>,
    _user: Identity,
) -> Json<Vec<DailyVisit>> {
    Json(state.store.visit_days())
}

async fn record_todays_visit(
    State(state): State<PatientState>,
    _user: Identity,
) -> (StatusCode, Json<serde_json::Value>) {
    let today = Utc::now().date_naive();
    match state.store.record_visit(today) {
        VisitOutcome::Created(visit) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "New visit created",
                "visit": visit,
            })),
        ),
        VisitOutcome::Existing(visit) => (
            StatusCode::OK,
            Json(json!({
                "success": false,
                "message": "Visit already exists for today",
                "visit": visit,
            })),
        ),
    }
}
