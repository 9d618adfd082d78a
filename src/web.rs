use actix_web::{web, App, HttpServer, HttpResponse, Result, middleware};
use chrono::{Datelike, NaiveDate};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info};

use crate::config::Config;
use crate::error::RosterError;
use crate::form::{
    validate_doctor, validate_holiday, validate_preference, DoctorSubmission, HolidaySubmission, OverrideSubmission,
    PreferenceSubmission,
};
use crate::schedule::Schedule;
use crate::store::{run_scheduling_for_year, RosterAdmin, RosterStore, RunOptions};

/// Shared server state. The store mutex is the single writer for every run.
pub struct AppState {
    pub store: Mutex<Box<dyn RosterAdmin + Send>>,
    pub schedules: Mutex<BTreeMap<i32, Schedule>>,
    pub options: RunOptions,
    pub seed: Option<u64>,
}

impl AppState {
    pub fn new(store: Box<dyn RosterAdmin + Send>, options: RunOptions, seed: Option<u64>) -> Self {
        Self {
            store: Mutex::new(store),
            schedules: Mutex::new(BTreeMap::new()),
            options,
            seed,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    start: NaiveDate,
    end: NaiveDate,
}

/// One stored assignment joined with the doctor's name
#[derive(Serialize)]
pub struct AssignmentDetail {
    date: NaiveDate,
    doctor_id: String,
    doctor_name: Option<String>,
    holiday: Option<String>,
}

#[derive(Serialize)]
pub struct DoctorSummary {
    id: String,
    name: String,
    rank: u32,
    shifts: usize,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| actix_web::error::ErrorInternalServerError("state lock poisoned"))
}

fn error_json(message: impl Into<String>) -> serde_json::Value {
    serde_json::json!({"status": "error", "message": message.into()})
}

/// Maps a roster error onto an HTTP status with a JSON body
fn error_response(err: &RosterError) -> HttpResponse {
    let body = error_json(err.to_string());
    match err {
        RosterError::UnknownDoctor { .. } => HttpResponse::NotFound().json(body),
        RosterError::Configuration { .. }
        | RosterError::EmptyCandidateSet { .. }
        | RosterError::NoSchedulableDays { .. }
        | RosterError::IncompleteYear { .. } => HttpResponse::BadRequest().json(body),
        RosterError::State { .. } | RosterError::Storage { .. } => {
            error!(error = %err, "Request failed");
            HttpResponse::InternalServerError().json(body)
        }
    }
}

async fn index() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({"status": "API is running"})))
}

async fn list_doctors(state: web::Data<AppState>) -> Result<HttpResponse> {
    let store = lock(&state.store)?;
    match store.load_doctors() {
        Ok(doctors) => {
            let summaries: Vec<DoctorSummary> = doctors
                .into_iter()
                .map(|d| DoctorSummary {
                    shifts: d.history.len(),
                    id: d.id,
                    name: d.name,
                    rank: d.rank,
                })
                .collect();
            Ok(HttpResponse::Ok().json(summaries))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

async fn add_doctor(
    req: web::Json<DoctorSubmission>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let submission = req.into_inner();
    if let Err(message) = validate_doctor(&submission) {
        return Ok(HttpResponse::BadRequest().json(error_json(message)));
    }

    let doctor = submission.into_doctor();
    let id = doctor.id.clone();
    let mut store = lock(&state.store)?;
    match store.add_doctor(doctor) {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "success",
            "message": format!("Doctor {} added", id)
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn delete_doctor(
    id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let mut store = lock(&state.store)?;
    match store.remove_doctor(id.as_str()) {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "success",
            "message": format!("Doctor {} deleted", id)
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn list_holidays(state: web::Data<AppState>) -> Result<HttpResponse> {
    let store = lock(&state.store)?;
    match store.load_holidays() {
        Ok(holidays) => Ok(HttpResponse::Ok().json(holidays)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn add_holiday(
    req: web::Json<HolidaySubmission>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let submission = req.into_inner();
    if let Err(message) = validate_holiday(&submission) {
        return Ok(HttpResponse::BadRequest().json(error_json(message)));
    }

    let record = submission.into_record();
    let name = record.name.clone();
    let mut store = lock(&state.store)?;
    match store.add_holiday(record) {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "success",
            "message": format!("Holiday {} added", name)
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

// Builds and persists a year off the worker thread; optional body {"seed": n}
async fn create_schedule(
    year: web::Path<i32>,
    body: Option<web::Json<RunRequest>>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let year = year.into_inner();
    let seed = body.and_then(|b| b.seed).or(state.seed);
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let worker_state = state.clone();
    let result = web::block(move || {
        let mut store = worker_state
            .store
            .lock()
            .map_err(|_| RosterError::storage("lock", "roster store lock poisoned"))?;
        run_scheduling_for_year(&mut **store, year, &mut rng, worker_state.options)
    })
    .await?;

    match result {
        Ok(schedule) => {
            let days = schedule.days.len();
            lock(&state.schedules)?.insert(year, schedule);
            info!(year, days, "Schedule created over HTTP");
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "status": "success",
                "message": format!("Schedule for {} created", year),
                "days": days
            })))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

/// Replaces the doctor on one date of a year
async fn override_schedule(
    path: web::Path<(i32, NaiveDate)>,
    req: web::Json<OverrideSubmission>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (year, date) = path.into_inner();
    if date.year() != year {
        return Ok(HttpResponse::BadRequest().json(error_json(format!("{} is not in {}", date, year))));
    }

    let saved = {
        let mut store = lock(&state.store)?;
        match store.override_assignment(date, req.doctor_id.trim()) {
            Ok(saved) => saved,
            Err(e) => return Ok(error_response(&e)),
        }
    };

    if let Some(schedule) = lock(&state.schedules)?.get_mut(&year) {
        if let Ok(i) = schedule.days.binary_search_by_key(&date, |d| d.date) {
            schedule.days[i].doctor = Some(saved.doctor_id.clone());
        }
    }

    info!(%date, doctor = %saved.doctor_id, "Assignment overridden");
    Ok(HttpResponse::Ok().json(saved))
}

/// Stored assignments between two dates, with doctor names
async fn list_assignments(
    query: web::Query<RangeQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let store = lock(&state.store)?;
    let result = store
        .assignments_between(query.start, query.end)
        .and_then(|saved| Ok((saved, store.load_doctors()?)));

    match result {
        Ok((saved, doctors)) => {
            let names: HashMap<String, String> = doctors.into_iter().map(|d| (d.id, d.name)).collect();
            let details: Vec<AssignmentDetail> = saved
                .into_iter()
                .map(|a| AssignmentDetail {
                    doctor_name: names.get(&a.doctor_id).cloned(),
                    date: a.date,
                    doctor_id: a.doctor_id,
                    holiday: a.holiday,
                })
                .collect();
            Ok(HttpResponse::Ok().json(details))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

async fn set_preference(
    id: web::Path<String>,
    req: web::Json<PreferenceSubmission>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let submission = req.into_inner();
    if let Err(message) = validate_preference(&submission) {
        return Ok(HttpResponse::BadRequest().json(error_json(message)));
    }

    let mut store = lock(&state.store)?;
    match store.set_preference(id.as_str(), submission.start, submission.end, submission.weight) {
        Ok(days) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "success",
            "message": format!("Preference set for {} on {} days", id, days),
            "days": days
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn get_preferences(
    id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let store = lock(&state.store)?;
    match store.load_doctors() {
        Ok(doctors) => match doctors.into_iter().find(|d| d.id == id.as_str()) {
            Some(doctor) => Ok(HttpResponse::Ok().json(doctor.preferences)),
            None => Ok(error_response(&RosterError::UnknownDoctor { id: id.into_inner() })),
        },
        Err(e) => Ok(error_response(&e)),
    }
}

async fn get_schedule(
    year: web::Path<i32>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let schedules = lock(&state.schedules)?;
    match schedules.get(&year.into_inner()) {
        Some(schedule) => Ok(HttpResponse::Ok().json(schedule)),
        None => Ok(HttpResponse::NotFound().json(error_json("Schedule not available"))),
    }
}

async fn list_schedules(state: web::Data<AppState>) -> Result<HttpResponse> {
    let schedules = lock(&state.schedules)?;
    let years: Vec<i32> = schedules.keys().copied().collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({"years": years})))
}

/// Route table, shared by the server and the handler tests
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/api/doctors", web::get().to(list_doctors))
        .route("/api/doctors", web::post().to(add_doctor))
        .route("/api/doctors/{id}", web::delete().to(delete_doctor))
        .route("/api/doctors/{id}/preferences", web::get().to(get_preferences))
        .route("/api/doctors/{id}/preferences", web::post().to(set_preference))
        .route("/api/holidays", web::get().to(list_holidays))
        .route("/api/holidays", web::post().to(add_holiday))
        .route("/api/schedules", web::get().to(list_schedules))
        .route("/api/schedules/{year}", web::post().to(create_schedule))
        .route("/api/schedules/{year}", web::get().to(get_schedule))
        .route("/api/schedules/{year}/{date}", web::put().to(override_schedule))
        .route("/api/assignments", web::get().to(list_assignments));
}

pub async fn start_server(config: &Config, store: Box<dyn RosterAdmin + Send>) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState::new(
        store,
        config.scheduling.run_options(),
        config.scheduling.seed,
    ));

    info!(host = %config.server.host, port = config.server.port, "Starting HTTP server");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
