#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};

use booking::session::{Claims, Session};

/// What the mock backend serves and what it has seen.
#[derive(Default)]
pub struct MockData {
    pub course: Value,
    pub sessions: Value,
    pub slots: Value,
    pub reservations: Value,
    pub reschedule_options: Value,
    pub dashboard: Value,
    pub full_slots: Vec<i64>,
    pub fail_cancel: bool,
    pub hits: HashMap<&'static str, usize>,
    pub auth: Vec<Option<String>>,
    pub created: Vec<Value>,
    pub cancelled: Vec<i64>,
    pub rescheduled: Vec<(i64, i64)>,
    pub refunded: Vec<i64>,
}

pub type Shared = Arc<Mutex<MockData>>;

fn record(state: &Shared, key: &'static str, headers: &HeaderMap) {
    let mut data = state.lock().unwrap();
    *data.hits.entry(key).or_insert(0) += 1;
    data.auth.push(
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
}

pub fn hits(state: &Shared, key: &'static str) -> usize {
    state.lock().unwrap().hits.get(key).copied().unwrap_or(0)
}

async fn get_course(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record(&state, "course", &headers);
    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Course not found" })),
        )
            .into_response();
    }
    Json(state.lock().unwrap().course.clone()).into_response()
}

async fn get_course_slots(
    State(state): State<Shared>,
    Path(_id): Path<String>,
    headers: HeaderMap,
) -> Json<Value> {
    record(&state, "course_slots", &headers);
    Json(state.lock().unwrap().course.clone())
}

async fn get_sessions(
    State(state): State<Shared>,
    Path(_id): Path<String>,
    headers: HeaderMap,
) -> Json<Value> {
    record(&state, "sessions", &headers);
    Json(state.lock().unwrap().sessions.clone())
}

async fn get_session(
    State(state): State<Shared>,
    Path((_id, session_id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> Response {
    record(&state, "session", &headers);
    let sessions = state.lock().unwrap().sessions.clone();
    let found = sessions
        .as_array()
        .and_then(|all| all.iter().find(|s| s["id"] == json!(session_id)).cloned());
    match found {
        Some(session) => Json(session).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn list_slots(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&state, "slots", &headers);
    Json(state.lock().unwrap().slots.clone())
}

async fn list_reservations(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&state, "reservations", &headers);
    Json(state.lock().unwrap().reservations.clone())
}

async fn create_reservation(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "create_reservation", &headers);
    let slot_id = body["slotId"].as_i64().unwrap_or_default();
    let mut data = state.lock().unwrap();
    if data.full_slots.contains(&slot_id) {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "Slot is full" })),
        )
            .into_response();
    }
    data.created.push(body.clone());
    let id = 100 + data.created.len() as i64;
    (
        StatusCode::CREATED,
        Json(json!({
            "id": id,
            "studentId": body["studentId"],
            "slotId": slot_id,
            "status": "pending"
        })),
    )
        .into_response()
}

async fn cancel_reservation(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    record(&state, "cancel_reservation", &headers);
    let mut data = state.lock().unwrap();
    if data.fail_cancel {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "database unavailable" })),
        )
            .into_response();
    }
    data.cancelled.push(id);
    StatusCode::NO_CONTENT.into_response()
}

async fn reschedule_options(
    State(state): State<Shared>,
    Path(_id): Path<i64>,
    headers: HeaderMap,
) -> Json<Value> {
    record(&state, "reschedule_options", &headers);
    Json(state.lock().unwrap().reschedule_options.clone())
}

async fn reschedule(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    record(&state, "reschedule", &headers);
    let new_slot_id = body["newSlotId"].as_i64().unwrap_or_default();
    state.lock().unwrap().rescheduled.push((id, new_slot_id));
    Json(json!({ "ok": true }))
}

async fn refund(State(state): State<Shared>, Path(id): Path<i64>, headers: HeaderMap) -> Json<Value> {
    record(&state, "refund", &headers);
    state.lock().unwrap().refunded.push(id);
    Json(json!({ "ok": true }))
}

async fn admin_dashboard(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&state, "dashboard", &headers);
    Json(state.lock().unwrap().dashboard.clone())
}

/// Starts the mock backend on an ephemeral port and returns its base URL.
pub async fn spawn_backend(data: MockData) -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(data));

    let app = Router::new()
        .route("/courses/{id}", get(get_course))
        .route("/courses/{id}/slots", get(get_course_slots))
        .route("/courses/{id}/sessions", get(get_sessions))
        .route("/courses/{id}/sessions/{session_id}", get(get_session))
        .route("/slots", get(list_slots))
        .route("/reservations", get(list_reservations).post(create_reservation))
        .route("/reservations/{id}", delete(cancel_reservation))
        .route("/reservations/{id}/reschedule-options", get(reschedule_options))
        .route("/reservations/{id}/reschedule", post(reschedule))
        .route("/reservations/{id}/refund", post(refund))
        .route("/admin/dashboard", get(admin_dashboard))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock backend crashed");
    });

    (format!("http://{}", addr), state)
}

pub fn session_for(student_id: i64, expires_in: Duration) -> Session {
    let claims = Claims {
        sub: Some(format!("student-{}", student_id)),
        id: Some(student_id),
        role: Some("student".to_string()),
        exp: Some((Utc::now() + expires_in).timestamp()),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"mock-secret"),
    )
    .expect("Failed to sign token");
    Session::from_token(token).expect("Failed to read token")
}

pub fn slot_json(id: i64, start: &str, max_students: i32, confirmed: usize) -> Value {
    let reservations: Vec<Value> = (0..confirmed)
        .map(|i| {
            json!({
                "id": id * 100 + i as i64,
                "studentId": 500 + i as i64,
                "status": "confirmed"
            })
        })
        .collect();
    json!({
        "id": id,
        "startTime": start,
        "endTime": "2026-12-31T23:59:00Z",
        "modality": "remote",
        "minStudents": 1,
        "maxStudents": max_students,
        "status": "available",
        "professor": { "id": 9, "name": "Luis Pérez" },
        "reservations": reservations
    })
}

pub fn course_json() -> Value {
    json!({
        "id": 1,
        "acronym": "MAT101",
        "title": "Cálculo I",
        "description": "Límites y derivadas",
        "classes": [
            {
                "id": 5,
                "title": "Límites",
                "orderIndex": 1,
                "basePrice": 15000,
                "slots": [
                    slot_json(11, "2026-03-03T14:00:00Z", 3, 3),
                    slot_json(12, "2026-03-02T14:00:00Z", 3, 1)
                ]
            },
            {
                "id": 6,
                "title": "Derivadas",
                "orderIndex": 2,
                "basePrice": 15000,
                "slots": [
                    slot_json(13, "2026-03-02T18:00:00Z", 4, 0)
                ]
            }
        ]
    })
}

pub fn reservation_json(id: i64, class_id: i64, status: &str, payment: Option<&str>) -> Value {
    let mut value = json!({
        "id": id,
        "studentId": 1,
        "slotId": id * 10,
        "status": status,
        "slot": {
            "id": id * 10,
            "classId": class_id,
            "startTime": "2030-01-01T12:00:00Z",
            "endTime": "2030-01-01T13:30:00Z"
        }
    });
    if let Some(status) = payment {
        value["payment"] = json!({
            "id": id * 1000,
            "amount": 15000,
            "status": status,
            "transactionReference": format!("TX-{}", id)
        });
    }
    value
}
