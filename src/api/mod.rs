pub mod dto;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::models::*;
use crate::session::Session;

/// Endpoints of the booking backend consumed by the views.
#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn get_course(&self, course_id: i64) -> Result<Course, AppError>;
    /// Course with its classes and their bookable slots, by acronym or id.
    async fn get_course_slots(&self, course_ref: &str) -> Result<Course, AppError>;
    async fn get_course_sessions(&self, course_id: i64) -> Result<Vec<CourseClass>, AppError>;
    async fn get_course_session(
        &self,
        course_id: i64,
        session_id: i64,
    ) -> Result<CourseClass, AppError>;
    async fn list_slots(&self) -> Result<Vec<Slot>, AppError>;
    async fn list_reservations(&self) -> Result<Vec<Reservation>, AppError>;
    async fn create_reservation(
        &self,
        req: &NewReservationRequest,
    ) -> Result<Reservation, AppError>;
    async fn cancel_reservation(&self, reservation_id: i64) -> Result<(), AppError>;
    async fn get_reschedule_options(&self, reservation_id: i64) -> Result<Vec<Slot>, AppError>;
    async fn reschedule_reservation(
        &self,
        reservation_id: i64,
        new_slot_id: i64,
    ) -> Result<(), AppError>;
    async fn request_refund(&self, reservation_id: i64) -> Result<(), AppError>;
    async fn get_admin_dashboard(&self) -> Result<AdminDashboardStats, AppError>;

    /// The backend has no per-class slot endpoint, so the full listing is
    /// filtered here.
    async fn list_class_slots(&self, class_id: i64) -> Result<Vec<Slot>, AppError> {
        let slots = self.list_slots().await?;
        Ok(slots.into_iter().filter(|s| s.class_id == class_id).collect())
    }
}

pub struct BookingHttpClient {
    client: Client,
    base_url: String,
    session: Option<Session>,
}

impl BookingHttpClient {
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            session: None,
        })
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, AppError> {
        match &self.session {
            Some(session) => {
                session.ensure_valid(Utc::now())?;
                Ok(request.bearer_auth(session.token()))
            }
            None => Ok(request),
        }
    }

    async fn send(&self, request: RequestBuilder, label: &str) -> Result<String, AppError> {
        let request_id = Uuid::new_v4();
        let request = self
            .authorize(request)?
            .header("X-Request-Id", request_id.to_string());

        debug!(%request_id, "{}", label);
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(%request_id, "{} failed with {}: {}", label, status, body);
            return Err(error_from_response(status, &body));
        }

        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let label = format!("GET {}", path);
        let body = self.send(self.client.get(self.url(path)), &label).await?;
        parse_body(&body, &label)
    }
}

fn parse_body<T: DeserializeOwned>(body: &str, label: &str) -> Result<T, AppError> {
    serde_json::from_str::<T>(body).map_err(|e| {
        tracing::error!("Failed to parse {} response: {}", label, e);
        AppError::Decode(format!("{}: {}", label, e))
    })
}

pub(crate) fn error_from_response(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<dto::ErrorBody>(body)
        .ok()
        .and_then(dto::ErrorBody::into_message);

    match status {
        StatusCode::UNAUTHORIZED => {
            AppError::Auth(message.unwrap_or_else(|| status.to_string()))
        }
        // a permission rejection, not an expired session
        StatusCode::FORBIDDEN => {
            AppError::Business(message.unwrap_or_else(|| "Forbidden".to_string()))
        }
        StatusCode::NOT_FOUND if message.is_none() => AppError::NotFound,
        s if s.is_client_error() && message.is_some() => {
            AppError::Business(message.unwrap_or_default())
        }
        _ => AppError::Api {
            status,
            message: message.unwrap_or_default(),
        },
    }
}

#[async_trait]
impl BookingApi for BookingHttpClient {
    async fn get_course(&self, course_id: i64) -> Result<Course, AppError> {
        let course: dto::CourseDto = self.get_json(&format!("/courses/{}", course_id)).await?;
        course.into_model()
    }

    async fn get_course_slots(&self, course_ref: &str) -> Result<Course, AppError> {
        let course: dto::CourseDto = self
            .get_json(&format!("/courses/{}/slots", course_ref))
            .await?;
        course.into_model()
    }

    async fn get_course_sessions(&self, course_id: i64) -> Result<Vec<CourseClass>, AppError> {
        let classes: Vec<dto::ClassDto> = self
            .get_json(&format!("/courses/{}/sessions", course_id))
            .await?;
        classes
            .into_iter()
            .map(|c| c.into_model(course_id))
            .collect()
    }

    async fn get_course_session(
        &self,
        course_id: i64,
        session_id: i64,
    ) -> Result<CourseClass, AppError> {
        let class: dto::ClassDto = self
            .get_json(&format!("/courses/{}/sessions/{}", course_id, session_id))
            .await?;
        class.into_model(course_id)
    }

    async fn list_slots(&self) -> Result<Vec<Slot>, AppError> {
        let slots: Vec<dto::SlotDto> = self.get_json("/slots").await?;
        slots.into_iter().map(|s| s.into_model(None)).collect()
    }

    async fn list_reservations(&self) -> Result<Vec<Reservation>, AppError> {
        let reservations: Vec<dto::ReservationDto> = self.get_json("/reservations").await?;
        reservations
            .into_iter()
            .map(|r| r.into_model(None))
            .collect()
    }

    async fn create_reservation(
        &self,
        req: &NewReservationRequest,
    ) -> Result<Reservation, AppError> {
        let label = "POST /reservations";
        let body = self
            .send(self.client.post(self.url("/reservations")).json(req), label)
            .await?;
        let reservation: dto::ReservationDto = parse_body(&body, label)?;
        reservation.into_model(Some(req.slot_id))
    }

    async fn cancel_reservation(&self, reservation_id: i64) -> Result<(), AppError> {
        let path = format!("/reservations/{}", reservation_id);
        self.send(self.client.delete(self.url(&path)), &format!("DELETE {}", path))
            .await?;
        Ok(())
    }

    async fn get_reschedule_options(&self, reservation_id: i64) -> Result<Vec<Slot>, AppError> {
        let slots: Vec<dto::SlotDto> = self
            .get_json(&format!("/reservations/{}/reschedule-options", reservation_id))
            .await?;
        slots.into_iter().map(|s| s.into_model(None)).collect()
    }

    async fn reschedule_reservation(
        &self,
        reservation_id: i64,
        new_slot_id: i64,
    ) -> Result<(), AppError> {
        let path = format!("/reservations/{}/reschedule", reservation_id);
        let body = RescheduleRequest { new_slot_id };
        self.send(
            self.client.post(self.url(&path)).json(&body),
            &format!("POST {}", path),
        )
        .await?;
        Ok(())
    }

    async fn request_refund(&self, reservation_id: i64) -> Result<(), AppError> {
        let path = format!("/reservations/{}/refund", reservation_id);
        self.send(self.client.post(self.url(&path)), &format!("POST {}", path))
            .await?;
        Ok(())
    }

    async fn get_admin_dashboard(&self) -> Result<AdminDashboardStats, AppError> {
        let dashboard: dto::AdminDashboardDto = self.get_json("/admin/dashboard").await?;
        Ok(dashboard.into_model())
    }
}
