use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Notify;

use crate::api::BookingApi;
use crate::error::AppError;
use crate::models::*;

pub fn at(ts: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(ts)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn slot(id: i64, class_id: i64, start: &str, max_students: i32) -> Slot {
    let start_time = at(start);
    Slot {
        id,
        class_id,
        start_time,
        end_time: start_time + Duration::minutes(90),
        modality: Modality::Remote,
        min_students: 1,
        max_students,
        status: SlotStatus::Available,
        professor: None,
        reservations: Vec::new(),
        reserved_by_current_user: None,
    }
}

pub fn reservation(id: i64, student_id: i64, slot_id: i64, status: ReservationStatus) -> Reservation {
    Reservation {
        id,
        student_id,
        slot_id,
        status,
        payment: None,
        slot: None,
    }
}

/// Reservation as listed by `GET /reservations`, with embedded slot and payment.
pub fn listed_reservation(
    id: i64,
    class_id: i64,
    status: ReservationStatus,
    payment: Option<PaymentStatus>,
) -> Reservation {
    Reservation {
        id,
        student_id: 1,
        slot_id: id * 10,
        status,
        payment: payment.map(|status| Payment {
            id: id * 100,
            amount: 15_000,
            status,
            transaction_reference: None,
            reservation_ids: vec![id],
        }),
        slot: Some(SlotRef {
            id: id * 10,
            class_id,
            start_time: None,
            end_time: None,
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hold {
    Nothing,
    FirstList,
    FirstCreate,
}

/// In-memory backend that can park its first read or first create on
/// `gate` until the test releases it. `entered` fires once the parked call
/// has taken its snapshot.
pub struct GatedApi {
    pub reservations: Mutex<Vec<Reservation>>,
    pub gate: Notify,
    pub entered: Notify,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    hold: Hold,
}

impl GatedApi {
    fn with_hold(reservations: Vec<Reservation>, hold: Hold) -> Self {
        Self {
            reservations: Mutex::new(reservations),
            gate: Notify::new(),
            entered: Notify::new(),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            hold,
        }
    }

    pub fn open(reservations: Vec<Reservation>) -> Self {
        Self::with_hold(reservations, Hold::Nothing)
    }

    pub fn holding_first_list(reservations: Vec<Reservation>) -> Self {
        Self::with_hold(reservations, Hold::FirstList)
    }

    pub fn holding_first_create() -> Self {
        Self::with_hold(Vec::new(), Hold::FirstCreate)
    }

    async fn park(&self) {
        self.entered.notify_one();
        self.gate.notified().await;
    }
}

#[async_trait]
impl BookingApi for GatedApi {
    async fn get_course(&self, _course_id: i64) -> Result<Course, AppError> {
        Err(AppError::NotFound)
    }

    async fn get_course_slots(&self, _course_ref: &str) -> Result<Course, AppError> {
        Err(AppError::NotFound)
    }

    async fn get_course_sessions(&self, _course_id: i64) -> Result<Vec<CourseClass>, AppError> {
        Ok(Vec::new())
    }

    async fn get_course_session(
        &self,
        _course_id: i64,
        _session_id: i64,
    ) -> Result<CourseClass, AppError> {
        Err(AppError::NotFound)
    }

    async fn list_slots(&self) -> Result<Vec<Slot>, AppError> {
        Ok(Vec::new())
    }

    async fn list_reservations(&self) -> Result<Vec<Reservation>, AppError> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.reservations.lock().unwrap().clone();
        if call == 0 && self.hold == Hold::FirstList {
            self.park().await;
        }
        Ok(snapshot)
    }

    async fn create_reservation(
        &self,
        req: &NewReservationRequest,
    ) -> Result<Reservation, AppError> {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 && self.hold == Hold::FirstCreate {
            self.park().await;
        }
        let created = reservation(
            100 + call as i64,
            req.student_id,
            req.slot_id,
            ReservationStatus::Pending,
        );
        self.reservations.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn cancel_reservation(&self, reservation_id: i64) -> Result<(), AppError> {
        self.reservations
            .lock()
            .unwrap()
            .retain(|r| r.id != reservation_id);
        Ok(())
    }

    async fn get_reschedule_options(&self, _reservation_id: i64) -> Result<Vec<Slot>, AppError> {
        Ok(Vec::new())
    }

    async fn reschedule_reservation(
        &self,
        _reservation_id: i64,
        _new_slot_id: i64,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn request_refund(&self, _reservation_id: i64) -> Result<(), AppError> {
        Ok(())
    }

    async fn get_admin_dashboard(&self) -> Result<AdminDashboardStats, AppError> {
        Err(AppError::NotFound)
    }
}
