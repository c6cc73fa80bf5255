use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    #[serde(alias = "canceled")]
    Cancelled,
}

impl ReservationStatus {
    pub fn is_active(self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }

    /// Transitions the client may observe or request. Confirmed to
    /// confirmed is a reschedule onto another slot.
    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Cancelled) | (Confirmed, Confirmed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    #[serde(alias = "approved", alias = "completed")]
    Paid,
    #[serde(alias = "rejected")]
    Failed,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payment {
    pub id: i64,
    pub amount: i64,
    pub status: PaymentStatus,
    pub transaction_reference: Option<String>,
    pub reservation_ids: Vec<i64>,
}

/// Slot summary embedded in a reservation listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotRef {
    pub id: i64,
    pub class_id: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reservation {
    pub id: i64,
    pub student_id: i64,
    pub slot_id: i64,
    pub status: ReservationStatus,
    pub payment: Option<Payment>,
    pub slot: Option<SlotRef>,
}

impl Reservation {
    pub fn class_id(&self) -> Option<i64> {
        self.slot.as_ref().map(|s| s.class_id)
    }

    pub fn is_paid(&self) -> bool {
        self.payment
            .as_ref()
            .is_some_and(|p| p.status == PaymentStatus::Paid)
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.slot.as_ref().and_then(|s| s.start_time)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReservationRequest {
    pub student_id: i64,
    pub slot_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub new_slot_id: i64,
}
