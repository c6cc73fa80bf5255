use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Reservation, ReservationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Modality {
    #[serde(alias = "online", alias = "remoto")]
    Remote,
    #[serde(alias = "in_person", alias = "inPerson", alias = "presencial")]
    InPerson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    #[serde(alias = "scheduled", alias = "open")]
    Available,
    Full,
    #[serde(alias = "canceled")]
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfessorRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    pub id: i64,
    pub class_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub modality: Modality,
    pub min_students: i32,
    pub max_students: i32,
    pub status: SlotStatus,
    pub professor: Option<ProfessorRef>,
    pub reservations: Vec<Reservation>,
    /// Set by the backend when it knows who is asking.
    pub reserved_by_current_user: Option<bool>,
}

impl Slot {
    pub fn confirmed_count(&self) -> usize {
        self.reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::Confirmed)
            .count()
    }

    pub fn is_bookable(&self) -> bool {
        self.status == SlotStatus::Available
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start_time > now
    }
}
