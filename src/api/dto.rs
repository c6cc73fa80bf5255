//! Wire shapes of the booking backend. Everything is decoded into these
//! first and then validated into `crate::models` so that malformed payloads
//! fail at the boundary with `AppError::Decode`.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDto {
    pub id: i64,
    pub acronym: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "sessions")]
    pub classes: Vec<ClassDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDto {
    pub id: i64,
    #[serde(default)]
    pub course_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order_index: i32,
    #[serde(default)]
    pub base_price: i64,
    #[serde(default)]
    pub slots: Vec<SlotDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessorDto {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDto {
    pub id: i64,
    #[serde(default)]
    pub class_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub modality: Modality,
    #[serde(default)]
    pub min_students: i32,
    pub max_students: i32,
    pub status: SlotStatus,
    #[serde(default)]
    pub professor: Option<ProfessorDto>,
    #[serde(default)]
    pub reservations: Vec<ReservationDto>,
    #[serde(default)]
    pub reserved_by_current_user: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRefDto {
    pub id: i64,
    pub class_id: i64,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    pub id: i64,
    pub amount: i64,
    pub status: PaymentStatus,
    #[serde(default)]
    pub transaction_reference: Option<String>,
    #[serde(default)]
    pub reservation_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDto {
    pub id: i64,
    pub student_id: i64,
    #[serde(default)]
    pub slot_id: Option<i64>,
    pub status: ReservationStatus,
    #[serde(default)]
    pub payment: Option<PaymentDto>,
    #[serde(default)]
    pub slot: Option<SlotRefDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCountersDto {
    #[serde(default)]
    pub total_students: u64,
    #[serde(default)]
    pub total_professors: u64,
    #[serde(default)]
    pub total_courses: u64,
    #[serde(default)]
    pub total_reservations: u64,
    #[serde(default)]
    pub pending_payments: u64,
    #[serde(default)]
    pub total_revenue: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentReservationDto {
    pub id: i64,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub course_title: Option<String>,
    pub status: ReservationStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPaymentDto {
    pub id: i64,
    #[serde(default)]
    pub student_name: Option<String>,
    pub amount: i64,
    pub status: PaymentStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivityDto {
    #[serde(default)]
    pub reservations: Vec<RecentReservationDto>,
    #[serde(default)]
    pub pending_payments: Vec<PendingPaymentDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboardDto {
    pub stats: DashboardCountersDto,
    #[serde(default)]
    pub recent_activity: RecentActivityDto,
}

/// Validation failures arrive as a list of messages.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorMessage {
    fn into_text(self) -> String {
        match self {
            ErrorMessage::One(message) => message,
            ErrorMessage::Many(messages) => messages
                .into_iter()
                .filter(|m| !m.trim().is_empty())
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<ErrorMessage>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        let not_blank = |m: &String| !m.trim().is_empty();
        self.message
            .map(ErrorMessage::into_text)
            .filter(not_blank)
            .or(self.error.filter(not_blank))
    }
}

impl CourseDto {
    pub fn into_model(self) -> Result<Course, AppError> {
        let course_id = self.id;
        let classes = self
            .classes
            .into_iter()
            .map(|c| c.into_model(course_id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Course {
            id: self.id,
            acronym: self.acronym,
            title: self.title,
            description: self.description,
            classes,
        })
    }
}

impl ClassDto {
    pub fn into_model(self, course_id: i64) -> Result<CourseClass, AppError> {
        if self.base_price < 0 {
            return Err(AppError::Decode(format!(
                "class {} has a negative base price",
                self.id
            )));
        }
        let class_id = self.id;
        let slots = self
            .slots
            .into_iter()
            .map(|s| s.into_model(Some(class_id)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CourseClass {
            id: self.id,
            course_id: self.course_id.unwrap_or(course_id),
            title: self.title,
            description: self.description,
            order_index: self.order_index,
            base_price: self.base_price,
            slots,
        })
    }
}

impl SlotDto {
    /// `class_hint` fills in the class id for slots nested under a class.
    pub fn into_model(self, class_hint: Option<i64>) -> Result<Slot, AppError> {
        let class_id = self
            .class_id
            .or(class_hint)
            .ok_or_else(|| AppError::Decode(format!("slot {} has no classId", self.id)))?;

        if self.end_time <= self.start_time {
            return Err(AppError::Decode(format!(
                "slot {} ends before it starts",
                self.id
            )));
        }
        if self.max_students < 0 || self.min_students < 0 {
            return Err(AppError::Decode(format!(
                "slot {} has a negative capacity",
                self.id
            )));
        }
        if self.max_students < self.min_students {
            return Err(AppError::Decode(format!(
                "slot {} has maxStudents below minStudents",
                self.id
            )));
        }

        let slot_id = self.id;
        let reservations = self
            .reservations
            .into_iter()
            .map(|r| r.into_model(Some(slot_id)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Slot {
            id: self.id,
            class_id,
            start_time: self.start_time,
            end_time: self.end_time,
            modality: self.modality,
            min_students: self.min_students,
            max_students: self.max_students,
            status: self.status,
            professor: self.professor.map(ProfessorDto::into_model),
            reservations,
            reserved_by_current_user: self.reserved_by_current_user,
        })
    }
}

impl ProfessorDto {
    pub fn into_model(self) -> ProfessorRef {
        let name = match (self.name, self.first_name, self.last_name) {
            (Some(name), _, _) => name,
            (None, Some(first), Some(last)) => format!("{} {}", first, last),
            (None, Some(first), None) => first,
            (None, None, Some(last)) => last,
            (None, None, None) => String::new(),
        };
        ProfessorRef { id: self.id, name }
    }
}

impl ReservationDto {
    /// `slot_hint` fills in the slot id for reservations nested under a slot.
    pub fn into_model(self, slot_hint: Option<i64>) -> Result<Reservation, AppError> {
        let slot_id = self
            .slot_id
            .or(self.slot.as_ref().map(|s| s.id))
            .or(slot_hint)
            .ok_or_else(|| {
                AppError::Decode(format!("reservation {} has no slotId", self.id))
            })?;

        let payment = self.payment.map(PaymentDto::into_model).transpose()?;

        Ok(Reservation {
            id: self.id,
            student_id: self.student_id,
            slot_id,
            status: self.status,
            payment,
            slot: self.slot.map(|s| SlotRef {
                id: s.id,
                class_id: s.class_id,
                start_time: s.start_time,
                end_time: s.end_time,
            }),
        })
    }
}

impl PaymentDto {
    pub fn into_model(self) -> Result<Payment, AppError> {
        if self.amount < 0 {
            return Err(AppError::Decode(format!(
                "payment {} has a negative amount",
                self.id
            )));
        }
        Ok(Payment {
            id: self.id,
            amount: self.amount,
            status: self.status,
            transaction_reference: self.transaction_reference,
            reservation_ids: self.reservation_ids,
        })
    }
}

impl AdminDashboardDto {
    pub fn into_model(self) -> AdminDashboardStats {
        let stats = DashboardCounters {
            total_students: self.stats.total_students,
            total_professors: self.stats.total_professors,
            total_courses: self.stats.total_courses,
            total_reservations: self.stats.total_reservations,
            pending_payments: self.stats.pending_payments,
            total_revenue: self.stats.total_revenue,
        };

        let reservations = self
            .recent_activity
            .reservations
            .into_iter()
            .map(|r| RecentReservation {
                id: r.id,
                student_name: r.student_name.unwrap_or_default(),
                course_title: r.course_title.unwrap_or_default(),
                status: r.status,
                created_at: r.created_at,
            })
            .collect();

        let pending_payments = self
            .recent_activity
            .pending_payments
            .into_iter()
            .map(|p| PendingPayment {
                id: p.id,
                student_name: p.student_name.unwrap_or_default(),
                amount: p.amount,
                status: p.status,
                created_at: p.created_at,
            })
            .collect();

        AdminDashboardStats {
            stats,
            recent_activity: RecentActivity {
                reservations,
                pending_payments,
            },
        }
    }
}
