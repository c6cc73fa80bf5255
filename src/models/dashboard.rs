use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{PaymentStatus, ReservationStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardCounters {
    pub total_students: u64,
    pub total_professors: u64,
    pub total_courses: u64,
    pub total_reservations: u64,
    pub pending_payments: u64,
    pub total_revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentReservation {
    pub id: i64,
    pub student_name: String,
    pub course_title: String,
    pub status: ReservationStatus,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingPayment {
    pub id: i64,
    pub student_name: String,
    pub amount: i64,
    pub status: PaymentStatus,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecentActivity {
    pub reservations: Vec<RecentReservation>,
    pub pending_payments: Vec<PendingPayment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdminDashboardStats {
    pub stats: DashboardCounters,
    pub recent_activity: RecentActivity,
}
