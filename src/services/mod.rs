pub mod availability;
pub mod course_page;
pub mod dashboard;
pub mod reconciler;
pub mod reschedule;
pub mod view;

pub use availability::{AvailabilityView, DayBucket, SlotAvailability, SlotOccupancy, SlotView};
pub use course_page::CoursePage;
pub use dashboard::{DashboardSummary, format_clp};
pub use reconciler::{
    DashboardReservations, ReservationReconciler, RollbackPolicy, has_access_to_class,
};
pub use reschedule::{RescheduleActions, RescheduleFlow};
pub use view::ViewGuard;

/// Outcome of a user action, shown as a toast or inline banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Success(String),
    Error(String),
}

impl Feedback {
    pub fn is_success(&self) -> bool {
        matches!(self, Feedback::Success(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Feedback::Success(msg) | Feedback::Error(msg) => msg,
        }
    }
}
