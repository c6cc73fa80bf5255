pub mod course;
pub mod dashboard;
pub mod reservation;
pub mod slot;

pub use course::{Course, CourseClass};
pub use dashboard::{AdminDashboardStats, DashboardCounters, PendingPayment, RecentActivity, RecentReservation};
pub use reservation::{
    NewReservationRequest, Payment, PaymentStatus, RescheduleRequest, Reservation,
    ReservationStatus, SlotRef,
};
pub use slot::{Modality, ProfessorRef, Slot, SlotStatus};
