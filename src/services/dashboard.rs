use std::sync::Arc;

use tracing::info;

use crate::api::BookingApi;
use crate::error::AppError;
use crate::models::*;

/// Formats Chilean pesos: `$1.234.567`.
pub fn format_clp(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

pub fn reservation_status_label(status: ReservationStatus) -> &'static str {
    match status {
        ReservationStatus::Pending => "Pendiente",
        ReservationStatus::Confirmed => "Confirmada",
        ReservationStatus::Cancelled => "Cancelada",
    }
}

pub fn payment_status_label(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "Pendiente",
        PaymentStatus::Paid => "Pagado",
        PaymentStatus::Failed => "Rechazado",
        PaymentStatus::Refunded => "Reembolsado",
    }
}

pub struct DashboardSummary {
    stats: AdminDashboardStats,
}

impl DashboardSummary {
    pub async fn load(api: Arc<dyn BookingApi>) -> Result<Self, AppError> {
        let stats = api.get_admin_dashboard().await?;
        info!(
            "Admin dashboard loaded: {} reservations, {} pending payments",
            stats.stats.total_reservations, stats.stats.pending_payments
        );
        Ok(Self { stats })
    }

    pub fn from_stats(stats: AdminDashboardStats) -> Self {
        Self { stats }
    }

    pub fn stats(&self) -> &AdminDashboardStats {
        &self.stats
    }

    pub fn lines(&self) -> Vec<(&'static str, String)> {
        let s = &self.stats.stats;
        vec![
            ("Estudiantes", s.total_students.to_string()),
            ("Profesores", s.total_professors.to_string()),
            ("Cursos", s.total_courses.to_string()),
            ("Reservas", s.total_reservations.to_string()),
            ("Pagos pendientes", s.pending_payments.to_string()),
            ("Ingresos", format_clp(s.total_revenue)),
        ]
    }

    pub fn recent_reservation_lines(&self) -> Vec<String> {
        self.stats
            .recent_activity
            .reservations
            .iter()
            .map(|r| {
                format!(
                    "#{} {} - {} ({})",
                    r.id,
                    r.student_name,
                    r.course_title,
                    reservation_status_label(r.status)
                )
            })
            .collect()
    }

    pub fn pending_payment_lines(&self) -> Vec<String> {
        self.stats
            .recent_activity
            .pending_payments
            .iter()
            .map(|p| {
                format!(
                    "#{} {} {} ({})",
                    p.id,
                    p.student_name,
                    format_clp(p.amount),
                    payment_status_label(p.status)
                )
            })
            .collect()
    }
}

/// Slots taught by one professor, earliest first.
pub fn professor_slots(slots: &[Slot], professor_id: i64) -> Vec<&Slot> {
    let mut own: Vec<&Slot> = slots
        .iter()
        .filter(|s| s.professor.as_ref().is_some_and(|p| p.id == professor_id))
        .collect();
    own.sort_by_key(|s| s.start_time);
    own
}
