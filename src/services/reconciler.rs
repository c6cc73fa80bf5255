use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::api::BookingApi;
use crate::error::AppError;
use crate::models::{NewReservationRequest, Reservation, ReservationStatus};
use crate::services::Feedback;

/// Paid access to a class requires a reservation on one of its slots that
/// is both confirmed and paid. A confirmed but unpaid reservation does not
/// grant access.
pub fn has_access_to_class(class_id: i64, reservations: &[Reservation]) -> bool {
    reservations.iter().any(|r| {
        r.class_id() == Some(class_id) && r.status == ReservationStatus::Confirmed && r.is_paid()
    })
}

pub fn accessible_class_ids(reservations: &[Reservation]) -> BTreeSet<i64> {
    reservations
        .iter()
        .filter(|r| r.status == ReservationStatus::Confirmed && r.is_paid())
        .filter_map(Reservation::class_id)
        .collect()
}

#[derive(Default)]
struct ReserveState {
    errors: HashMap<i64, String>,
    busy: HashSet<i64>,
}

/// Drives reserve and cancel from the slot listing. Errors are tracked per
/// slot so a failure only affects the button of the slot that failed.
pub struct ReservationReconciler {
    api: Arc<dyn BookingApi>,
    state: Mutex<ReserveState>,
}

impl ReservationReconciler {
    pub fn new(api: Arc<dyn BookingApi>) -> Self {
        Self {
            api,
            state: Mutex::new(ReserveState::default()),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ReserveState) -> T) -> T {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// A second reserve on a slot whose request is still in flight is
    /// refused without reaching the backend.
    pub async fn reserve(&self, student_id: i64, slot_id: i64) -> Feedback {
        let started = self.with_state(|s| {
            if !s.busy.insert(slot_id) {
                return false;
            }
            s.errors.remove(&slot_id);
            true
        });
        if !started {
            warn!("Reservation on slot {} already in progress", slot_id);
            return Feedback::Error("Ya hay una reserva en curso para este horario.".to_string());
        }

        let req = NewReservationRequest {
            student_id,
            slot_id,
        };
        let result = self.api.create_reservation(&req).await;

        match result {
            Ok(reservation) => {
                info!(
                    "Reservation {} created for student {} on slot {}",
                    reservation.id, student_id, slot_id
                );
                self.with_state(|s| {
                    s.busy.remove(&slot_id);
                });
                Feedback::Success("¡Reserva creada con éxito!".to_string())
            }
            Err(e) => {
                warn!("Reservation on slot {} failed: {}", slot_id, e);
                let message = e.user_message();
                self.with_state(|s| {
                    s.busy.remove(&slot_id);
                    s.errors.insert(slot_id, message.clone());
                });
                Feedback::Error(message)
            }
        }
    }

    pub fn slot_error(&self, slot_id: i64) -> Option<String> {
        self.with_state(|s| s.errors.get(&slot_id).cloned())
    }

    pub fn is_busy(&self, slot_id: i64) -> bool {
        self.with_state(|s| s.busy.contains(&slot_id))
    }

    pub fn clear_error(&self, slot_id: i64) {
        self.with_state(|s| {
            s.errors.remove(&slot_id);
        });
    }

    /// Primary cancel path: nothing changes locally until the backend
    /// confirms, then the caller reloads its listing.
    pub async fn cancel<F, Fut>(&self, reservation_id: i64, reload: F) -> Feedback
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        match self.api.cancel_reservation(reservation_id).await {
            Ok(()) => {
                info!("Reservation {} cancelled", reservation_id);
                reload().await;
                Feedback::Success("Reserva cancelada.".to_string())
            }
            Err(e) => {
                warn!("Cancelling reservation {} failed: {}", reservation_id, e);
                Feedback::Error(e.user_message())
            }
        }
    }
}

/// What the dashboard does with a reservation it removed optimistically
/// when the backend then rejects the cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollbackPolicy {
    /// Leave the local list as spliced; it diverges until the next reload.
    #[default]
    Keep,
    /// Put the reservation back where it was.
    Restore,
}

/// The student dashboard's own reservation list.
pub struct DashboardReservations {
    api: Arc<dyn BookingApi>,
    reservations: Vec<Reservation>,
    policy: RollbackPolicy,
}

impl DashboardReservations {
    pub fn new(
        api: Arc<dyn BookingApi>,
        reservations: Vec<Reservation>,
        policy: RollbackPolicy,
    ) -> Self {
        Self {
            api,
            reservations,
            policy,
        }
    }

    pub async fn load(api: Arc<dyn BookingApi>, policy: RollbackPolicy) -> Result<Self, AppError> {
        let reservations = api.list_reservations().await?;
        Ok(Self::new(api, reservations, policy))
    }

    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    pub async fn reload(&mut self) -> Result<(), AppError> {
        self.reservations = self.api.list_reservations().await?;
        Ok(())
    }

    /// Splices the reservation out before the backend answers.
    pub async fn cancel(&mut self, reservation_id: i64) -> Feedback {
        let removed = self
            .reservations
            .iter()
            .position(|r| r.id == reservation_id)
            .map(|idx| (idx, self.reservations.remove(idx)));

        match self.api.cancel_reservation(reservation_id).await {
            Ok(()) => {
                info!("Reservation {} cancelled from dashboard", reservation_id);
                Feedback::Success("Reserva cancelada.".to_string())
            }
            Err(e) => {
                warn!(
                    "Dashboard cancel of reservation {} failed: {} (policy {:?})",
                    reservation_id, e, self.policy
                );
                if let (RollbackPolicy::Restore, Some((idx, reservation))) = (self.policy, removed) {
                    let idx = idx.min(self.reservations.len());
                    self.reservations.insert(idx, reservation);
                }
                Feedback::Error(e.user_message())
            }
        }
    }

    /// Active reservations starting after `now`, soonest first. Reservations
    /// without a known start time are left out.
    pub fn upcoming(&self, now: DateTime<Utc>) -> Vec<&Reservation> {
        let mut upcoming: Vec<&Reservation> = self
            .reservations
            .iter()
            .filter(|r| r.status.is_active())
            .filter(|r| r.start_time().is_some_and(|t| t > now))
            .collect();
        upcoming.sort_by_key(|r| r.start_time());
        upcoming
    }

    pub fn has_access_to_class(&self, class_id: i64) -> bool {
        has_access_to_class(class_id, &self.reservations)
    }
}
