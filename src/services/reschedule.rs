use std::sync::Arc;

use tracing::{info, warn};

use crate::api::BookingApi;
use crate::error::AppError;
use crate::models::Slot;
use crate::services::Feedback;

/// Which buttons of the reschedule screen are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RescheduleActions {
    pub confirm_reschedule: bool,
    pub request_refund: bool,
}

/// Moving a confirmed reservation to another slot of the same class. When
/// the backend offers no alternatives the only way out is a refund.
pub struct RescheduleFlow {
    api: Arc<dyn BookingApi>,
    reservation_id: i64,
    options: Vec<Slot>,
    selected: Option<i64>,
}

impl RescheduleFlow {
    pub async fn load(api: Arc<dyn BookingApi>, reservation_id: i64) -> Result<Self, AppError> {
        let options = api.get_reschedule_options(reservation_id).await?;
        info!(
            "Reservation {} has {} reschedule options",
            reservation_id,
            options.len()
        );
        Ok(Self {
            api,
            reservation_id,
            options,
            selected: None,
        })
    }

    pub fn reservation_id(&self) -> i64 {
        self.reservation_id
    }

    pub fn options(&self) -> &[Slot] {
        &self.options
    }

    pub fn selected(&self) -> Option<i64> {
        self.selected
    }

    pub fn select(&mut self, slot_id: i64) -> Result<(), AppError> {
        if !self.options.iter().any(|s| s.id == slot_id) {
            return Err(AppError::Validation(
                "El horario seleccionado no está entre las opciones disponibles.".to_string(),
            ));
        }
        self.selected = Some(slot_id);
        Ok(())
    }

    pub fn actions(&self) -> RescheduleActions {
        let has_options = !self.options.is_empty();
        RescheduleActions {
            confirm_reschedule: has_options && self.selected.is_some(),
            request_refund: !has_options,
        }
    }

    pub async fn confirm(&self) -> Feedback {
        let Some(new_slot_id) = self.selected.filter(|_| self.actions().confirm_reschedule) else {
            return Feedback::Error("Selecciona un nuevo horario.".to_string());
        };

        match self
            .api
            .reschedule_reservation(self.reservation_id, new_slot_id)
            .await
        {
            Ok(()) => {
                info!(
                    "Reservation {} moved to slot {}",
                    self.reservation_id, new_slot_id
                );
                Feedback::Success("Tu clase fue reagendada.".to_string())
            }
            Err(e) => {
                warn!("Reschedule of {} failed: {}", self.reservation_id, e);
                Feedback::Error(e.user_message())
            }
        }
    }

    pub async fn refund(&self) -> Feedback {
        if !self.actions().request_refund {
            return Feedback::Error(
                "Hay horarios disponibles; reagenda tu clase en lugar de solicitar reembolso."
                    .to_string(),
            );
        }

        match self.api.request_refund(self.reservation_id).await {
            Ok(()) => {
                info!("Refund requested for reservation {}", self.reservation_id);
                Feedback::Success("Solicitud de reembolso enviada.".to_string())
            }
            Err(e) => {
                warn!("Refund of {} failed: {}", self.reservation_id, e);
                Feedback::Error(e.user_message())
            }
        }
    }
}
