use reqwest::StatusCode;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("Unauthorized: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Business(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Not found")]
    NotFound,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Message shown to the user at the component boundary.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Network(e) => {
                error!("network error: {}", e);
                "No se pudo conectar con el servidor. Intenta nuevamente.".to_string()
            }
            AppError::Api { status, message } => {
                error!("api error {}: {}", status, message);
                if message.is_empty() {
                    format!("Error del servidor ({})", status.as_u16())
                } else {
                    translate_backend_message(message)
                }
            }
            AppError::Auth(msg) => known_backend_message(msg).unwrap_or_else(|| {
                "Tu sesión ha expirado. Inicia sesión nuevamente.".to_string()
            }),
            AppError::Validation(msg) => msg.clone(),
            AppError::Business(msg) => translate_backend_message(msg),
            AppError::Decode(msg) => {
                error!("malformed payload: {}", msg);
                "La respuesta del servidor no es válida.".to_string()
            }
            AppError::NotFound => "No se encontró el recurso solicitado.".to_string(),
            AppError::Config(msg) => format!("Configuración inválida: {}", msg),
        }
    }
}

/// Known backend phrases and their user-facing copy. Matching is
/// case-insensitive on a substring of the backend message.
const BACKEND_MESSAGES: &[(&str, &str)] = &[
    ("slot is full", "Este horario ya no tiene cupos disponibles."),
    ("slot full", "Este horario ya no tiene cupos disponibles."),
    ("no hay cupos", "Este horario ya no tiene cupos disponibles."),
    ("already reserved", "Ya tienes una reserva para este horario."),
    ("already has a reservation", "Ya tienes una reserva para este horario."),
    ("ya tienes una reserva", "Ya tienes una reserva para este horario."),
    ("reservation not found", "No se encontró la reserva."),
    ("slot not found", "No se encontró el horario seleccionado."),
    ("cannot cancel", "Esta reserva ya no se puede cancelar."),
    ("payment required", "Debes completar el pago para continuar."),
    ("refund already requested", "Ya solicitaste el reembolso de esta reserva."),
    ("no reschedule options", "No hay horarios alternativos disponibles."),
    ("invalid credentials", "Credenciales inválidas."),
    ("forbidden", "No tienes permisos para realizar esta acción."),
    ("not allowed", "No tienes permisos para realizar esta acción."),
];

/// Translates a backend message into user-facing copy. Unknown messages
/// are returned verbatim.
pub fn translate_backend_message(message: &str) -> String {
    known_backend_message(message).unwrap_or_else(|| message.to_string())
}

fn known_backend_message(message: &str) -> Option<String> {
    let lowered = message.to_lowercase();
    BACKEND_MESSAGES
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, copy)| copy.to_string())
}
