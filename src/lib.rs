pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use api::{BookingApi, BookingHttpClient};
pub use cache::CachedBookingApi;
pub use config::ApiConfig;
pub use error::AppError;
pub use session::Session;
