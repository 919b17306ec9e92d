#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Frontdesk Backend - async JSON client for the booking/meetings API.
//!
//! One method per backend verb, a shared retry core, and typed response
//! envelopes. The client is cheap to clone; the underlying connection
//! pool is shared.
//!
//! # Retry policy
//!
//! - Up to 3 attempts per call
//! - Exponential backoff `base x 2^attempt` (base 1 s)
//! - HTTP 429 sleeps for `Retry-After` seconds without consuming an attempt
//! - 404 and 401 are terminal and map to stable messages
//! - 5xx, timeouts, and connection failures are retried
//!
//! # Example
//!
//! ```rust,no_run
//! use frontdesk_backend::{BackendAuth, BackendClient};
//! use frontdesk_core::BookingId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = BackendClient::new(
//!     "https://backend.example.com",
//!     BackendAuth::ApiKey("key".into()),
//! )?;
//!
//! let id = BookingId::parse("BK-1234-5678")?;
//! let response = client.get_booking(&id).await?;
//! println!("status: {:?}", response.booking.and_then(|b| b.status));
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod types;

pub use client::{BackendAuth, BackendClient, RetryPolicy};
pub use error::{BackendError, BackendResult};
pub use types::{
    AvailabilityResponse, BookingRecord, CancelBookingResponse, CreateBookingRequest,
    CreateBookingResponse, GetBookingResponse, HealthResponse, RescheduleBookingResponse,
    RescheduleRequest, ScheduleMeetingRequest, ScheduleMeetingResponse,
};
