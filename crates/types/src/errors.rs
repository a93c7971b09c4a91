use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Stable, client-visible error codes (spec.md §6 "Error codes").
///
/// These strings are part of the wire contract: clients match on them, so
/// renaming a variant's `serde` rename is a breaking change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    TooManyRequests,
    InsufficientStock,
    UserLimitExceeded,
    ZoneNotFound,
    ReservationNotFound,
    InvalidBookingId,
    InvalidUserId,
    AlreadyReserved,
    AlreadyReleased,
    AlreadyInQueue,
    QueueFull,
    QueueNotOpen,
    NotInQueue,
    InvalidQueueToken,
    BookingExpired,
    PaymentFailed,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "INTERNAL_ERROR".to_string());
        write!(f, "{s}")
    }
}

/// Application-wide error type.
///
/// Every variant carries enough context to reconstruct the offending
/// request for support (spec.md §7, "Invariant violations"), and maps to
/// exactly one stable [`ErrorCode`] plus one HTTP status.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("User limit exceeded: cap {cap}, already holding {held}")]
    UserLimitExceeded { cap: i32, held: i32 },

    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    #[error("Reservation not found: {0}")]
    ReservationNotFound(String),

    #[error("Invalid booking id on reservation")]
    InvalidBookingId,

    #[error("Invalid user id on reservation")]
    InvalidUserId,

    #[error("Reservation already exists for this booking")]
    AlreadyReserved,

    #[error("Reservation already released or consumed")]
    AlreadyReleased,

    #[error("User already in queue for this event")]
    AlreadyInQueue,

    #[error("Queue is full")]
    QueueFull,

    #[error("Queue is not open yet")]
    QueueNotOpen,

    #[error("User is not in the queue")]
    NotInQueue,

    #[error("Invalid or expired queue pass token")]
    InvalidQueueToken,

    #[error("Booking expired")]
    BookingExpired,

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Redis(_) => ErrorCode::InternalError,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Unauthorized => ErrorCode::Unauthorized,
            Self::Forbidden => ErrorCode::Forbidden,
            Self::BadRequest(_) | Self::Validation(_) => ErrorCode::BadRequest,
            Self::Conflict(_) => ErrorCode::Conflict,
            Self::TooManyRequests => ErrorCode::TooManyRequests,
            Self::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            Self::UserLimitExceeded { .. } => ErrorCode::UserLimitExceeded,
            Self::ZoneNotFound(_) => ErrorCode::ZoneNotFound,
            Self::ReservationNotFound(_) => ErrorCode::ReservationNotFound,
            Self::InvalidBookingId => ErrorCode::InvalidBookingId,
            Self::InvalidUserId => ErrorCode::InvalidUserId,
            Self::AlreadyReserved => ErrorCode::AlreadyReserved,
            Self::AlreadyReleased => ErrorCode::AlreadyReleased,
            Self::AlreadyInQueue => ErrorCode::AlreadyInQueue,
            Self::QueueFull => ErrorCode::QueueFull,
            Self::QueueNotOpen => ErrorCode::QueueNotOpen,
            Self::NotInQueue => ErrorCode::NotInQueue,
            Self::InvalidQueueToken => ErrorCode::InvalidQueueToken,
            Self::BookingExpired => ErrorCode::BookingExpired,
            Self::PaymentFailed(_) => ErrorCode::PaymentFailed,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Redis(_) => 500,
            Self::NotFound(_) | Self::ReservationNotFound(_) | Self::ZoneNotFound(_) | Self::NotInQueue => 404,
            Self::Unauthorized => 401,
            Self::Forbidden | Self::InvalidQueueToken => 403,
            Self::BadRequest(_) | Self::Validation(_) | Self::InvalidBookingId | Self::InvalidUserId => 400,
            Self::Conflict(_)
            | Self::InsufficientStock { .. }
            | Self::UserLimitExceeded { .. }
            | Self::AlreadyReserved
            | Self::AlreadyReleased
            | Self::AlreadyInQueue
            | Self::QueueFull
            | Self::QueueNotOpen
            | Self::BookingExpired => 409,
            Self::TooManyRequests => 429,
            Self::PaymentFailed(_) => 402,
        }
    }

    /// Whether this outcome is a normal, expected contention result under
    /// load (spec.md §7, "Contended-resource outcomes") rather than a
    /// genuine fault — used to decide logging level at the call site.
    pub fn is_contention(&self) -> bool {
        matches!(
            self,
            Self::InsufficientStock { .. } | Self::UserLimitExceeded { .. } | Self::InvalidQueueToken
        )
    }
}
