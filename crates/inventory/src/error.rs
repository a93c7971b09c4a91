use turnstile_types::AppError;

/// Translates a script's `redis.error_reply` payload into the matching
/// [`AppError`] variant (spec.md §4.1 "Failure semantics" — engine errors
/// are deterministic strings).
pub fn map_script_error(err: redis::RedisError) -> AppError {
    let msg = err.to_string();

    if let Some(rest) = extract(&msg, "INSUFFICIENT_STOCK:") {
        let available = rest.parse().unwrap_or(0);
        return AppError::InsufficientStock {
            available,
            requested: 0,
        };
    }
    if let Some(rest) = extract(&msg, "USER_LIMIT_EXCEEDED:") {
        let held = rest.parse().unwrap_or(0);
        return AppError::UserLimitExceeded { cap: 0, held };
    }
    if msg.contains("INVALID_QUANTITY") {
        return AppError::Validation("quantity must be positive".into());
    }
    if msg.contains("ZONE_NOT_FOUND") {
        return AppError::ZoneNotFound(String::new());
    }
    if msg.contains("ALREADY_RESERVED") {
        return AppError::AlreadyReserved;
    }
    if msg.contains("RESERVATION_NOT_FOUND") {
        return AppError::ReservationNotFound(String::new());
    }
    if msg.contains("INVALID_BOOKING_ID") {
        return AppError::InvalidBookingId;
    }
    if msg.contains("INVALID_USER_ID") {
        return AppError::InvalidUserId;
    }
    if msg.contains("ALREADY_RELEASED") {
        return AppError::AlreadyReleased;
    }

    AppError::Redis(msg)
}

fn extract<'a>(msg: &'a str, prefix: &str) -> Option<&'a str> {
    let idx = msg.find(prefix)?;
    let tail = &msg[idx + prefix.len()..];
    Some(tail.split(|c: char| !c.is_ascii_digit()).next().unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_available_count_from_insufficient_stock() {
        let err = redis::RedisError::from((
            redis::ErrorKind::ExtensionError,
            "script",
            "INSUFFICIENT_STOCK:7".to_string(),
        ));
        match map_script_error(err) {
            AppError::InsufficientStock { available, .. } => assert_eq!(available, 7),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn maps_already_reserved() {
        let err = redis::RedisError::from((
            redis::ErrorKind::ExtensionError,
            "script",
            "ALREADY_RESERVED".to_string(),
        ));
        assert!(matches!(map_script_error(err), AppError::AlreadyReserved));
    }
}
