use turnstile_types::AppError;

pub fn map_script_error(err: redis::RedisError) -> AppError {
    let msg = err.to_string();
    if msg.contains("QUEUE_NOT_OPEN") {
        return AppError::QueueNotOpen;
    }
    if msg.contains("ALREADY_IN_QUEUE") {
        return AppError::AlreadyInQueue;
    }
    if msg.contains("QUEUE_FULL") {
        return AppError::QueueFull;
    }
    if msg.contains("INVALID_QUEUE_TOKEN") {
        return AppError::InvalidQueueToken;
    }
    AppError::Redis(msg)
}
