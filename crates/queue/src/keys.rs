use uuid::Uuid;

pub fn queue_set(event_id: Uuid) -> String {
    format!("queue:{event_id}")
}

pub fn budget(event_id: Uuid, unix_secs: i64) -> String {
    format!("queue:{event_id}:budget:{unix_secs}")
}

pub fn passes_index(event_id: Uuid) -> String {
    format!("passes:{event_id}")
}

pub fn pass_key(event_id: Uuid, user_id: Uuid) -> String {
    format!("pass:{event_id}:{user_id}")
}

pub fn pass_channel(event_id: Uuid, user_id: Uuid) -> String {
    format!("pass:{event_id}:{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_per_event_and_user() {
        let event_id = Uuid::new_v4();
        let other_event = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        assert_ne!(queue_set(event_id), queue_set(other_event));
        assert!(queue_set(event_id).starts_with("queue:"));
        assert!(passes_index(event_id).starts_with("passes:"));
        assert_eq!(pass_key(event_id, user_id), pass_channel(event_id, user_id));
    }

    #[test]
    fn budget_key_is_scoped_per_second() {
        let event_id = Uuid::new_v4();
        assert_ne!(budget(event_id, 100), budget(event_id, 101));
    }
}
