//! Key layout (spec.md §6 "Key-value key layout").

use uuid::Uuid;

pub fn avail(show_id: Uuid, zone_id: Uuid) -> String {
    format!("avail:{show_id}:{zone_id}")
}

pub fn userres(user_id: Uuid, event_id: Uuid) -> String {
    format!("userres:{user_id}:{event_id}")
}

pub fn reservation(booking_id: Uuid) -> String {
    format!("res:{booking_id}")
}
