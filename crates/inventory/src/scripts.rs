//! Lua bodies for the three mutation paths (spec.md §4.1).
//!
//! Each script runs as a single atomic round-trip against the store; no
//! read-modify-write step is ever split across two network calls, which is
//! what makes the "no oversell under arbitrary concurrency" guarantee hold.

pub const RESERVE: &str = r#"
local quantity = tonumber(ARGV[1])
if quantity <= 0 then
  return redis.error_reply("INVALID_QUANTITY")
end

if redis.call("EXISTS", KEYS[3]) == 1 then
  return redis.error_reply("ALREADY_RESERVED")
end

local available = redis.call("GET", KEYS[1])
if available == false then
  return redis.error_reply("ZONE_NOT_FOUND")
end
available = tonumber(available)
if available < quantity then
  return redis.error_reply("INSUFFICIENT_STOCK:" .. available)
end

local max_per_user = tonumber(ARGV[2])
local userres = tonumber(redis.call("GET", KEYS[2]) or "0")
if (userres + quantity) > max_per_user then
  return redis.error_reply("USER_LIMIT_EXCEEDED:" .. userres)
end

local new_available = redis.call("DECRBY", KEYS[1], quantity)
local new_userres = redis.call("INCRBY", KEYS[2], quantity)
redis.call("EXPIRE", KEYS[2], tonumber(ARGV[3]))

redis.call("HSET", KEYS[3],
  "booking_id", ARGV[4],
  "user_id", ARGV[5],
  "zone_id", ARGV[6],
  "event_id", ARGV[7],
  "show_id", ARGV[8],
  "quantity", ARGV[1],
  "unit_price", ARGV[9],
  "status", "reserved",
  "created_at", ARGV[10],
  "expires_at", ARGV[11]
)
redis.call("EXPIRE", KEYS[3], tonumber(ARGV[12]))

return {new_available, new_userres}
"#;

pub const RELEASE: &str = r#"
if redis.call("EXISTS", KEYS[1]) == 0 then
  return redis.error_reply("RESERVATION_NOT_FOUND")
end

if redis.call("HGET", KEYS[1], "booking_id") ~= ARGV[1] then
  return redis.error_reply("INVALID_BOOKING_ID")
end
if redis.call("HGET", KEYS[1], "user_id") ~= ARGV[2] then
  return redis.error_reply("INVALID_USER_ID")
end
if redis.call("HGET", KEYS[1], "status") ~= "reserved" then
  return redis.error_reply("ALREADY_RELEASED")
end

local quantity = tonumber(redis.call("HGET", KEYS[1], "quantity"))

local new_available = redis.call("INCRBY", KEYS[2], quantity)

local new_userres = redis.call("DECRBY", KEYS[3], quantity)
if new_userres <= 0 then
  redis.call("DEL", KEYS[3])
  new_userres = 0
else
  redis.call("EXPIRE", KEYS[3], tonumber(ARGV[3]))
end

redis.call("DEL", KEYS[1])

return {new_available, new_userres}
"#;

pub const CONSUME: &str = r#"
if redis.call("EXISTS", KEYS[1]) == 0 then
  return redis.error_reply("RESERVATION_NOT_FOUND")
end

local status = redis.call("HGET", KEYS[1], "status")
if status == "consumed" then
  return 1
end
if status ~= "reserved" then
  return redis.error_reply("ALREADY_RELEASED")
end

redis.call("HSET", KEYS[1], "status", "consumed")
return 1
"#;
