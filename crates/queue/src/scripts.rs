//! Lua bodies for the Queue Manager's mutation paths (spec.md §4.2).

/// KEYS[1] = queue zset. ARGV[1] = user_id, ARGV[2] = joined_ts score,
/// ARGV[3] = capacity, ARGV[4] = "1"/"0" open flag.
pub const JOIN: &str = r#"
if ARGV[4] == "0" then
  return redis.error_reply("QUEUE_NOT_OPEN")
end

local existing = redis.call("ZSCORE", KEYS[1], ARGV[1])
if existing then
  return redis.error_reply("ALREADY_IN_QUEUE")
end

local capacity = tonumber(ARGV[3])
local total = redis.call("ZCARD", KEYS[1])
if total >= capacity then
  return redis.error_reply("QUEUE_FULL")
end

redis.call("ZADD", KEYS[1], "NX", ARGV[2], ARGV[1])
local rank = redis.call("ZRANK", KEYS[1], ARGV[1])
return {rank + 1, total + 1}
"#;

/// KEYS[1] = budget counter key. ARGV[1] = release_rate, ARGV[2] = desired
/// batch size. Returns the number of admits granted for this tick.
pub const GOVERN_ADMISSION: &str = r#"
local rate = tonumber(ARGV[1])
local desired = tonumber(ARGV[2])
local used = tonumber(redis.call("GET", KEYS[1]) or "0")
local remaining = rate - used
if remaining <= 0 then
  redis.call("EXPIRE", KEYS[1], 2)
  return 0
end
local grant = math.min(remaining, desired)
redis.call("INCRBY", KEYS[1], grant)
redis.call("EXPIRE", KEYS[1], 2)
return grant
"#;

/// KEYS[1] = pass key, KEYS[2] = passes index set. ARGV[1] = user_id,
/// ARGV[2] = presented token.
pub const CONSUME_PASS: &str = r#"
local stored = redis.call("GET", KEYS[1])
if not stored or stored ~= ARGV[2] then
  return redis.error_reply("INVALID_QUEUE_TOKEN")
end
redis.call("DEL", KEYS[1])
redis.call("SREM", KEYS[2], ARGV[1])
return 1
"#;
