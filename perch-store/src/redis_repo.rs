use async_trait::async_trait;
use chrono::{DateTime, Utc};
use perch_core::{Booking, SlotKey, SlotState, SlotStore, StoreError, VersionedSlot};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::debug;
use uuid::Uuid;

const HOLD_INDEX_KEY: &str = "holds:index";
const HOLD_EXPIRY_KEY: &str = "holds:by_expiry";

/// Version-guarded swap plus hold-index maintenance in one script
/// invocation, so the index can never disagree with the slot it
/// points at. Returns 1 on success, 0 when the guard fails.
const CAS_SCRIPT: &str = r#"
local cur = redis.call('GET', KEYS[1])
if not cur then return 0 end
local decoded = cjson.decode(cur)
if tonumber(decoded.version) ~= tonumber(ARGV[1]) then return 0 end
if decoded.state.status == 'HELD' then
    redis.call('HDEL', KEYS[2], decoded.state.hold.id)
    redis.call('ZREM', KEYS[3], ARGV[4])
end
redis.call('SET', KEYS[1], ARGV[2])
if ARGV[3] ~= '' then
    redis.call('HSET', KEYS[2], ARGV[3], ARGV[4])
    redis.call('ZADD', KEYS[3], ARGV[5], ARGV[4])
end
return 1
"#;

/// Insert-if-absent for seeding. Mirrors the hold-index bookkeeping of
/// the swap script so a seeded held slot is indexed too; an existing
/// key is left entirely alone.
const SEED_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then return 0 end
redis.call('SET', KEYS[1], ARGV[1])
if ARGV[2] ~= '' then
    redis.call('HSET', KEYS[2], ARGV[2], ARGV[3])
    redis.call('ZADD', KEYS[3], ARGV[4], ARGV[3])
end
return 1
"#;

/// Redis-backed slot store for multi-process deployments. Slots live
/// as JSON values under `slot:{desk}:{date}:{ts}`; the hold index is a
/// hash from hold id to the JSON-encoded slot key, with a ZSET scored
/// by expiry deadline feeding the sweeper.
pub struct RedisSlotStore {
    client: redis::Client,
    cas: redis::Script,
    seed: redis::Script,
}

impl RedisSlotStore {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self {
            client,
            cas: redis::Script::new(CAS_SCRIPT),
            seed: redis::Script::new(SEED_SCRIPT),
        })
    }

    async fn conn(&self) -> Result<MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend)
    }
}

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl SlotStore for RedisSlotStore {
    async fn load(&self, key: &SlotKey) -> Result<Option<VersionedSlot>, StoreError> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(key.storage_key()).await.map_err(backend)?;
        raw.map(|s| serde_json::from_str(&s).map_err(backend)).transpose()
    }

    async fn compare_and_swap(
        &self,
        key: &SlotKey,
        expected_version: u64,
        next: SlotState,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;

        let next_slot = VersionedSlot {
            version: expected_version + 1,
            state: next,
        };
        let (new_hold_id, new_expiry_ms) = match &next_slot.state {
            SlotState::Held { hold } => {
                (hold.id.to_string(), hold.expires_at.timestamp_millis().to_string())
            }
            _ => (String::new(), String::new()),
        };
        let member = serde_json::to_string(key).map_err(backend)?;
        let payload = serde_json::to_string(&next_slot).map_err(backend)?;

        let swapped: i64 = self
            .cas
            .key(key.storage_key())
            .key(HOLD_INDEX_KEY)
            .key(HOLD_EXPIRY_KEY)
            .arg(expected_version)
            .arg(payload)
            .arg(new_hold_id)
            .arg(member)
            .arg(new_expiry_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(backend)?;

        debug!(slot = %key, expected_version, swapped, "slot cas");
        Ok(swapped == 1)
    }

    async fn find_hold(&self, hold_id: Uuid) -> Result<Option<(SlotKey, VersionedSlot)>, StoreError> {
        let mut conn = self.conn().await?;
        let member: Option<String> = conn
            .hget(HOLD_INDEX_KEY, hold_id.to_string())
            .await
            .map_err(backend)?;
        let Some(member) = member else {
            return Ok(None);
        };
        let key: SlotKey = serde_json::from_str(&member).map_err(backend)?;
        let raw: Option<String> = conn.get(key.storage_key()).await.map_err(backend)?;
        match raw {
            Some(s) => {
                let slot: VersionedSlot = serde_json::from_str(&s).map_err(backend)?;
                Ok(Some((key, slot)))
            }
            None => Ok(None),
        }
    }

    async fn insert_booking(&self, booking: Booking) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let payload = serde_json::to_string(&booking).map_err(backend)?;
        conn.set::<_, _, ()>(format!("booking:{}", booking.id), payload)
            .await
            .map_err(backend)
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, StoreError> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn
            .get(format!("booking:{}", booking_id))
            .await
            .map_err(backend)?;
        raw.map(|s| serde_json::from_str(&s).map_err(backend)).transpose()
    }

    async fn expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<SlotKey>, StoreError> {
        let mut conn = self.conn().await?;
        let members: Vec<String> = conn
            .zrangebyscore(HOLD_EXPIRY_KEY, "-inf", now.timestamp_millis())
            .await
            .map_err(backend)?;
        members
            .iter()
            .map(|m| serde_json::from_str(m).map_err(backend))
            .collect()
    }

    async fn insert_slot(&self, key: SlotKey, slot: VersionedSlot) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let payload = serde_json::to_string(&slot).map_err(backend)?;
        let (hold_id, expiry_ms) = match &slot.state {
            SlotState::Held { hold } => {
                (hold.id.to_string(), hold.expires_at.timestamp_millis().to_string())
            }
            _ => (String::new(), String::new()),
        };
        let member = serde_json::to_string(&key).map_err(backend)?;

        let inserted: i64 = self
            .seed
            .key(key.storage_key())
            .key(HOLD_INDEX_KEY)
            .key(HOLD_EXPIRY_KEY)
            .arg(payload)
            .arg(hold_id)
            .arg(member)
            .arg(expiry_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(inserted == 1)
    }
}
