use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};

use crate::{error::AppResult, models::RfidScan};

use super::mailbox::MailboxStore;

const LIVE_RFID_KEY: &str = "rfid:live";

#[derive(Clone)]
pub struct RedisClient {
    conn: MultiplexedConnection,
}

impl RedisClient {
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }

    pub async fn set_value(&self, key: &str, value: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    pub async fn get_value(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    pub async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}

/// The whole `(uid, captured_at)` pair as one value.
fn encode_scan(scan: &RfidScan) -> AppResult<String> {
    Ok(serde_json::to_string(scan).map_err(anyhow::Error::from)?)
}

fn decode_scan(raw: &str) -> Option<RfidScan> {
    match serde_json::from_str(raw) {
        Ok(scan) => Some(scan),
        Err(e) => {
            tracing::warn!("Discarding unreadable live RFID value: {}", e);
            None
        }
    }
}

/// Mailbox shared by every instance pointed at the same Redis database.
///
/// The scan is stored as one JSON value under one key, so a reader never sees
/// a uid paired with another write's timestamp. Unlike the in-memory slot it
/// survives a server restart.
#[derive(Clone)]
pub struct RedisMailbox {
    redis: RedisClient,
}

impl RedisMailbox {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl MailboxStore for RedisMailbox {
    async fn load(&self) -> AppResult<Option<RfidScan>> {
        let raw = self.redis.get_value(LIVE_RFID_KEY).await?;
        Ok(raw.as_deref().and_then(decode_scan))
    }

    async fn store(&self, scan: RfidScan) -> AppResult<()> {
        self.redis.set_value(LIVE_RFID_KEY, &encode_scan(&scan)?).await
    }

    async fn clear(&self) -> AppResult<()> {
        self.redis.delete(LIVE_RFID_KEY).await
    }
}
