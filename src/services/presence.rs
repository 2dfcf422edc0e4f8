use std::{sync::Arc, time::Duration as StdDuration};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Device, DeviceWithPresence, Presence},
    storage::devices::DeviceStore,
};

use super::{
    clock::Clock,
    freshness::{to_chrono, within_inclusive},
};

/// Derives device reachability from the last heartbeat.
///
/// Presence is projected at read time and never written back; the stored
/// status column is only a hint and is ignored here.
#[derive(Clone)]
pub struct PresenceTracker {
    store: Arc<dyn DeviceStore>,
    clock: Arc<dyn Clock>,
    stale_window: Duration,
}

impl PresenceTracker {
    pub fn new(store: Arc<dyn DeviceStore>, clock: Arc<dyn Clock>, stale_window: StdDuration) -> Self {
        Self {
            store,
            clock,
            stale_window: to_chrono(stale_window),
        }
    }

    /// Stamps the device with server arrival time.
    pub async fn record_heartbeat(&self, device_id: Uuid) -> AppResult<()> {
        let now = self.clock.now();
        self.store.update_device_heartbeat(device_id, now).await?;
        tracing::debug!("Heartbeat from device {} at {}", device_id, now);
        Ok(())
    }

    pub async fn list_with_presence(&self) -> AppResult<Vec<DeviceWithPresence>> {
        let devices = self.store.list_devices().await?;
        let now = self.clock.now();

        Ok(devices
            .into_iter()
            .map(|device| self.annotate(device, now))
            .collect())
    }

    pub async fn get_by_id_with_presence(&self, device_id: Uuid) -> AppResult<DeviceWithPresence> {
        let device = self.store.find_device_by_id(device_id).await?;
        Ok(self.annotate(device, self.clock.now()))
    }

    fn annotate(&self, device: Device, now: DateTime<Utc>) -> DeviceWithPresence {
        let effective_status = effective_status(device.last_heartbeat_at, now, self.stale_window);
        DeviceWithPresence {
            device,
            effective_status,
        }
    }
}

pub fn effective_status(
    last_heartbeat_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    stale_window: Duration,
) -> Presence {
    match last_heartbeat_at {
        Some(at) if within_inclusive(at, now, stale_window) => Presence::Online,
        _ => Presence::Offline,
    }
}
