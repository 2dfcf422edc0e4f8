use std::{sync::Arc, time::Duration as StdDuration};

use chrono::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{LiveRfid, RfidScan},
    storage::mailbox::MailboxStore,
};

use super::{
    clock::Clock,
    freshness::{to_chrono, within_exclusive},
};

/// Hands the latest scanner read to whoever polls next.
///
/// One slot, last write wins. A scan that ages out of the active window is
/// still returned, flagged inactive, until it is overwritten or cleared.
#[derive(Clone)]
pub struct RfidRelay {
    mailbox: Arc<dyn MailboxStore>,
    clock: Arc<dyn Clock>,
    active_window: Duration,
}

impl RfidRelay {
    pub fn new(
        mailbox: Arc<dyn MailboxStore>,
        clock: Arc<dyn Clock>,
        active_window: StdDuration,
    ) -> Self {
        Self {
            mailbox,
            clock,
            active_window: to_chrono(active_window),
        }
    }

    pub async fn publish(&self, uid: Option<&str>) -> AppResult<RfidScan> {
        let uid = match uid {
            Some(uid) if !uid.trim().is_empty() => uid,
            _ => return Err(AppError::Validation("RFID UID is required".to_string())),
        };

        let scan = RfidScan {
            uid: uid.to_string(),
            captured_at: self.clock.now(),
        };
        self.mailbox.store(scan.clone()).await?;
        tracing::info!("Live RFID updated: {}", scan.uid);

        Ok(scan)
    }

    pub async fn read_live(&self) -> AppResult<LiveRfid> {
        let scan = self.mailbox.load().await?;
        let now = self.clock.now();

        Ok(match scan {
            Some(scan) => LiveRfid {
                is_active: within_exclusive(scan.captured_at, now, self.active_window),
                uid: Some(scan.uid),
                captured_at: Some(scan.captured_at),
            },
            None => LiveRfid {
                uid: None,
                captured_at: None,
                is_active: false,
            },
        })
    }

    pub async fn clear(&self) -> AppResult<()> {
        self.mailbox.clear().await?;
        tracing::info!("Live RFID cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{
            clock::{manual::ManualClock, SystemClock},
            freshness::ACTIVE_WINDOW,
        },
        storage::mailbox::MemoryMailbox,
    };
    use tokio_test::assert_ok;

    fn relay() -> (RfidRelay, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let relay = RfidRelay::new(Arc::new(MemoryMailbox::new()), clock.clone(), ACTIVE_WINDOW);
        (relay, clock)
    }

    #[tokio::test]
    async fn starts_empty() {
        let (relay, _clock) = relay();
        let live = relay.read_live().await.unwrap();
        assert_eq!(
            live,
            LiveRfid {
                uid: None,
                captured_at: None,
                is_active: false
            }
        );
    }

    #[tokio::test]
    async fn last_write_wins() {
        let (relay, clock) = relay();
        relay.publish(Some("A")).await.unwrap();
        clock.advance(Duration::milliseconds(10));
        let ack = relay.publish(Some("B")).await.unwrap();

        let live = relay.read_live().await.unwrap();
        assert_eq!(live.uid.as_deref(), Some("B"));
        assert_eq!(live.captured_at, Some(ack.captured_at));
        assert!(live.is_active);
    }

    #[tokio::test]
    async fn active_window_is_exclusive_and_keeps_stale_uid() {
        let (relay, clock) = relay();
        let ack = relay.publish(Some("X")).await.unwrap();

        clock.advance(Duration::milliseconds(29_900));
        assert!(relay.read_live().await.unwrap().is_active);

        clock.advance(Duration::milliseconds(100));
        let live = relay.read_live().await.unwrap();
        assert!(!live.is_active);
        assert_eq!(live.uid.as_deref(), Some("X"));
        assert_eq!(live.captured_at, Some(ack.captured_at));

        clock.advance(Duration::minutes(10));
        let live = relay.read_live().await.unwrap();
        assert!(!live.is_active);
        assert_eq!(live.uid.as_deref(), Some("X"));
    }

    #[tokio::test]
    async fn scan_from_a_clock_ahead_of_the_reader_is_active() {
        let (relay, clock) = relay();
        let ack = relay.publish(Some("X")).await.unwrap();

        clock.set(ack.captured_at - Duration::seconds(5));
        let live = relay.read_live().await.unwrap();
        assert!(live.is_active);
        assert_eq!(live.uid.as_deref(), Some("X"));
    }

    #[tokio::test]
    async fn reads_do_not_mutate() {
        let (relay, _clock) = relay();
        relay.publish(Some("X")).await.unwrap();
        let first = relay.read_live().await.unwrap();
        let second = relay.read_live().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let (relay, _clock) = relay();
        assert_ok!(relay.clear().await);

        relay.publish(Some("X")).await.unwrap();
        assert_ok!(relay.clear().await);
        assert_ok!(relay.clear().await);

        let live = relay.read_live().await.unwrap();
        assert_eq!(live.uid, None);
        assert_eq!(live.captured_at, None);
        assert!(!live.is_active);
    }

    #[tokio::test]
    async fn empty_or_missing_uid_is_rejected_without_touching_the_slot() {
        let (relay, _clock) = relay();
        let ack = relay.publish(Some("KEEP")).await.unwrap();

        for uid in [None, Some(""), Some("   ")] {
            let err = relay.publish(uid).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }

        let live = relay.read_live().await.unwrap();
        assert_eq!(live.uid.as_deref(), Some("KEEP"));
        assert_eq!(live.captured_at, Some(ack.captured_at));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_publishes_leave_one_whole_pair() {
        let relay = RfidRelay::new(
            Arc::new(MemoryMailbox::new()),
            Arc::new(SystemClock),
            ACTIVE_WINDOW,
        );

        let mut handles = Vec::new();
        for i in 0..64 {
            let relay = relay.clone();
            handles.push(tokio::spawn(async move {
                let uid = if i % 2 == 0 { "A" } else { "B" };
                relay.publish(Some(uid)).await.unwrap()
            }));
        }

        let mut acks = Vec::new();
        for handle in handles {
            acks.push(handle.await.unwrap());
        }

        let live = relay.read_live().await.unwrap();
        let observed = RfidScan {
            uid: live.uid.unwrap(),
            captured_at: live.captured_at.unwrap(),
        };
        assert!(acks.contains(&observed));
    }

    #[test]
    fn live_value_uses_wire_field_names() {
        let live = LiveRfid {
            uid: Some("04A1".to_string()),
            captured_at: None,
            is_active: false,
        };
        let json = serde_json::to_value(&live).unwrap();
        assert_eq!(json["uid"], "04A1");
        assert!(json["timestamp"].is_null());
        assert_eq!(json["isActive"], false);
    }
}
