use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch, Notify};

use super::LocationFix;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

const FIX_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AuthorizationStatus {
    NotDetermined,
    Granted,
    Denied,
    Restricted,
}

impl Default for AuthorizationStatus {
    fn default() -> Self {
        AuthorizationStatus::NotDetermined
    }
}

struct FeedInner {
    fixes: broadcast::Sender<LocationFix>,
    authorization: watch::Sender<AuthorizationStatus>,
    permission_requests: Notify,
}

/// Publisher side of the device location stream.
///
/// The platform adapter owns a clone and calls [`publish`](Self::publish) from
/// its location callback and [`set_authorization`](Self::set_authorization)
/// whenever the OS reports a permission change. Consumers only ever get a
/// [`Subscription`].
#[derive(Clone)]
pub struct LocationFeed {
    inner: Arc<FeedInner>,
}

impl LocationFeed {
    pub fn new(initial: AuthorizationStatus) -> Self {
        let (fixes, _) = broadcast::channel(FIX_BUFFER);
        let (authorization, _) = watch::channel(initial);
        Self {
            inner: Arc::new(FeedInner {
                fixes,
                authorization,
                permission_requests: Notify::new(),
            }),
        }
    }

    pub fn authorization(&self) -> AuthorizationStatus {
        *self.inner.authorization.borrow()
    }

    pub fn set_authorization(&self, status: AuthorizationStatus) {
        let previous = self.inner.authorization.send_replace(status);
        if previous != status {
            info!("Location authorization changed: {:?} -> {:?}", previous, status);
        }
    }

    /// Asks the platform to prompt for location access. Only has an effect
    /// while the status is still undetermined; returns whether a prompt was requested.
    pub fn request_permission(&self) -> bool {
        if self.authorization() != AuthorizationStatus::NotDetermined {
            return false;
        }
        self.inner.permission_requests.notify_one();
        true
    }

    /// Resolves once a permission prompt has been requested. Awaited by the platform adapter.
    pub async fn permission_requested(&self) {
        self.inner.permission_requests.notified().await;
    }

    /// Pushes a fix to every live subscription. Fixes are dropped unless
    /// location access is granted. Returns the number of subscribers reached.
    pub fn publish(&self, fix: LocationFix) -> usize {
        let status = self.authorization();
        if status != AuthorizationStatus::Granted {
            log_warn!("Dropping location fix while authorization is {:?}", status);
            return 0;
        }
        // send only fails when nobody is subscribed
        self.inner.fixes.send(fix).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Subscription {
        debug!(
            "New location subscription ({} existing)",
            self.inner.fixes.receiver_count()
        );
        Subscription {
            rx: self.inner.fixes.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.fixes.receiver_count()
    }
}

/// Read-only handle on the fix stream. Dropping it unsubscribes.
pub struct Subscription {
    rx: broadcast::Receiver<LocationFix>,
}

impl Subscription {
    /// Next fix, or `None` once the feed has gone away. Fixes the receiver
    /// fell behind on are skipped.
    pub async fn recv(&mut self) -> Option<LocationFix> {
        loop {
            match self.rx.recv().await {
                Ok(fix) => return Some(fix),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log_warn!("Location subscription lagged, skipped {} fixes", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fix(speed: f64) -> LocationFix {
        LocationFix::new(speed, 5.0, Utc::now())
    }

    #[tokio::test]
    async fn delivers_fixes_to_subscribers() {
        let feed = LocationFeed::new(AuthorizationStatus::Granted);
        let mut sub = feed.subscribe();

        assert_eq!(feed.publish(fix(10.0)), 1);
        let received = sub.recv().await.unwrap();
        assert_eq!(received.speed, 10.0);
    }

    #[tokio::test]
    async fn drops_fixes_without_permission() {
        let feed = LocationFeed::new(AuthorizationStatus::Denied);
        let _sub = feed.subscribe();
        assert_eq!(feed.publish(fix(10.0)), 0);

        feed.set_authorization(AuthorizationStatus::Restricted);
        assert_eq!(feed.publish(fix(10.0)), 0);
    }

    #[test]
    fn dropping_subscription_releases_receiver() {
        let feed = LocationFeed::new(AuthorizationStatus::Granted);
        let sub = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);
        drop(sub);
        assert_eq!(feed.subscriber_count(), 0);
        assert_eq!(feed.publish(fix(10.0)), 0);
    }

    #[tokio::test]
    async fn permission_prompt_only_when_undetermined() {
        let feed = LocationFeed::new(AuthorizationStatus::NotDetermined);
        assert!(feed.request_permission());
        // the stored permit resolves immediately
        feed.permission_requested().await;

        feed.set_authorization(AuthorizationStatus::Granted);
        assert!(!feed.request_permission());
        assert_eq!(feed.authorization(), AuthorizationStatus::Granted);
    }

    #[tokio::test]
    async fn subscription_ends_when_feed_dropped() {
        let feed = LocationFeed::new(AuthorizationStatus::Granted);
        let mut sub = feed.subscribe();
        drop(feed);
        assert!(sub.recv().await.is_none());
    }
}
