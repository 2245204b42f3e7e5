//! Network reachability signal.
//!
//! The monitor holds the last value reported by the platform and turns
//! reports into edge events: reporting the value it already holds produces
//! no transition.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use url::Url;

/// An edge in the connectivity signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    BecameOnline,
    BecameOffline,
}

/// Transitions buffered per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 64;

/// Single source of truth for "can we reach the network right now".
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    online: watch::Sender<bool>,
    events: broadcast::Sender<Transition>,
}

impl ConnectivityMonitor {
    /// Create a monitor starting from the platform's current value.
    #[must_use]
    pub fn new(online: bool) -> Self {
        let (online, _) = watch::channel(online);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { online, events }
    }

    /// Last reported reachability.
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    /// Feed a platform reachability report.
    ///
    /// Returns the transition it caused, if any. Every transition is also
    /// published to subscribers, in the order the reports were applied.
    pub fn report(&self, online: bool) -> Option<Transition> {
        let mut transition = None;
        self.online.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            let edge = if online {
                Transition::BecameOnline
            } else {
                Transition::BecameOffline
            };
            // Sending fails only when nobody listens.
            self.events.send(edge).ok();
            transition = Some(edge);
            true
        });

        match transition? {
            Transition::BecameOnline => info!("network reachable"),
            Transition::BecameOffline => warn!("network unreachable"),
        }
        transition
    }

    /// Stream of transitions reported after this call.
    #[must_use]
    pub fn subscribe(&self) -> ConnectivityEvents {
        ConnectivityEvents {
            rx: self.events.subscribe(),
        }
    }
}

/// Receiver side of [`ConnectivityMonitor::subscribe`].
#[derive(Debug)]
pub struct ConnectivityEvents {
    rx: broadcast::Receiver<Transition>,
}

impl ConnectivityEvents {
    /// Wait for the next transition.
    ///
    /// Returns `None` once every monitor handle is dropped. A subscriber that
    /// falls more than the buffer behind skips the oldest edges.
    pub async fn next(&mut self) -> Option<Transition> {
        loop {
            match self.rx.recv().await {
                Ok(transition) => return Some(transition),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "connectivity subscriber lagged");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// One-shot reachability check of the host behind `base_url`.
///
/// Stands in for the platform signal where none exists, e.g. on the command
/// line. Any resolution or connect failure counts as offline.
pub async fn probe(base_url: &str, timeout: Duration) -> bool {
    let Some(address) = socket_address(base_url) else {
        warn!(url = base_url, "cannot derive a host to probe");
        return false;
    };

    let reachable = matches!(
        tokio::time::timeout(timeout, TcpStream::connect(address.as_str())).await,
        Ok(Ok(_))
    );
    debug!(%address, reachable, "connectivity probe");
    reachable
}

fn socket_address(base_url: &str) -> Option<String> {
    let url = Url::parse(base_url).ok()?;
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;
    Some(format!("{host}:{port}"))
}
