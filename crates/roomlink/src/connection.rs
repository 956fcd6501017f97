use crate::{ClientMessage, LiveEvent, Result};

use std::fmt;
use std::time::{Duration, Instant};

use ewebsock::{Options, WsEvent, WsMessage, WsReceiver, WsSender};
use tracing::{debug, error, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connected,
    Connecting,
    Disconnected,
}

/// The seam between the room session and the socket it talks over.
pub trait LiveTransport {
    fn send(&mut self, msg: &ClientMessage);

    /// Non-blocking; returns the next inbound event in arrival order.
    fn try_recv(&mut self) -> Option<LiveEvent>;

    /// Reconnect dropped links once their backoff has elapsed.
    fn keepalive(&mut self, now: Instant);

    fn status(&self) -> LinkStatus;
}

/// Derive the `/live` socket url from the http url the viewer was served from.
pub fn live_url(server: &str) -> Result<String> {
    let mut url = Url::parse(server)?;
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme)
        .map_err(|_| crate::Error::InvalidUrl(server.to_owned()))?;
    url.set_path("/live");
    url.set_query(None);
    Ok(url.to_string())
}

/// Exponential reconnect schedule.
#[derive(Debug, Clone)]
pub struct Backoff {
    pub last_attempt: Instant,
    pub retry_after: Duration,
}

impl Backoff {
    pub const INITIAL: Duration = Duration::from_secs(1);
    pub const MAX: Duration = Duration::from_secs(30);

    pub fn new(now: Instant) -> Self {
        Self {
            last_attempt: now,
            retry_after: Self::INITIAL,
        }
    }

    pub fn ready(&self, now: Instant) -> bool {
        now >= self.last_attempt + self.retry_after
    }

    /// Record an attempt and grow the delay for the next one.
    pub fn bump(&mut self, now: Instant) {
        self.last_attempt = now;
        let next = Duration::from_millis(((self.retry_after.as_millis() as f64) * 1.5) as u64);
        debug!(
            "bumping reconnect duration from {:?} to {:?}",
            self.retry_after, next
        );
        self.retry_after = next.min(Self::MAX);
    }

    pub fn reset(&mut self) {
        self.retry_after = Self::INITIAL;
    }
}

pub struct LiveConnection {
    pub url: String,
    pub status: LinkStatus,
    sender: WsSender,
    receiver: WsReceiver,
    backoff: Backoff,
}

impl fmt::Debug for LiveConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveConnection")
            .field("url", &self.url)
            .field("status", &self.status)
            .finish()
    }
}

impl LiveConnection {
    pub fn new(url: String) -> Result<Self> {
        let (sender, receiver) = ewebsock::connect(&url, Options::default())?;

        Ok(Self {
            url,
            status: LinkStatus::Connecting,
            sender,
            receiver,
            backoff: Backoff::new(Instant::now()),
        })
    }

    pub fn connect(&mut self) -> Result<()> {
        let (sender, receiver) = ewebsock::connect(&self.url, Options::default())?;
        self.status = LinkStatus::Connecting;
        self.sender = sender;
        self.receiver = receiver;
        Ok(())
    }
}

impl LiveTransport for LiveConnection {
    fn send(&mut self, msg: &ClientMessage) {
        if self.status != LinkStatus::Connected {
            return;
        }

        let json = match msg.to_json() {
            Ok(json) => json,
            Err(e) => {
                error!("error serializing live message: {e}");
                return;
            }
        };

        self.sender.send(WsMessage::Text(json));
    }

    fn try_recv(&mut self) -> Option<LiveEvent> {
        loop {
            let event = self.receiver.try_recv()?;
            match &event {
                WsEvent::Opened => {
                    self.status = LinkStatus::Connected;
                    self.backoff.reset();
                }
                WsEvent::Closed => {
                    warn!("live connection to {} closed", self.url);
                    self.status = LinkStatus::Disconnected;
                }
                WsEvent::Error(err) => {
                    error!("live connection error: {err}");
                    self.status = LinkStatus::Disconnected;
                }
                WsEvent::Message(WsMessage::Ping(bs)) => {
                    self.sender.send(WsMessage::Pong(bs.to_owned()));
                    continue;
                }
                WsEvent::Message(WsMessage::Pong(_)) => continue,
                WsEvent::Message(_) => {}
            }
            return Some(event.into());
        }
    }

    fn keepalive(&mut self, now: Instant) {
        if self.status != LinkStatus::Disconnected || !self.backoff.ready(now) {
            return;
        }

        self.backoff.bump(now);
        debug!("reconnecting to {}", self.url);
        if let Err(err) = self.connect() {
            error!("error reconnecting to {}: {}", self.url, err);
        }
    }

    fn status(&self) -> LinkStatus {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_url_swaps_scheme_and_path() {
        assert_eq!(
            live_url("http://localhost:8080").unwrap(),
            "ws://localhost:8080/live"
        );
        assert_eq!(
            live_url("https://example.com/viewer/?x=1").unwrap(),
            "wss://example.com/live"
        );
        assert!(live_url("not a url").is_err());
    }

    #[test]
    fn backoff_grows_and_caps() {
        let start = Instant::now();
        let mut backoff = Backoff::new(start);

        assert!(!backoff.ready(start));
        assert!(backoff.ready(start + Duration::from_secs(1)));

        backoff.bump(start);
        assert_eq!(backoff.retry_after, Duration::from_millis(1500));

        for _ in 0..20 {
            backoff.bump(start);
        }
        assert_eq!(backoff.retry_after, Backoff::MAX);

        backoff.reset();
        assert_eq!(backoff.retry_after, Backoff::INITIAL);
    }
}
