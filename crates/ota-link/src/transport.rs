//! Publish/subscribe transport contract.

use embassy_time::Duration;

use crate::event::EventHandler;

/// Authentication material handed to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAuth<'a> {
    /// Client certificate and private key file paths
    Certificate { cert_file: &'a str, key_file: &'a str },
    /// Shared device secret
    Secret(&'a str),
}

/// Connection parameters for a transport.
#[derive(Debug, Clone, Copy)]
pub struct LinkOptions<'a> {
    pub product_id: &'a str,
    pub device_id: &'a str,
    pub auth: LinkAuth<'a>,
    /// Upper bound for a single request/response exchange
    pub command_timeout: Duration,
    pub keep_alive: Duration,
    pub auto_reconnect: bool,
}

impl<'a> LinkOptions<'a> {
    pub const fn new(product_id: &'a str, device_id: &'a str, auth: LinkAuth<'a>) -> Self {
        Self {
            product_id,
            device_id,
            auth,
            command_timeout: Duration::from_secs(5),
            keep_alive: Duration::from_secs(240),
            auto_reconnect: true,
        }
    }

    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}

/// Publish/subscribe client as seen by the update agent.
///
/// Connection management, keep-alive and reconnection all happen inside the
/// implementation. The agent only lends it time.
pub trait Transport {
    /// Process pending network work for at most `budget` and report every
    /// event received meanwhile to `handler`.
    async fn yield_events(&mut self, budget: Duration, handler: &mut dyn EventHandler);

    /// Disconnect and release the client. Calling it twice is a no-op.
    fn close(&mut self);
}
