//! # OTA link contracts
//!
//! `ota-link` describes the two collaborators a device-side update agent talks
//! to, without implementing either wire protocol:
//!
//! - **Transport** ([`Transport`]): the publish/subscribe client. The agent only
//!   ever hands it time via [`Transport::yield_events`]; in exchange the
//!   transport reports connection, subscribe and publish results to an
//!   [`EventHandler`] as tagged [`TransportEvent`]s.
//! - **Update channel** ([`UpdateChannel`]): the firmware transfer protocol
//!   running on top of the transport. It reports versions and results, tells
//!   whether a fetch command is pending, and hands out the image in chunks.
//!
//! Every publish returns a [`PacketId`] that later shows up again in a
//! `Publish*` event, which is how callers correlate acknowledgements.
//!
//! The [`loopback`] module provides an in-process stand-in for the management
//! service implementing both traits. It is scripted through [`CloudScript`]
//! and is what the agent binary and the test suites run against.

#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

extern crate alloc;

pub mod channel;
pub mod error;
pub mod event;
pub mod loopback;
pub mod transport;

pub use channel::{InfoKey, InfoValue, MAX_DIGEST_LEN, MAX_VERSION_LEN, UpdateChannel, truncated};
pub use error::{ChannelError, LinkError};
pub use event::{EventHandler, PacketId, TransportEvent};
pub use loopback::{
    AckPolicy, ChunkStep, CloudScript, LoopbackChannel, LoopbackCloud, LoopbackTransport, Report,
    UpdateOffer,
};
pub use transport::{LinkAuth, LinkOptions, Transport};
