//! Remote-control bridge to the render collaborator.
//!
//! A raw TCP link carrying concatenated JSON objects. The sequencer only
//! sees a [`BridgeRenderer`]; connection trouble stays inside this module.

pub mod client;
pub mod codec;
pub mod messages;

pub use client::{BridgeClient, BridgeRenderer};
pub use codec::{DEFAULT_MAX_MESSAGE_SIZE, JsonStreamCodec};
pub use messages::{InboundMessage, OutboundMessage};
