//! Wire messages exchanged with the map UI.
//!
//! Both directions are closed tagged unions keyed by a `type` field with
//! camelCase payloads. Inbound messages are parsed and validated once, at
//! the boundary, by [`InboundMessage::parse`].

mod inbound;
mod outbound;

pub use inbound::{
    AbortRequest, AreaRequest, CleanupRequest, ConfigRequest, InboundMessage, MessageError,
    DEFAULT_PRIORITY, PROTOCOL_VERSION,
};
pub use outbound::{ErrorReport, LoadingStatus, OutboundMessage, PhotosUpdate};
