//! Sink registry instantiations

mod peer;
mod stream;

pub use peer::PeerRegistry;
pub use stream::{StreamRegistry, StreamSender, STREAM_SINK_ID};
