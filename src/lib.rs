/// Common error types: channel validation, duplicate registrations.
pub mod error;
/// Pub/Sub: Registry, ChannelHandle, DispatchEvent.
pub mod pubsub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Operation errors and result type.
pub use error::{PubSubError, PubSubResult};
/// Pub/Sub API: the global store facade and the core types behind it.
pub use pubsub::{
    channel, destroy_all, global, ChannelHandle, DispatchEvent, DispatchTarget, HandleKind,
    HandleSnapshot, Registry,
};
