//! Event normalization.
//!
//! Converts heterogeneous wire shapes — live socket frames, push message
//! bodies, REST poll results — into the canonical record types. No other
//! component sees raw wire shapes.

mod normalizer;
mod push;

pub use normalizer::{NormalizedEvent, normalize, normalize_with_hint};
pub use push::{PushPayload, parse_push_body};
