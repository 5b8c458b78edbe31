//! HTTP Surface
//!
//! Two listeners share one accept loop: the public API (status page,
//! broadcast and message queries) and the health/metrics listener.

pub mod router;
pub mod server;
pub mod status;
pub mod validation;

pub use router::{stream_records, ApiRouter, HealthRouter, ResponseBody, FAILURE_BODY};
pub use server::serve;
pub use validation::{parse_broadcast, parse_messages_query, BodyKind, BroadcastRequest};
