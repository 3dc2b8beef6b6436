//! Route handlers

mod audit;
mod events;
mod health;
mod ingress;
mod proxy;
mod transcribe;

pub use audit::{audit_handler, stats_handler};
pub use events::{latest_event_handler, processed_event_handler};
pub use health::health_handler;
pub use ingress::ingress_handler;
pub use proxy::audio_proxy_handler;
pub use transcribe::transcribe_handler;
