//! HTTP delivery surface: router, state, handlers and middleware

pub mod handlers;
pub mod request_id;
pub mod router;
pub mod state;

pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
pub use router::create_router;
pub use state::{proxy_allow_set, AppState};
