//! Downstream forwarding adapters

mod http;

pub use http::HttpForwarder;
