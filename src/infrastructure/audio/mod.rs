//! Recording download adapters

mod http;

pub use http::HttpAudioFetcher;
