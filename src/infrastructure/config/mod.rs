//! Configuration file stores

mod file;

pub use file::FileConfigStore;
