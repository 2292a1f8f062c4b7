pub mod config;

pub use config::{current, init, IdentityConfig, DEFAULT_MAX_ARRAY_LEN, SHOW_LOGICAL_IDS_ENV};
