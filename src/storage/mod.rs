pub mod identity_storage;

pub use identity_storage::{FileIdentityStorage, IdentityStorage};
