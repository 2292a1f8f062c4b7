pub mod errors;

pub use errors::{IdentityError, Result};
