//! Identity of a process in a membership group: a deterministic total
//! order for coordinator tie-breaks and a versioned binary encoding.

pub mod config;
pub mod member;
pub mod storage;
pub mod util;
pub mod wire;

pub use member::{MemberAttributes, MemberIdentity, MemberKind};
pub use util::errors::{IdentityError, Result};
pub use wire::Version;
