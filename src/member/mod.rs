pub mod display;
pub mod identity;
pub mod kind;
pub mod ordering;

pub use identity::{MemberAttributes, MemberIdentity};
pub use kind::MemberKind;
