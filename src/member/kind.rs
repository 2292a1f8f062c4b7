/// Role of the process behind a member identity.
///
/// The integer form is what travels on the wire. Values outside the known
/// table are kept as `Other` so they survive a decode/encode cycle untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Ordinary peer holding data
    Normal,
    /// Locator process that helps members discover the coordinator
    Locator,
    /// Administrative member (tools, consoles)
    Admin,
    /// Process running without joining a group
    Loner,
    Other(i32),
}

impl MemberKind {
    pub const NORMAL: i32 = 10;
    pub const LOCATOR: i32 = 11;
    pub const ADMIN: i32 = 12;
    pub const LONER: i32 = 13;

    pub fn from_i32(value: i32) -> Self {
        match value {
            Self::NORMAL => MemberKind::Normal,
            Self::LOCATOR => MemberKind::Locator,
            Self::ADMIN => MemberKind::Admin,
            Self::LONER => MemberKind::Loner,
            other => MemberKind::Other(other),
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            MemberKind::Normal => Self::NORMAL,
            MemberKind::Locator => Self::LOCATOR,
            MemberKind::Admin => Self::ADMIN,
            MemberKind::Loner => Self::LONER,
            MemberKind::Other(value) => *value,
        }
    }
}

impl Default for MemberKind {
    fn default() -> Self {
        MemberKind::Normal
    }
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberKind::Normal => write!(f, "normal"),
            MemberKind::Locator => write!(f, "locator"),
            MemberKind::Admin => write!(f, "admin"),
            MemberKind::Loner => write!(f, "loner"),
            MemberKind::Other(value) => write!(f, "kind({})", value),
        }
    }
}
