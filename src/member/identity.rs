use super::kind::MemberKind;
use crate::wire::version::Version;
use std::net::IpAddr;
use uuid::Uuid;

/// Per-process attributes that travel with an identity.
///
/// Used to stamp a fresh identity in one call once the local process knows
/// its pid, kind and direct channel port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberAttributes {
    pub direct_port: u16,
    pub process_id: i32,
    pub kind: MemberKind,
    pub view_id: i32,
    pub name: Option<String>,
    pub groups: Vec<String>,
}

impl MemberAttributes {
    /// Placeholder used when no attributes are known yet
    pub const INVALID: MemberAttributes = MemberAttributes {
        direct_port: 0,
        process_id: 0,
        kind: MemberKind::Normal,
        view_id: -1,
        name: None,
        groups: Vec::new(),
    };
}

impl Default for MemberAttributes {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Identity of one process in a membership group.
///
/// Built up field by field during the join handshake, then treated as
/// immutable. No internal locking: publish a fully populated value before
/// sharing it across threads.
///
/// Ordering and equality use only the network tier (address, membership
/// port, view id / process id). The logical id is carried for the transport
/// and never takes part in a comparison.
#[derive(Debug, Clone)]
pub struct MemberIdentity {
    pub(crate) address: Option<IpAddr>,
    pub(crate) membership_port: u16,
    pub(crate) direct_port: u16,
    pub(crate) process_id: i32,
    pub(crate) view_id: i32,
    pub(crate) kind: MemberKind,
    pub(crate) weight: u8,
    pub(crate) preferred_coordinator: bool,
    pub(crate) partition_detection: bool,
    pub(crate) version: i16,
    pub(crate) logical_id_high: u64,
    pub(crate) logical_id_low: u64,
    pub(crate) name: Option<String>,
    pub(crate) groups: Vec<String>,
}

impl MemberIdentity {
    /// Identity for a process reachable at `address:membership_port`.
    pub fn new(address: IpAddr, membership_port: u16) -> Self {
        let mut identity = Self::unaddressed();
        identity.address = Some(address);
        identity.membership_port = membership_port;
        identity
    }

    /// Empty identity with no address yet. Must be completed before it is
    /// compared against anything.
    pub fn unaddressed() -> Self {
        Self {
            address: None,
            membership_port: 0,
            direct_port: 0,
            process_id: 0,
            view_id: -1,
            kind: MemberKind::Normal,
            weight: 0,
            preferred_coordinator: false,
            partition_detection: false,
            version: Version::CURRENT.ordinal(),
            logical_id_high: 0,
            logical_id_low: 0,
            name: None,
            groups: Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_attributes(
        attributes: MemberAttributes,
        address: IpAddr,
        membership_port: u16,
        partition_detection: bool,
        preferred_coordinator: bool,
        version: i16,
        logical_id_high: u64,
        logical_id_low: u64,
    ) -> Self {
        let mut identity = Self::new(address, membership_port);
        identity.set_attributes(Some(attributes));
        identity.partition_detection = partition_detection;
        identity.preferred_coordinator = preferred_coordinator;
        identity.version = version;
        identity.logical_id_high = logical_id_high;
        identity.logical_id_low = logical_id_low;
        identity
    }

    /// Copy of another member's identity, used as a starting point for a
    /// different process.
    pub fn from_template(template: &MemberIdentity) -> Self {
        template.clone()
    }

    pub fn attributes(&self) -> MemberAttributes {
        MemberAttributes {
            direct_port: self.direct_port,
            process_id: self.process_id,
            kind: self.kind,
            view_id: self.view_id,
            name: self.name.clone(),
            groups: self.groups.clone(),
        }
    }

    /// Replace the attribute bundle. `None` resets it to [`MemberAttributes::INVALID`].
    pub fn set_attributes(&mut self, attributes: Option<MemberAttributes>) {
        let attributes = attributes.unwrap_or(MemberAttributes::INVALID);
        self.direct_port = attributes.direct_port;
        self.process_id = attributes.process_id;
        self.kind = attributes.kind;
        self.view_id = attributes.view_id;
        self.name = attributes.name;
        self.groups = attributes.groups;
    }

    pub fn address(&self) -> Option<IpAddr> {
        self.address
    }

    pub fn set_address(&mut self, address: IpAddr) {
        self.address = Some(address);
    }

    /// Raw address octets: 4 bytes for IPv4, 16 for IPv6.
    pub fn address_octets(&self) -> Option<Vec<u8>> {
        self.address.map(|address| match address {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        })
    }

    pub fn membership_port(&self) -> u16 {
        self.membership_port
    }

    pub fn set_membership_port(&mut self, port: u16) {
        self.membership_port = port;
    }

    pub fn direct_port(&self) -> u16 {
        self.direct_port
    }

    pub fn set_direct_port(&mut self, port: u16) {
        self.direct_port = port;
    }

    /// OS process id, 0 when unknown
    pub fn process_id(&self) -> i32 {
        self.process_id
    }

    pub fn set_process_id(&mut self, process_id: i32) {
        self.process_id = process_id;
    }

    /// View in which this member was admitted, -1 before admission
    pub fn view_id(&self) -> i32 {
        self.view_id
    }

    pub fn set_view_id(&mut self, view_id: i32) {
        self.view_id = view_id;
    }

    pub fn has_view_id(&self) -> bool {
        self.view_id >= 0
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: MemberKind) {
        self.kind = kind;
    }

    pub fn weight(&self) -> u8 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: u8) {
        self.weight = weight;
    }

    pub fn is_preferred_coordinator(&self) -> bool {
        self.preferred_coordinator
    }

    pub fn set_preferred_coordinator(&mut self, preferred: bool) {
        self.preferred_coordinator = preferred;
    }

    pub fn is_partition_detection_enabled(&self) -> bool {
        self.partition_detection
    }

    pub fn set_partition_detection_enabled(&mut self, enabled: bool) {
        self.partition_detection = enabled;
    }

    pub fn version(&self) -> i16 {
        self.version
    }

    pub fn set_version(&mut self, version: i16) {
        self.version = version;
    }

    pub fn logical_id_halves(&self) -> (u64, u64) {
        (self.logical_id_high, self.logical_id_low)
    }

    pub fn set_logical_id_halves(&mut self, high: u64, low: u64) {
        self.logical_id_high = high;
        self.logical_id_low = low;
    }

    pub fn has_logical_id(&self) -> bool {
        self.logical_id_high != 0 || self.logical_id_low != 0
    }

    /// Logical id as a UUID, `None` when unassigned
    pub fn logical_id(&self) -> Option<Uuid> {
        if self.has_logical_id() {
            Some(Uuid::from_u64_pair(self.logical_id_high, self.logical_id_low))
        } else {
            None
        }
    }

    pub fn set_logical_id(&mut self, id: Uuid) {
        let (high, low) = id.as_u64_pair();
        self.set_logical_id_halves(high, low);
    }

    /// Give this member a fresh random (v4) logical id and return it.
    pub fn assign_random_logical_id(&mut self) -> Uuid {
        let id = uuid::Builder::from_random_bytes(rand::random()).into_uuid();
        self.set_logical_id(id);
        id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn set_groups(&mut self, groups: Vec<String>) {
        self.groups = groups;
    }

    /// True when every carried field, ordering-relevant or not, matches.
    pub fn same_fields(&self, other: &MemberIdentity) -> bool {
        self.address == other.address
            && self.membership_port == other.membership_port
            && self.direct_port == other.direct_port
            && self.process_id == other.process_id
            && self.view_id == other.view_id
            && self.kind == other.kind
            && self.weight == other.weight
            && self.preferred_coordinator == other.preferred_coordinator
            && self.partition_detection == other.partition_detection
            && self.version == other.version
            && self.logical_id_high == other.logical_id_high
            && self.logical_id_low == other.logical_id_low
            && self.name == other.name
            && self.groups == other.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_new_identity_defaults() {
        let identity = MemberIdentity::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 5000);

        assert_eq!(identity.view_id(), -1);
        assert!(!identity.has_view_id());
        assert_eq!(identity.process_id(), 0);
        assert_eq!(identity.version(), Version::CURRENT.ordinal());
        assert!(identity.logical_id().is_none());
        assert_eq!(identity.address_octets(), Some(vec![10, 0, 0, 1]));
    }

    #[test]
    fn test_address_octets_for_ipv6() {
        let identity = MemberIdentity::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 7000);
        let octets = identity.address_octets().unwrap();
        assert_eq!(octets.len(), 16);
        assert_eq!(octets[15], 1);
    }

    #[test]
    fn test_set_attributes_none_resets_to_invalid() {
        let mut identity = MemberIdentity::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 1234);
        identity.set_process_id(77);
        identity.set_name(Some("server-1".to_string()));

        identity.set_attributes(None);

        assert_eq!(identity.attributes(), MemberAttributes::INVALID);
    }

    #[test]
    fn test_with_attributes_copies_everything() {
        let attributes = MemberAttributes {
            direct_port: 40404,
            process_id: 4242,
            kind: MemberKind::Locator,
            view_id: 3,
            name: Some("locator-a".to_string()),
            groups: vec!["east".to_string()],
        };
        let identity = MemberIdentity::with_attributes(
            attributes.clone(),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 9)),
            10334,
            true,
            false,
            Version::V1_1.ordinal(),
            1,
            2,
        );

        assert_eq!(identity.attributes(), attributes);
        assert!(identity.is_partition_detection_enabled());
        assert!(!identity.is_preferred_coordinator());
        assert_eq!(identity.logical_id_halves(), (1, 2));

        let copy = MemberIdentity::from_template(&identity);
        assert!(copy.same_fields(&identity));
    }

    #[test]
    fn test_random_logical_id_is_v4() {
        let mut identity = MemberIdentity::unaddressed();
        let id = identity.assign_random_logical_id();

        assert_eq!(id.get_version_num(), 4);
        assert_eq!(identity.logical_id(), Some(id));
        assert!(identity.has_logical_id());
    }
}
