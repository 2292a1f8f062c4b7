use super::identity::MemberIdentity;
use crate::util::errors::{IdentityError, Result};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;

impl MemberIdentity {
    /// Total order used for coordinator tie-breaks and stale-identity
    /// detection.
    ///
    /// Tiers, first difference wins:
    /// 1. address octets, unsigned, index by index
    /// 2. membership port
    /// 3. view id when both sides have one, else process id when both are
    ///    non-zero
    ///
    /// The third tier separates a restarted process from the dead one whose
    /// address:port it reused before the old entry left the view.
    ///
    /// Addresses of different lengths are compared only over the receiver's
    /// octets: a longer receiver whose prefix matches is `Greater`, while a
    /// shorter receiver falls through to the port tier. This makes IPv4 vs
    /// IPv6 comparisons asymmetric and is kept as is because election order
    /// depends on it.
    ///
    /// Equality is transitive only among members using the same third-tier
    /// key: all admitted to a view, or all unadmitted with known process ids.
    ///
    /// Fails with `InvalidState` if either side has no address.
    pub fn compare(&self, other: &MemberIdentity) -> Result<Ordering> {
        if std::ptr::eq(self, other) {
            return Ok(Ordering::Equal);
        }

        let mine = self.require_address()?;
        let his = other.require_address()?;

        let by_address = compare_address_octets(&octets(&mine), &octets(&his));
        if by_address != Ordering::Equal {
            return Ok(by_address);
        }

        let by_port = self.membership_port.cmp(&other.membership_port);
        if by_port != Ordering::Equal {
            return Ok(by_port);
        }

        let result = if self.view_id >= 0 && other.view_id >= 0 {
            self.view_id.cmp(&other.view_id)
        } else if self.process_id != 0 && other.process_id != 0 {
            self.process_id.cmp(&other.process_id)
        } else {
            Ordering::Equal
        };

        Ok(result)
    }

    /// Hash over membership port and address only.
    ///
    /// Stable across processes. Two identities on the same address:port with
    /// different view ids share a hash but may compare unequal; a hash match
    /// never implies equality.
    pub fn hash_code(&self) -> u32 {
        let port = u32::from(self.membership_port);
        match self.address {
            None => port,
            Some(IpAddr::V4(v4)) => port.wrapping_add(u32::from(v4)),
            // Only the leading four octets: an IPv4 member equal to this one
            // under `compare` must land in the same bucket.
            Some(IpAddr::V6(v6)) => {
                let octets = v6.octets();
                let prefix = u32::from_be_bytes([octets[0], octets[1], octets[2], octets[3]]);
                port.wrapping_add(prefix)
            }
        }
    }

    fn require_address(&self) -> Result<IpAddr> {
        self.address.ok_or_else(|| {
            IdentityError::InvalidState(format!(
                "member on port {} has no address and cannot be ordered",
                self.membership_port
            ))
        })
    }
}

fn octets(address: &IpAddr) -> Vec<u8> {
    match address {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}

fn compare_address_octets(mine: &[u8], his: &[u8]) -> Ordering {
    for (idx, my_byte) in mine.iter().enumerate() {
        let Some(his_byte) = his.get(idx) else {
            return Ordering::Greater;
        };
        match my_byte.cmp(his_byte) {
            Ordering::Equal => continue,
            decided => return decided,
        }
    }
    Ordering::Equal
}

/// Equal iff [`MemberIdentity::compare`] yields `Equal`. Identities without
/// an address are equal only to themselves.
impl PartialEq for MemberIdentity {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.compare(other), Ok(Ordering::Equal))
    }
}

impl Eq for MemberIdentity {}

/// `None` when either side has no address.
impl PartialOrd for MemberIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other).ok()
    }
}

impl Hash for MemberIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn member(a: u8, b: u8, c: u8, d: u8, port: u16) -> MemberIdentity {
        MemberIdentity::new(IpAddr::V4(Ipv4Addr::new(a, b, c, d)), port)
    }

    fn hash_of(identity: &MemberIdentity) -> u64 {
        let mut hasher = DefaultHasher::new();
        identity.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_earlier_view_id_sorts_first() {
        let mut x = member(10, 0, 0, 1, 5000);
        x.set_view_id(3);
        let mut y = member(10, 0, 0, 1, 5000);
        y.set_view_id(7);

        assert_eq!(x.compare(&y).unwrap(), Ordering::Less);
        assert_eq!(y.compare(&x).unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_process_id_breaks_tie_without_view_ids() {
        let mut x = member(10, 0, 0, 1, 5000);
        x.set_process_id(100);
        let mut y = member(10, 0, 0, 1, 5000);
        y.set_process_id(200);

        assert_eq!(x.compare(&y).unwrap(), Ordering::Less);
        assert_ne!(x, y);
    }

    #[test]
    fn test_view_id_takes_precedence_over_process_id() {
        let mut x = member(10, 0, 0, 1, 5000);
        x.set_view_id(9);
        x.set_process_id(1);
        let mut y = member(10, 0, 0, 1, 5000);
        y.set_view_id(2);
        y.set_process_id(999);

        assert_eq!(x.compare(&y).unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_one_sided_view_id_falls_back_to_process_id() {
        let mut x = member(10, 0, 0, 1, 5000);
        x.set_view_id(4);
        x.set_process_id(300);
        let mut y = member(10, 0, 0, 1, 5000);
        y.set_process_id(200);

        assert_eq!(x.compare(&y).unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_no_usable_tie_breaker_is_equal() {
        let mut x = member(10, 0, 0, 1, 5000);
        x.set_process_id(100);
        let y = member(10, 0, 0, 1, 5000);

        assert_eq!(x.compare(&y).unwrap(), Ordering::Equal);
        assert_eq!(x, y);
    }

    #[test]
    fn test_address_dominates_port() {
        let x = member(10, 0, 0, 1, 5000);
        let y = member(10, 0, 0, 2, 4000);

        assert_eq!(x.compare(&y).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_address_bytes_are_unsigned() {
        let low = member(10, 0, 0, 127, 5000);
        let high = member(10, 0, 0, 200, 5000);

        assert_eq!(low.compare(&high).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_port_breaks_address_tie() {
        let x = member(10, 0, 0, 1, 4000);
        let y = member(10, 0, 0, 1, 5000);

        assert_eq!(x.compare(&y).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_logical_id_is_ignored() {
        let mut x = member(10, 0, 0, 1, 5000);
        x.set_logical_id_halves(1, 1);
        let mut y = member(10, 0, 0, 1, 5000);
        y.set_logical_id_halves(9, 9);

        assert_eq!(x, y);
    }

    #[test]
    fn test_mixed_address_families_compare_asymmetrically() {
        // 10.0.0.1 vs 0a00:0001:: share their first four octets
        let v4 = member(10, 0, 0, 1, 5000);
        let v6 = MemberIdentity::new(
            IpAddr::V6(Ipv6Addr::new(0x0a00, 0x0001, 0, 0, 0, 0, 0, 0)),
            5000,
        );

        assert_eq!(v6.compare(&v4).unwrap(), Ordering::Greater);
        assert_eq!(v4.compare(&v6).unwrap(), Ordering::Equal);

        let v4_higher_port = member(10, 0, 0, 1, 6000);
        assert_eq!(v4_higher_port.compare(&v6).unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_missing_address_is_invalid_state() {
        let unaddressed = MemberIdentity::unaddressed();
        let x = member(10, 0, 0, 1, 5000);

        assert!(matches!(
            x.compare(&unaddressed),
            Err(IdentityError::InvalidState(_))
        ));
        assert!(matches!(
            unaddressed.compare(&x),
            Err(IdentityError::InvalidState(_))
        ));
        assert_eq!(x.partial_cmp(&unaddressed), None);
        assert_ne!(x, unaddressed);
    }

    #[test]
    #[allow(clippy::eq_op)]
    fn test_unaddressed_identity_equals_itself() {
        let unaddressed = MemberIdentity::unaddressed();
        assert_eq!(unaddressed.compare(&unaddressed).unwrap(), Ordering::Equal);
        assert_eq!(unaddressed, unaddressed);
    }

    #[test]
    fn test_hash_ignores_view_id() {
        let mut x = member(10, 0, 0, 1, 5000);
        x.set_view_id(1);
        let mut y = member(10, 0, 0, 1, 5000);
        y.set_view_id(2);

        assert_eq!(hash_of(&x), hash_of(&y));
        assert_ne!(x, y);
        assert_eq!(hash_of(&x), hash_of(&x));
    }

    #[test]
    fn test_mixed_family_equal_members_share_hash() {
        let v4 = member(10, 0, 0, 1, 5000);
        let v6 = MemberIdentity::new(
            IpAddr::V6(Ipv6Addr::new(0x0a00, 0x0001, 0, 0, 0, 0, 0, 1)),
            5000,
        );

        assert_eq!(v4, v6);
        assert_eq!(v4.hash_code(), v6.hash_code());
        assert_eq!(hash_of(&v4), hash_of(&v6));

        let mut set = HashSet::new();
        set.insert(v4);
        assert!(set.contains(&v6));
    }

    #[test]
    fn test_hash_without_address_is_port() {
        let mut unaddressed = MemberIdentity::unaddressed();
        unaddressed.set_membership_port(4242);
        assert_eq!(unaddressed.hash_code(), 4242);
    }

    #[test]
    fn test_hash_set_keeps_restarted_member_separate() {
        let mut old = member(10, 0, 0, 1, 5000);
        old.set_view_id(1);
        let mut restarted = member(10, 0, 0, 1, 5000);
        restarted.set_view_id(5);

        let mut set = HashSet::new();
        set.insert(old.clone());
        set.insert(restarted);
        set.insert(old);

        assert_eq!(set.len(), 2);
    }
}
