use super::identity::MemberIdentity;
use crate::config;

impl MemberIdentity {
    /// Summary line. The full logical id is printed only when
    /// `show_logical_ids` was set in the process-wide config.
    pub fn summary(&self, show_logical_ids: bool) -> String {
        let address = match self.address {
            Some(address) => address.to_string(),
            None => "<unset>".to_string(),
        };
        let logical_id = match self.logical_id() {
            Some(id) if show_logical_ids => format!("logical_id={}", id.hyphenated()),
            Some(_) => "logical id set".to_string(),
            None => "no logical id".to_string(),
        };

        format!(
            "Member[addr={};port={};pid={};name={};{}]",
            address,
            self.membership_port,
            self.process_id,
            self.name.as_deref().unwrap_or("<none>"),
            logical_id
        )
    }
}

impl std::fmt::Display for MemberIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary(config::current().show_logical_ids))
    }
}
