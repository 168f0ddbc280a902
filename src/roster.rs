use std::collections::BTreeMap;

use crate::types::{ClientId, Role};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    Assigned,
    Taken,
}

/// Connection-to-role mapping. A role has at most one holder and a
/// connection holds at most one role.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roster {
    by_client: BTreeMap<ClientId, Role>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// First claim wins. Claiming a free role releases whatever the client held before.
    pub fn claim(&mut self, client_id: &str, role: Role) -> ClaimOutcome {
        match self.holder_of(role) {
            Some(holder) if holder != client_id => ClaimOutcome::Taken,
            _ => {
                self.by_client.insert(client_id.to_string(), role);
                ClaimOutcome::Assigned
            }
        }
    }

    pub fn release(&mut self, client_id: &str) -> Option<Role> {
        self.by_client.remove(client_id)
    }

    pub fn role_of(&self, client_id: &str) -> Option<Role> {
        self.by_client.get(client_id).copied()
    }

    pub fn holder_of(&self, role: Role) -> Option<&str> {
        self.by_client
            .iter()
            .find(|(_, held)| **held == role)
            .map(|(client_id, _)| client_id.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_client.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_client.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_claim_wins() {
        let mut roster = Roster::new();
        assert_eq!(roster.claim("a", Role::Runner), ClaimOutcome::Assigned);
        assert_eq!(roster.claim("b", Role::Runner), ClaimOutcome::Taken);
        assert_eq!(roster.holder_of(Role::Runner), Some("a"));
        assert_eq!(roster.role_of("b"), None);
    }

    #[test]
    fn reclaiming_own_role_is_assigned_again() {
        let mut roster = Roster::new();
        roster.claim("a", Role::Admin);
        assert_eq!(roster.claim("a", Role::Admin), ClaimOutcome::Assigned);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn claiming_new_role_frees_the_old_one() {
        let mut roster = Roster::new();
        roster.claim("a", Role::Runner);
        assert_eq!(roster.claim("a", Role::Chaser), ClaimOutcome::Assigned);
        assert_eq!(roster.holder_of(Role::Runner), None);
        assert_eq!(roster.claim("b", Role::Runner), ClaimOutcome::Assigned);
    }

    #[test]
    fn release_vacates_the_role() {
        let mut roster = Roster::new();
        roster.claim("a", Role::Spectator(2));
        assert_eq!(roster.release("a"), Some(Role::Spectator(2)));
        assert_eq!(roster.release("a"), None);
        assert!(roster.is_empty());
        assert_eq!(roster.claim("b", Role::Spectator(2)), ClaimOutcome::Assigned);
    }
}
