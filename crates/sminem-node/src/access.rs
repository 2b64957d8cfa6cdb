//! Capability and receiver checks injected into the [`Ecosystem`](crate::Ecosystem).

use std::collections::BTreeSet;

use sminem_core::address::Address;
use sminem_core::traits::{AccessControl, ReceiverCheck};

/// Single-owner administration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerAccess {
    owner: Address,
}

impl OwnerAccess {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }
}

impl AccessControl for OwnerAccess {
    fn is_admin(&self, caller: &Address) -> bool {
        !caller.is_zero() && *caller == self.owner
    }
}

/// Receivers known to lack the NFT acceptance hook.
///
/// Every address not listed is treated as a plain account and accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectList {
    rejecting: BTreeSet<Address>,
}

impl RejectList {
    pub fn new(rejecting: impl IntoIterator<Item = Address>) -> Self {
        Self {
            rejecting: rejecting.into_iter().collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.rejecting.iter()
    }
}

impl ReceiverCheck for RejectList {
    fn accepts(&self, receiver: &Address) -> bool {
        !self.rejecting.contains(receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_owner_is_admin() {
        let owner = Address::from_label("owner");
        let access = OwnerAccess::new(owner);
        assert!(access.is_admin(&owner));
        assert!(!access.is_admin(&Address::from_label("account1")));
    }

    #[test]
    fn zero_owner_admits_nobody() {
        let access = OwnerAccess::new(Address::ZERO);
        assert!(!access.is_admin(&Address::ZERO));
    }

    #[test]
    fn reject_list_filters_contracts() {
        let contract = Address::from_label("contract");
        let list = RejectList::new([contract]);
        assert!(!list.accepts(&contract));
        assert!(list.accepts(&Address::from_label("alice")));
        assert_eq!(list.iter().count(), 1);
    }
}
