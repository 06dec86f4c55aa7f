// ============ Escrow Registry ============
// Requester -> delegated account. Payouts addressed to a registered requester
// are redirected to its delegate.

use std::collections::BTreeMap;

use au_amm_types::{Address, EscrowEntry};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EscrowRegistry {
    entries: BTreeMap<Address, Address>,
}

impl EscrowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `delegate` for `requester`, returning the delegate it replaced.
    pub fn register(&mut self, requester: Address, delegate: Address) -> Option<Address> {
        self.entries.insert(requester, delegate)
    }

    pub fn delegate_of(&self, requester: &Address) -> Option<Address> {
        self.entries.get(requester).copied()
    }

    /// Where a payout meant for `recipient` should actually go.
    pub fn payout_target(&self, recipient: &Address) -> Address {
        self.delegate_of(recipient).unwrap_or(*recipient)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = EscrowEntry> + '_ {
        self.entries
            .iter()
            .map(|(requester, delegate)| EscrowEntry { requester: *requester, delegate: *delegate })
    }
}

impl FromIterator<EscrowEntry> for EscrowRegistry {
    fn from_iter<I: IntoIterator<Item = EscrowEntry>>(iter: I) -> Self {
        let mut registry = Self::new();
        for entry in iter {
            registry.register(entry.requester, entry.delegate);
        }
        registry
    }
}
