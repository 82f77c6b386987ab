//! Validator Registry
//!
//! Authoritative lifecycle state machine for the strategy's validators,
//! keyed by the SHA-256 hash of each validator's BLS public key.
//!
//! Only four (state, operation) pairs are legal:
//!
//! | From          | Operation          | To            |
//! |---------------|--------------------|---------------|
//! | NonRegistered | `register`         | Registered    |
//! | Registered    | `stake`            | Staked        |
//! | Staked        | `initiate_exit`    | Exiting       |
//! | Exiting       | `complete_removal` | ExitComplete  |
//!
//! Records are never deleted, so a removed public key can not be reused.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use stratos_common::{
    errors::{StratosError, StratosResult},
    events::{EventLog, StratosEvent},
    types::{PubkeyHash, ValidatorState},
    validation::require_pubkey,
};

/// Hash a validator public key to its storage identifier
pub fn hash_pubkey(pubkey: &[u8]) -> PubkeyHash {
    Sha256::digest(pubkey).into()
}

/// Registry operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Register,
    Stake,
    InitiateExit,
    CompleteRemoval,
}

/// Validator lifecycle registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ValidatorRegistry {
    states: BTreeMap<PubkeyHash, ValidatorState>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a public key (`NonRegistered` if never seen)
    pub fn state_of(&self, pubkey: &[u8]) -> ValidatorState {
        self.state_of_hash(&hash_pubkey(pubkey))
    }

    /// Current state of a public key hash
    pub fn state_of_hash(&self, pubkey_hash: &PubkeyHash) -> ValidatorState {
        self.states.get(pubkey_hash).copied().unwrap_or_default()
    }

    /// Number of validators currently in `state`
    pub fn count_in(&self, state: ValidatorState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }

    /// Number of validators that received a deposit at some point
    ///
    /// Exiting and ExitComplete validators still count: their stake unit only
    /// leaves the books when reconcile recognises the full withdrawal sweep,
    /// so this matches the active validator counter between reconciles.
    pub fn deposited_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| **s >= ValidatorState::Staked)
            .count()
    }

    /// Number of known validators, any state
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// NonRegistered -> Registered
    pub fn register(&mut self, pubkey: &[u8], block_height: u64, events: &mut EventLog) -> StratosResult<PubkeyHash> {
        self.transition(pubkey, Transition::Register, block_height, events)
    }

    /// Registered -> Staked
    ///
    /// The caller owns the active validator counter and increments it.
    pub fn stake(&mut self, pubkey: &[u8], block_height: u64, events: &mut EventLog) -> StratosResult<PubkeyHash> {
        self.transition(pubkey, Transition::Stake, block_height, events)
    }

    /// Staked -> Exiting
    pub fn initiate_exit(&mut self, pubkey: &[u8], block_height: u64, events: &mut EventLog) -> StratosResult<PubkeyHash> {
        self.transition(pubkey, Transition::InitiateExit, block_height, events)
    }

    /// Exiting -> ExitComplete
    pub fn complete_removal(&mut self, pubkey: &[u8], block_height: u64, events: &mut EventLog) -> StratosResult<PubkeyHash> {
        self.transition(pubkey, Transition::CompleteRemoval, block_height, events)
    }

    /// Registered -> Staked for a key already checked by [`Self::ensure_stakeable`]
    pub(crate) fn mark_staked(&mut self, pubkey_hash: PubkeyHash, block_height: u64, events: &mut EventLog) {
        self.record(pubkey_hash, ValidatorState::Staked, block_height, events);
    }

    /// Check that `pubkey` could be staked right now, without mutating
    pub fn ensure_stakeable(&self, pubkey: &[u8]) -> StratosResult<PubkeyHash> {
        require_pubkey(pubkey)?;
        let pubkey_hash = hash_pubkey(pubkey);
        Self::next_state(self.state_of_hash(&pubkey_hash), Transition::Stake, pubkey_hash)?;
        Ok(pubkey_hash)
    }

    fn next_state(current: ValidatorState, op: Transition, pubkey_hash: PubkeyHash) -> StratosResult<ValidatorState> {
        match (current, op) {
            (ValidatorState::NonRegistered, Transition::Register) => Ok(ValidatorState::Registered),
            (ValidatorState::Registered, Transition::Stake) => Ok(ValidatorState::Staked),
            (ValidatorState::Staked, Transition::InitiateExit) => Ok(ValidatorState::Exiting),
            (ValidatorState::Exiting, Transition::CompleteRemoval) => Ok(ValidatorState::ExitComplete),
            (_, Transition::Register) => Err(StratosError::AlreadyRegistered { pubkey_hash }),
            (_, Transition::Stake) => Err(StratosError::NotRegistered { pubkey_hash }),
            (_, Transition::InitiateExit) => Err(StratosError::NotStaked { pubkey_hash }),
            (_, Transition::CompleteRemoval) => Err(StratosError::NotExiting { pubkey_hash }),
        }
    }

    fn transition(
        &mut self,
        pubkey: &[u8],
        op: Transition,
        block_height: u64,
        events: &mut EventLog,
    ) -> StratosResult<PubkeyHash> {
        require_pubkey(pubkey)?;
        let pubkey_hash = hash_pubkey(pubkey);
        let next = Self::next_state(self.state_of_hash(&pubkey_hash), op, pubkey_hash)?;
        self.record(pubkey_hash, next, block_height, events);
        Ok(pubkey_hash)
    }

    fn record(&mut self, pubkey_hash: PubkeyHash, next: ValidatorState, block_height: u64, events: &mut EventLog) {
        self.states.insert(pubkey_hash, next);

        tracing::debug!(state = ?next, block = block_height, "validator state changed");
        events.emit(StratosEvent::ValidatorStateChanged {
            pubkey_hash,
            state: next,
            block_height,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pubkey(seed: u8) -> Vec<u8> {
        vec![seed; 48]
    }

    #[test]
    fn test_full_lifecycle() {
        let mut registry = ValidatorRegistry::new();
        let mut events = EventLog::new();
        let key = pubkey(1);

        registry.register(&key, 1, &mut events).unwrap();
        assert_eq!(registry.state_of(&key), ValidatorState::Registered);

        registry.stake(&key, 2, &mut events).unwrap();
        assert_eq!(registry.state_of(&key), ValidatorState::Staked);

        registry.initiate_exit(&key, 3, &mut events).unwrap();
        assert_eq!(registry.state_of(&key), ValidatorState::Exiting);

        let hash = registry.complete_removal(&key, 4, &mut events).unwrap();
        assert_eq!(registry.state_of_hash(&hash), ValidatorState::ExitComplete);

        assert_eq!(events.len(), 4);
        assert_eq!(
            events.last(),
            Some(&StratosEvent::ValidatorStateChanged {
                pubkey_hash: hash,
                state: ValidatorState::ExitComplete,
                block_height: 4,
            })
        );
    }

    #[test]
    fn test_double_register_fails() {
        let mut registry = ValidatorRegistry::new();
        let mut events = EventLog::new();
        let key = pubkey(2);

        registry.register(&key, 1, &mut events).unwrap();
        assert_eq!(
            registry.register(&key, 2, &mut events),
            Err(StratosError::AlreadyRegistered { pubkey_hash: hash_pubkey(&key) })
        );
    }

    #[test]
    fn test_removed_key_cannot_be_reused() {
        let mut registry = ValidatorRegistry::new();
        let mut events = EventLog::new();
        let key = pubkey(3);

        registry.register(&key, 1, &mut events).unwrap();
        registry.stake(&key, 1, &mut events).unwrap();
        registry.initiate_exit(&key, 1, &mut events).unwrap();
        registry.complete_removal(&key, 1, &mut events).unwrap();

        assert!(matches!(
            registry.register(&key, 2, &mut events),
            Err(StratosError::AlreadyRegistered { .. })
        ));
        assert!(matches!(
            registry.stake(&key, 2, &mut events),
            Err(StratosError::NotRegistered { .. })
        ));
        assert_eq!(registry.state_of(&key), ValidatorState::ExitComplete);
    }

    #[test]
    fn test_out_of_order_transitions() {
        let mut registry = ValidatorRegistry::new();
        let mut events = EventLog::new();
        let key = pubkey(4);

        assert!(matches!(registry.stake(&key, 1, &mut events), Err(StratosError::NotRegistered { .. })));
        assert!(matches!(registry.initiate_exit(&key, 1, &mut events), Err(StratosError::NotStaked { .. })));
        assert!(matches!(registry.complete_removal(&key, 1, &mut events), Err(StratosError::NotExiting { .. })));

        registry.register(&key, 1, &mut events).unwrap();
        assert!(matches!(registry.complete_removal(&key, 1, &mut events), Err(StratosError::NotExiting { .. })));

        // Failed transitions leave no trace
        assert_eq!(events.len(), 1);
        assert_eq!(registry.state_of(&key), ValidatorState::Registered);
    }

    #[test]
    fn test_invalid_pubkey_length() {
        let mut registry = ValidatorRegistry::new();
        let mut events = EventLog::new();

        assert!(matches!(
            registry.register(&[1u8; 32], 1, &mut events),
            Err(StratosError::InvalidInput { param: "pubkey", .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_counts() {
        let mut registry = ValidatorRegistry::new();
        let mut events = EventLog::new();

        for seed in 0..4u8 {
            registry.register(&pubkey(seed), 1, &mut events).unwrap();
        }
        registry.stake(&pubkey(0), 2, &mut events).unwrap();
        registry.stake(&pubkey(1), 2, &mut events).unwrap();
        registry.initiate_exit(&pubkey(1), 3, &mut events).unwrap();

        assert_eq!(registry.count_in(ValidatorState::Registered), 2);
        assert_eq!(registry.count_in(ValidatorState::Staked), 1);
        assert_eq!(registry.deposited_count(), 2);
        assert_eq!(registry.len(), 4);
    }
}
