//! Strategy Events
//!
//! Events are emitted during strategy execution and can be indexed
//! off-chain for monitoring and alerting. They describe what happened; no
//! behaviour depends on them.

use crate::emergency::PauseCause;
use crate::types::{AccountingClassification, Address, PubkeyHash, ValidatorState};
use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Validator Events (0x01 - 0x1F)
    ValidatorStateChanged = 0x01,
    EthStaked = 0x02,
    StakeEthTallyReset = 0x03,
    StakeEthThresholdChanged = 0x04,

    // Accounting Events (0x20 - 0x3F)
    AccountingOutcome = 0x20,
    FuseIntervalUpdated = 0x21,
    AccountingManuallyFixed = 0x22,
    RewardsCollected = 0x23,

    // Funds Events (0x40 - 0x5F)
    Deposit = 0x40,
    Withdrawal = 0x41,

    // Liquidity Events (0x60 - 0x7F)
    LiquidityAdded = 0x60,
    LiquidityRemoved = 0x61,
    OTokensMinted = 0x62,
    OTokensBurned = 0x63,

    // Protocol Events (0x80 - 0x9F)
    StrategyPaused = 0x80,
    StrategyUnpaused = 0x81,
}

/// Main event enum containing all strategy events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum StratosEvent {
    // ============ Validator Events ============

    /// Emitted on every validator lifecycle transition
    ValidatorStateChanged {
        pubkey_hash: PubkeyHash,
        state: ValidatorState,
        block_height: u64,
    },

    /// Emitted when a stake unit is sent to the deposit contract
    EthStaked {
        pubkey_hash: PubkeyHash,
        amount: u128,
        block_height: u64,
    },

    /// Emitted when the staking monitor resets the staked tally
    StakeEthTallyReset {
        block_height: u64,
    },

    /// Emitted when governance changes the staking threshold
    StakeEthThresholdChanged {
        threshold: u128,
        block_height: u64,
    },

    // ============ Accounting Events ============

    /// Emitted after every reconciliation
    AccountingOutcome {
        classification: AccountingClassification,
        withdrawn_validators: u64,
        eth_to_vault: u128,
        active_validators: u64,
        consensus_rewards: u128,
        block_height: u64,
    },

    /// Emitted when the fuse window changes
    FuseIntervalUpdated {
        start: u128,
        end: u128,
        block_height: u64,
    },

    /// Emitted when a manual fix is applied
    AccountingManuallyFixed {
        validators_delta: i32,
        consensus_rewards_delta: i128,
        eth_to_vault: u128,
        block_height: u64,
    },

    /// Emitted when accrued consensus rewards are harvested
    RewardsCollected {
        recipient: Address,
        amount: u128,
        block_height: u64,
    },

    // ============ Funds Events ============

    /// Emitted when the vault deposits collateral
    Deposit {
        amount: u128,
        block_height: u64,
    },

    /// Emitted when collateral is returned
    Withdrawal {
        recipient: Address,
        amount: u128,
        block_height: u64,
    },

    // ============ Liquidity Events ============

    /// Emitted when liquidity is added to the pool
    LiquidityAdded {
        collateral: u128,
        otoken: u128,
        lp_minted: u128,
        block_height: u64,
    },

    /// Emitted when liquidity is removed from the pool
    LiquidityRemoved {
        collateral: u128,
        otoken: u128,
        lp_burned: u128,
        block_height: u64,
    },

    /// Emitted when OTokens are minted for the pool
    OTokensMinted {
        amount: u128,
        block_height: u64,
    },

    /// Emitted when OTokens taken out of the pool are burned
    OTokensBurned {
        amount: u128,
        block_height: u64,
    },

    // ============ Protocol Events ============

    /// Emitted when the strategy pauses
    StrategyPaused {
        cause: PauseCause,
        block_height: u64,
    },

    /// Emitted when the strategy resumes
    StrategyUnpaused {
        block_height: u64,
    },
}

impl StratosEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::ValidatorStateChanged { .. } => EventType::ValidatorStateChanged,
            Self::EthStaked { .. } => EventType::EthStaked,
            Self::StakeEthTallyReset { .. } => EventType::StakeEthTallyReset,
            Self::StakeEthThresholdChanged { .. } => EventType::StakeEthThresholdChanged,
            Self::AccountingOutcome { .. } => EventType::AccountingOutcome,
            Self::FuseIntervalUpdated { .. } => EventType::FuseIntervalUpdated,
            Self::AccountingManuallyFixed { .. } => EventType::AccountingManuallyFixed,
            Self::RewardsCollected { .. } => EventType::RewardsCollected,
            Self::Deposit { .. } => EventType::Deposit,
            Self::Withdrawal { .. } => EventType::Withdrawal,
            Self::LiquidityAdded { .. } => EventType::LiquidityAdded,
            Self::LiquidityRemoved { .. } => EventType::LiquidityRemoved,
            Self::OTokensMinted { .. } => EventType::OTokensMinted,
            Self::OTokensBurned { .. } => EventType::OTokensBurned,
            Self::StrategyPaused { .. } => EventType::StrategyPaused,
            Self::StrategyUnpaused { .. } => EventType::StrategyUnpaused,
        }
    }

    /// Get the block height when event occurred
    pub fn block_height(&self) -> u64 {
        match self {
            Self::ValidatorStateChanged { block_height, .. }
            | Self::EthStaked { block_height, .. }
            | Self::StakeEthTallyReset { block_height }
            | Self::StakeEthThresholdChanged { block_height, .. }
            | Self::AccountingOutcome { block_height, .. }
            | Self::FuseIntervalUpdated { block_height, .. }
            | Self::AccountingManuallyFixed { block_height, .. }
            | Self::RewardsCollected { block_height, .. }
            | Self::Deposit { block_height, .. }
            | Self::Withdrawal { block_height, .. }
            | Self::LiquidityAdded { block_height, .. }
            | Self::LiquidityRemoved { block_height, .. }
            | Self::OTokensMinted { block_height, .. }
            | Self::OTokensBurned { block_height, .. }
            | Self::StrategyPaused { block_height, .. }
            | Self::StrategyUnpaused { block_height } => *block_height,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting multiple events during execution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct EventLog {
    events: Vec<StratosEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: StratosEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[StratosEvent] {
        &self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&StratosEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Most recent event, if any
    pub fn last(&self) -> Option<&StratosEvent> {
        self.events.last()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let event = StratosEvent::AccountingOutcome {
            classification: AccountingClassification::RewardsAccrued,
            withdrawn_validators: 0,
            eth_to_vault: 0,
            active_validators: 10,
            consensus_rewards: 2,
            block_height: 100,
        };

        assert_eq!(event.event_type(), EventType::AccountingOutcome);
        assert_eq!(event.block_height(), 100);
    }

    #[test]
    fn test_event_serialization() {
        let event = StratosEvent::AccountingManuallyFixed {
            validators_delta: -1,
            consensus_rewards_delta: -5,
            eth_to_vault: 15,
            block_height: 200,
        };

        let bytes = event.to_bytes();
        let restored = StratosEvent::from_bytes(&bytes).unwrap();

        assert_eq!(event, restored);
    }

    #[test]
    fn test_event_log_filter() {
        let mut log = EventLog::new();

        log.emit(StratosEvent::ValidatorStateChanged {
            pubkey_hash: [1u8; 32],
            state: ValidatorState::Registered,
            block_height: 1,
        });
        log.emit(StratosEvent::StrategyPaused {
            cause: PauseCause::FuseBlown,
            block_height: 2,
        });

        assert_eq!(log.len(), 2);
        assert!(log.has_events());
        assert_eq!(log.filter_by_type(EventType::StrategyPaused).len(), 1);
        assert_eq!(log.last().map(|e| e.block_height()), Some(2));
    }
}
