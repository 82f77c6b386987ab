//! Emergency Module
//!
//! Pause circuit breaker shared by the strategies.
//!
//! The native staking accountant trips the breaker on its own when a beacon
//! chain sweep cannot be classified; operators can also pause manually. The
//! AMO strategy reads the same state and refuses vault deposits and
//! withdrawals while it is tripped.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{StratosError, StratosResult};

/// Why the strategy was paused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PauseCause {
    /// Balance fell below tracked liabilities, or more withdrawals than active validators
    Invalid,
    /// Remaining balance landed inside the fuse window
    FuseBlown,
    /// Operator action
    Manual,
}

impl PauseCause {
    /// Whether this pause can only be lifted through a manual accounting fix
    pub fn requires_manual_fix(&self) -> bool {
        matches!(self, PauseCause::Invalid | PauseCause::FuseBlown)
    }
}

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PauseState {
    /// Operations allowed
    #[default]
    Running,
    /// Operations halted until the cause is cleared
    Paused(PauseCause),
}

impl PauseState {
    pub fn is_paused(&self) -> bool {
        matches!(self, PauseState::Paused(_))
    }

    /// Cause of the current pause, if any
    pub fn cause(&self) -> Option<PauseCause> {
        match self {
            PauseState::Running => None,
            PauseState::Paused(cause) => Some(*cause),
        }
    }

    /// Fail with `StrategyPaused` unless running
    pub fn ensure_running(&self) -> StratosResult<()> {
        if self.is_paused() {
            Err(StratosError::StrategyPaused)
        } else {
            Ok(())
        }
    }

    /// Fail with `NotPaused` unless paused
    pub fn ensure_paused(&self) -> StratosResult<()> {
        if self.is_paused() {
            Ok(())
        } else {
            Err(StratosError::NotPaused)
        }
    }

    /// Trip the breaker. An existing pause keeps its original cause.
    pub fn trip(&mut self, cause: PauseCause) {
        if let PauseState::Running = self {
            *self = PauseState::Paused(cause);
        }
    }

    /// Lift a manual pause. Accounting pauses stay in place.
    pub fn lift_manual(&mut self) -> StratosResult<()> {
        match *self {
            PauseState::Running => Err(StratosError::NotPaused),
            PauseState::Paused(cause) if cause.requires_manual_fix() => Err(StratosError::InvalidInput {
                param: "pause",
                reason: "accounting pause requires a manual fix",
            }),
            PauseState::Paused(_) => {
                *self = PauseState::Running;
                Ok(())
            }
        }
    }

    /// Clear any pause after a successful accounting re-validation
    pub fn clear(&mut self) {
        *self = PauseState::Running;
    }
}
