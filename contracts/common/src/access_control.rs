//! Access Control Module
//!
//! Role-based entry guards for strategy operations.
//!
//! ## Key Features
//!
//! - **Explicit caller**: every guard takes an [`AuthContext`], no ambient caller
//! - **Role book**: a plain role-to-address mapping owned by the strategy
//! - **Governor administration**: only the governor grants or revokes roles

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{StratosError, StratosResult};
use crate::types::{Address, AuthContext};
use crate::Vec;

// ============================================================================
// Types
// ============================================================================

/// Strategy roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum Role {
    /// Governance - sets parameters and administers roles
    Governor,
    /// Strategist - runs AMO rebalancing and manual accounting fixes
    Strategist,
    /// Validator registrator - registers, stakes and exits validators, triggers accounting
    Registrator,
    /// The vault that owns the strategy's funds
    Vault,
    /// Harvester - collects accrued rewards
    Harvester,
    /// Staking monitor - resets the staked ETH tally
    StakingMonitor,
}

/// Role assignment for an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RoleAssignment {
    /// Address with the role
    pub address: Address,
    /// Assigned role
    pub role: Role,
    /// Block when role was granted
    pub granted_at: u64,
}

/// Role book held by each strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RoleBook {
    /// Active role assignments
    pub assignments: Vec<RoleAssignment>,
}

impl RoleBook {
    /// Create a role book with an initial governor
    pub fn new(governor: Address) -> Self {
        let mut assignments = Vec::new();
        assignments.push(RoleAssignment {
            address: governor,
            role: Role::Governor,
            granted_at: 0,
        });
        Self { assignments }
    }

    /// Builder-style assignment used at initialization
    pub fn with_role(mut self, role: Role, address: Address) -> Self {
        if !self.has_role(&address, role) {
            self.assignments.push(RoleAssignment {
                address,
                role,
                granted_at: 0,
            });
        }
        self
    }

    /// Check if address has a specific role
    pub fn has_role(&self, address: &Address, role: Role) -> bool {
        self.assignments
            .iter()
            .any(|a| a.address == *address && a.role == role)
    }

    /// Fail with `NotAuthorized` unless the caller holds `role`
    pub fn require(&self, ctx: &AuthContext, role: Role) -> StratosResult<()> {
        if self.has_role(&ctx.caller, role) {
            Ok(())
        } else {
            Err(StratosError::NotAuthorized {
                required: role,
                caller: ctx.caller,
            })
        }
    }

    /// Fail unless the caller holds any of `roles`
    ///
    /// The error names the first role in the list.
    pub fn require_any(&self, ctx: &AuthContext, roles: &[Role]) -> StratosResult<()> {
        if roles.iter().any(|r| self.has_role(&ctx.caller, *r)) {
            return Ok(());
        }
        Err(StratosError::NotAuthorized {
            required: roles.first().copied().unwrap_or(Role::Governor),
            caller: ctx.caller,
        })
    }

    /// Vault or governor guard
    pub fn require_vault_or_governor(&self, ctx: &AuthContext) -> StratosResult<()> {
        self.require_any(ctx, &[Role::Vault, Role::Governor])
    }

    /// First address holding `role`, if any
    pub fn holder(&self, role: Role) -> Option<Address> {
        self.assignments
            .iter()
            .find(|a| a.role == role)
            .map(|a| a.address)
    }
}

// ============================================================================
// Role Administration
// ============================================================================

/// Grant a role to an address (governor only)
pub fn grant_role(
    book: &mut RoleBook,
    ctx: &AuthContext,
    grantee: Address,
    role: Role,
) -> StratosResult<()> {
    book.require(ctx, Role::Governor)?;

    if book.has_role(&grantee, role) {
        return Ok(()); // Already has role
    }

    book.assignments.push(RoleAssignment {
        address: grantee,
        role,
        granted_at: ctx.block_height,
    });
    tracing::info!(role = ?role, block = ctx.block_height, "role granted");
    Ok(())
}

/// Revoke a role from an address (governor only)
///
/// The last governor cannot be removed.
pub fn revoke_role(
    book: &mut RoleBook,
    ctx: &AuthContext,
    target: Address,
    role: Role,
) -> StratosResult<()> {
    book.require(ctx, Role::Governor)?;

    if role == Role::Governor {
        let governors = book
            .assignments
            .iter()
            .filter(|a| a.role == Role::Governor)
            .count();
        if governors <= 1 && book.has_role(&target, Role::Governor) {
            return Err(StratosError::InvalidInput {
                param: "target",
                reason: "cannot revoke the last governor",
            });
        }
    }

    book.assignments
        .retain(|a| !(a.address == target && a.role == role));
    tracing::info!(role = ?role, block = ctx.block_height, "role revoked");
    Ok(())
}
