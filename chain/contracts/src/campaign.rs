//! Campaign ledger: confidential funding campaigns
//!
//! Each vault tracks:
//! - a public plaintext target and deadline
//! - an encrypted running total (informational, auditable)
//! - per-contributor encrypted cumulative contributions
//! - a plaintext running total of transferred amounts, used only for the
//!   public completion check
//!
//! Completion is decided from the plaintext transfers, never from the
//! encrypted total.
//!
//! Every operation runs all precondition checks before its first mutation,
//! so a rejected call leaves the vault untouched.

use cipher_core::{CipherEngine, EncryptionContext};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use types::handle::{EncryptedHandle, Proof};
use types::ids::{AccountId, VaultId};

use crate::config::CampaignConfig;
use crate::errors::CampaignError;
use crate::events::{
    CampaignCancelled, CampaignCompleted, CampaignCreated, CampaignStatusChanged,
    ContributionRecorded, ContributionWithdrawn, LedgerEvent,
};
use crate::lifecycle::{next_status, CampaignStatus, Trigger};

/// Caller-supplied campaign description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignParams {
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_uri: Option<String>,
    /// Public funding target
    pub target: Decimal,
    /// Absolute deadline (Unix seconds)
    pub deadline: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ContributorRecord {
    encrypted: EncryptedHandle,
    has_contribution: bool,
}

/// A funding campaign.
#[derive(Debug, Clone)]
pub struct Vault {
    id: VaultId,
    creator: AccountId,
    params: CampaignParams,
    created_at: i64,
    status: CampaignStatus,
    encrypted_total: EncryptedHandle,
    raised: Decimal,
    /// Append-only, each contributor at most once
    contributors: Vec<AccountId>,
    contributions: HashMap<AccountId, ContributorRecord>,
}

impl Vault {
    pub fn id(&self) -> VaultId {
        self.id
    }

    pub fn creator(&self) -> &AccountId {
        &self.creator
    }

    pub fn params(&self) -> &CampaignParams {
        &self.params
    }

    pub fn status(&self) -> CampaignStatus {
        self.status
    }

    pub fn deadline(&self) -> i64 {
        self.params.deadline
    }

    pub fn encrypted_total(&self) -> EncryptedHandle {
        self.encrypted_total
    }

    pub fn contributors(&self) -> &[AccountId] {
        &self.contributors
    }

    /// Encrypted cumulative contribution, `NULL` for non-contributors.
    pub fn contribution_of(&self, account: &AccountId) -> EncryptedHandle {
        self.contributions
            .get(account)
            .map(|r| r.encrypted)
            .unwrap_or(EncryptedHandle::NULL)
    }

    pub fn has_contributed(&self, account: &AccountId) -> bool {
        self.contributions
            .get(account)
            .is_some_and(|r| r.has_contribution)
    }

    /// Lazily observed expiry: deadline passed while still ACTIVE.
    pub fn is_expired(&self, now: i64) -> bool {
        self.status == CampaignStatus::Active && now >= self.params.deadline
    }

    fn accepts_contributions(&self, now: i64) -> bool {
        self.status == CampaignStatus::Active && now < self.params.deadline
    }

    /// Terminal, or the deadline passed while still running (ACTIVE or PAUSED).
    fn releases_contributions(&self, now: i64) -> bool {
        match self.status {
            CampaignStatus::Completed | CampaignStatus::Cancelled => true,
            CampaignStatus::Active | CampaignStatus::Paused => now >= self.params.deadline,
            CampaignStatus::Draft => false,
        }
    }

    fn details(&self) -> VaultDetails {
        VaultDetails {
            vault_id: self.id,
            creator: self.creator,
            title: self.params.title.clone(),
            description: self.params.description.clone(),
            category: self.params.category.clone(),
            image_uri: self.params.image_uri.clone(),
            target: self.params.target,
            deadline: self.params.deadline,
            created_at: self.created_at,
            status: self.status,
            raised: self.raised,
            encrypted_total: self.encrypted_total,
            contributor_count: self.contributors.len(),
        }
    }
}

/// Read-only snapshot of a vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultDetails {
    pub vault_id: VaultId,
    pub creator: AccountId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_uri: Option<String>,
    pub target: Decimal,
    pub deadline: i64,
    pub created_at: i64,
    pub status: CampaignStatus,
    /// Sum of public transferred amounts
    pub raised: Decimal,
    pub encrypted_total: EncryptedHandle,
    pub contributor_count: usize,
}

/// Campaign ledger owning every vault.
#[derive(Debug)]
pub struct CampaignLedger {
    engine: Arc<CipherEngine>,
    config: CampaignConfig,
    /// Arena indexed by `VaultId - 1`
    vaults: Vec<Vault>,
    /// Emitted events log (append-only)
    events: Vec<LedgerEvent>,
}

impl CampaignLedger {
    pub fn new(engine: Arc<CipherEngine>, config: CampaignConfig) -> Self {
        Self {
            engine,
            config,
            vaults: Vec::new(),
            events: Vec::new(),
        }
    }

    // ───────────────────────── Registration ─────────────────────────

    /// Register a campaign and launch it immediately (DRAFT → ACTIVE).
    pub fn register_campaign(
        &mut self,
        creator: AccountId,
        params: CampaignParams,
        now: i64,
    ) -> Result<VaultId, CampaignError> {
        self.validate_params(&params, now)?;
        let status = next_status(CampaignStatus::Draft, Trigger::Launch)?;
        Ok(self.insert_vault(creator, params, status, now))
    }

    /// Register a campaign in DRAFT. It accepts nothing until launched.
    pub fn save_draft(
        &mut self,
        creator: AccountId,
        params: CampaignParams,
        now: i64,
    ) -> Result<VaultId, CampaignError> {
        self.validate_params(&params, now)?;
        Ok(self.insert_vault(creator, params, CampaignStatus::Draft, now))
    }

    fn insert_vault(
        &mut self,
        creator: AccountId,
        params: CampaignParams,
        status: CampaignStatus,
        now: i64,
    ) -> VaultId {
        let id = VaultId::new(self.vaults.len() as u64 + 1);
        let encrypted_total = self
            .engine
            .encrypt(0, &EncryptionContext::new(creator, now));

        let event = LedgerEvent::CampaignCreated(CampaignCreated {
            vault_id: id,
            creator,
            title: params.title.clone(),
            description: params.description.clone(),
            category: params.category.clone(),
            image_uri: params.image_uri.clone(),
            target: params.target,
            deadline: params.deadline,
            status,
        });

        info!(
            vault_id = %id,
            creator = %creator,
            target = %params.target,
            deadline = params.deadline,
            status = %status,
            "campaign registered"
        );

        self.vaults.push(Vault {
            id,
            creator,
            params,
            created_at: now,
            status,
            encrypted_total,
            raised: Decimal::ZERO,
            contributors: Vec::new(),
            contributions: HashMap::new(),
        });
        self.events.push(event);
        id
    }

    fn validate_params(&self, params: &CampaignParams, now: i64) -> Result<(), CampaignError> {
        let title_len = params.title.chars().count();
        if title_len < self.config.min_title_len || title_len > self.config.max_title_len {
            return Err(CampaignError::InvalidParameter {
                field: "title",
                reason: format!(
                    "length {} outside {}..={}",
                    title_len, self.config.min_title_len, self.config.max_title_len
                ),
            });
        }

        let description_len = params.description.chars().count();
        if description_len > self.config.max_description_len {
            return Err(CampaignError::InvalidParameter {
                field: "description",
                reason: format!(
                    "length {} exceeds {}",
                    description_len, self.config.max_description_len
                ),
            });
        }

        if params.target <= Decimal::ZERO {
            return Err(CampaignError::InvalidParameter {
                field: "target",
                reason: "must be positive".to_string(),
            });
        }

        self.validate_deadline(params.deadline, now)
    }

    fn validate_deadline(&self, deadline: i64, now: i64) -> Result<(), CampaignError> {
        let duration = deadline.saturating_sub(now);
        if duration < self.config.min_duration_secs || duration > self.config.max_duration_secs {
            return Err(CampaignError::InvalidParameter {
                field: "deadline",
                reason: format!(
                    "duration {}s outside {}..={}s",
                    duration, self.config.min_duration_secs, self.config.max_duration_secs
                ),
            });
        }
        Ok(())
    }

    // ───────────────────────── Lifecycle ─────────────────────────

    /// DRAFT → ACTIVE. Creator only; the deadline is re-checked against `now`.
    pub fn launch(&mut self, vault_id: VaultId, caller: &AccountId, now: i64) -> Result<(), CampaignError> {
        let vault = self.vault(vault_id)?;
        Self::check_creator(vault, caller)?;
        let to = next_status(vault.status, Trigger::Launch)?;
        self.validate_deadline(vault.params.deadline, now)?;
        self.apply_status(vault_id, to)
    }

    /// ACTIVE → PAUSED. Creator only.
    pub fn pause(&mut self, vault_id: VaultId, caller: &AccountId) -> Result<(), CampaignError> {
        self.creator_transition(vault_id, caller, Trigger::Pause)
    }

    /// PAUSED → ACTIVE. Creator only.
    pub fn resume(&mut self, vault_id: VaultId, caller: &AccountId) -> Result<(), CampaignError> {
        self.creator_transition(vault_id, caller, Trigger::Resume)
    }

    /// ACTIVE | PAUSED → CANCELLED. Creator only.
    ///
    /// Contributions stay recorded; contributors reclaim them with `withdraw`.
    pub fn cancel(&mut self, vault_id: VaultId, caller: &AccountId) -> Result<(), CampaignError> {
        let vault = self.vault(vault_id)?;
        Self::check_creator(vault, caller)?;
        let to = next_status(vault.status, Trigger::Cancel)?;

        let vault = self.vault_mut(vault_id)?;
        vault.status = to;
        info!(vault_id = %vault_id, "campaign cancelled");
        self.events.push(LedgerEvent::CampaignCancelled(CampaignCancelled {
            vault_id,
            cancelled_by: *caller,
            emergency: false,
            refunded_contributors: 0,
        }));
        Ok(())
    }

    fn creator_transition(
        &mut self,
        vault_id: VaultId,
        caller: &AccountId,
        trigger: Trigger,
    ) -> Result<(), CampaignError> {
        let vault = self.vault(vault_id)?;
        Self::check_creator(vault, caller)?;
        let to = next_status(vault.status, trigger)?;
        self.apply_status(vault_id, to)
    }

    fn apply_status(&mut self, vault_id: VaultId, to: CampaignStatus) -> Result<(), CampaignError> {
        let vault = self.vault_mut(vault_id)?;
        let from = vault.status;
        vault.status = to;
        info!(vault_id = %vault_id, from = %from, to = %to, "campaign status changed");
        self.events
            .push(LedgerEvent::CampaignStatusChanged(CampaignStatusChanged {
                vault_id,
                from,
                to,
            }));
        Ok(())
    }

    // ───────────────────────── Contribution ─────────────────────────

    /// Record a contribution.
    ///
    /// `transferred` is the public amount moved by the value rail; it only
    /// feeds the completion check. `encrypted` is accumulated into the
    /// contributor's handle and the vault total. Returns the vault status
    /// after the contribution.
    pub fn contribute(
        &mut self,
        vault_id: VaultId,
        contributor: AccountId,
        transferred: Decimal,
        encrypted: EncryptedHandle,
        proof: &Proof,
        now: i64,
    ) -> Result<CampaignStatus, CampaignError> {
        let vault = self.vault(vault_id)?;

        if !vault.accepts_contributions(now) {
            return Err(CampaignError::VaultInactive { vault_id });
        }

        if transferred <= Decimal::ZERO {
            return Err(CampaignError::ZeroAmount);
        }

        if !self.engine.verify(&encrypted, proof) {
            warn!(vault_id = %vault_id, contributor = %contributor, "contribution proof rejected");
            return Err(CampaignError::InvalidProof);
        }

        let raised = vault
            .raised
            .checked_add(transferred)
            .ok_or_else(|| CampaignError::InvalidParameter {
                field: "transferred",
                reason: "running total overflow".to_string(),
            })?;
        let target_reached = raised >= vault.params.target;
        let to = next_status(vault.status, Trigger::Contribution { target_reached })?;

        let previous = vault.contribution_of(&contributor);
        let contributor_handle = self.engine.add(&previous, &encrypted);
        let encrypted_total = self.engine.add(&vault.encrypted_total, &encrypted);
        let first_contribution = !vault.contributions.contains_key(&contributor);

        // All checks passed; commit.
        let vault = self.vault_mut(vault_id)?;
        if first_contribution {
            vault.contributors.push(contributor);
        }
        vault.contributions.insert(
            contributor,
            ContributorRecord {
                encrypted: contributor_handle,
                has_contribution: true,
            },
        );
        vault.encrypted_total = encrypted_total;
        vault.raised = raised;
        vault.status = to;

        let contributor_count = vault.contributors.len();
        let target = vault.params.target;

        debug!(
            vault_id = %vault_id,
            contributor = %contributor,
            first_contribution,
            contributor_count,
            "contribution recorded"
        );
        self.events
            .push(LedgerEvent::ContributionRecorded(ContributionRecorded {
                vault_id,
                contributor,
                first_contribution,
                contributor_count,
            }));

        if to == CampaignStatus::Completed {
            info!(vault_id = %vault_id, contributor_count, "campaign target reached");
            self.events
                .push(LedgerEvent::CampaignCompleted(CampaignCompleted {
                    vault_id,
                    target,
                    contributor_count,
                    completed_at: now,
                }));
        }

        Ok(to)
    }

    // ───────────────────────── Withdrawal ─────────────────────────

    /// Reclaim the caller's contribution.
    ///
    /// Allowed once the vault is terminal or its deadline passed. A PAUSED
    /// vault stays locked until its deadline, since it may still resume.
    /// Returns the released handle for the value rail; the vault total is
    /// historical and stays untouched.
    pub fn withdraw(
        &mut self,
        vault_id: VaultId,
        caller: &AccountId,
        now: i64,
    ) -> Result<EncryptedHandle, CampaignError> {
        let vault = self.vault(vault_id)?;

        if !vault.has_contributed(caller) {
            return Err(CampaignError::NoContribution);
        }

        if !vault.releases_contributions(now) {
            return Err(CampaignError::WithdrawalLocked {
                deadline: vault.params.deadline,
            });
        }

        let vault = self.vault_mut(vault_id)?;
        let released = vault.contribution_of(caller);
        vault.contributions.insert(
            *caller,
            ContributorRecord {
                encrypted: EncryptedHandle::NULL,
                has_contribution: false,
            },
        );

        info!(vault_id = %vault_id, contributor = %caller, "contribution withdrawn");
        self.events
            .push(LedgerEvent::ContributionWithdrawn(ContributionWithdrawn {
                vault_id,
                contributor: *caller,
            }));
        Ok(released)
    }

    /// Creator kill switch: ACTIVE → CANCELLED and every contribution released.
    ///
    /// O(n) in the contributor count. Returns `(contributor, handle)` for each
    /// contributor that still had a recorded contribution.
    pub fn emergency_exit(
        &mut self,
        vault_id: VaultId,
        caller: &AccountId,
    ) -> Result<Vec<(AccountId, EncryptedHandle)>, CampaignError> {
        let vault = self.vault(vault_id)?;
        Self::check_creator(vault, caller)?;

        if vault.status != CampaignStatus::Active {
            return Err(CampaignError::VaultInactive { vault_id });
        }
        let to = next_status(vault.status, Trigger::Cancel)?;

        let vault = self.vault_mut(vault_id)?;
        let mut refunds = Vec::new();
        for contributor in &vault.contributors {
            if let Some(record) = vault.contributions.get_mut(contributor) {
                if record.has_contribution {
                    refunds.push((*contributor, record.encrypted));
                }
                record.encrypted = EncryptedHandle::NULL;
                record.has_contribution = false;
            }
        }
        vault.status = to;

        warn!(
            vault_id = %vault_id,
            refunded = refunds.len(),
            "emergency exit executed"
        );
        self.events.push(LedgerEvent::CampaignCancelled(CampaignCancelled {
            vault_id,
            cancelled_by: *caller,
            emergency: true,
            refunded_contributors: refunds.len(),
        }));
        Ok(refunds)
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn vault(&self, vault_id: VaultId) -> Result<&Vault, CampaignError> {
        vault_id
            .value()
            .checked_sub(1)
            .and_then(|index| self.vaults.get(index as usize))
            .ok_or(CampaignError::VaultNotFound { vault_id })
    }

    pub fn vault_details(&self, vault_id: VaultId) -> Result<VaultDetails, CampaignError> {
        self.vault(vault_id).map(Vault::details)
    }

    pub fn contribution_of(
        &self,
        vault_id: VaultId,
        account: &AccountId,
    ) -> Result<EncryptedHandle, CampaignError> {
        Ok(self.vault(vault_id)?.contribution_of(account))
    }

    pub fn contributors(&self, vault_id: VaultId) -> Result<&[AccountId], CampaignError> {
        Ok(self.vault(vault_id)?.contributors())
    }

    pub fn contributor_count(&self, vault_id: VaultId) -> Result<usize, CampaignError> {
        Ok(self.vault(vault_id)?.contributors.len())
    }

    pub fn has_contributed(&self, vault_id: VaultId, account: &AccountId) -> Result<bool, CampaignError> {
        Ok(self.vault(vault_id)?.has_contributed(account))
    }

    pub fn is_expired(&self, vault_id: VaultId, now: i64) -> Result<bool, CampaignError> {
        Ok(self.vault(vault_id)?.is_expired(now))
    }

    pub fn campaigns_by_creator(&self, creator: &AccountId) -> Vec<VaultId> {
        self.vaults
            .iter()
            .filter(|v| v.creator == *creator)
            .map(|v| v.id)
            .collect()
    }

    pub fn vault_count(&self) -> usize {
        self.vaults.len()
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    // ───────────────────────── Internal ─────────────────────────

    fn vault_mut(&mut self, vault_id: VaultId) -> Result<&mut Vault, CampaignError> {
        vault_id
            .value()
            .checked_sub(1)
            .and_then(|index| self.vaults.get_mut(index as usize))
            .ok_or(CampaignError::VaultNotFound { vault_id })
    }

    fn check_creator(vault: &Vault, caller: &AccountId) -> Result<(), CampaignError> {
        if vault.creator != *caller {
            return Err(CampaignError::NotCreator);
        }
        Ok(())
    }
}
