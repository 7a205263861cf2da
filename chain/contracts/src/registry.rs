//! Campaign metadata and analytics registry
//!
//! Holds the non-financial side of a campaign: descriptive metadata, a
//! verification tier and aggregate counters. Everything except edits and
//! tier assignment is driven by [`CampaignRegistry::observe`] consuming
//! ledger events; the registry never touches encrypted values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};
use types::ids::{AccountId, VaultId};

use crate::config::CampaignConfig;
use crate::errors::RegistryError;
use crate::events::LedgerEvent;
use crate::lifecycle::CampaignStatus;
use crate::security::{AccessControl, Role};

pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_LEN: usize = 32;

/// Verification tiers, ordered from least to most trusted.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerificationTier {
    #[default]
    Unverified,
    Basic,
    Verified,
    Featured,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignMetadata {
    pub vault_id: VaultId,
    pub creator: AccountId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_uri: Option<String>,
    pub tags: Vec<String>,
    pub tier: VerificationTier,
    pub status: CampaignStatus,
    pub contribution_count: u64,
    pub unique_contributors: usize,
    pub withdrawals: u64,
    pub updated_at: i64,
}

/// Partial edit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_uri: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_campaigns: u64,
    pub active_campaigns: u64,
    pub completed_campaigns: u64,
    pub cancelled_campaigns: u64,
    pub total_contributions: u64,
    pub total_withdrawals: u64,
}

#[derive(Debug)]
pub struct CampaignRegistry {
    config: CampaignConfig,
    access: AccessControl,
    entries: BTreeMap<VaultId, CampaignMetadata>,
    stats: RegistryStats,
}

impl CampaignRegistry {
    pub fn new(config: CampaignConfig, admin: AccountId) -> Self {
        Self {
            config,
            access: AccessControl::new(admin),
            entries: BTreeMap::new(),
            stats: RegistryStats::default(),
        }
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Admin only.
    pub fn grant_role(
        &mut self,
        caller: &AccountId,
        target: AccountId,
        role: Role,
    ) -> Result<(), RegistryError> {
        if !self.access.grant_role(caller, target, role) {
            return Err(RegistryError::Unauthorized);
        }
        info!(account = %target, role = ?role, "role granted");
        Ok(())
    }

    /// Admin only. The primary admin cannot be revoked.
    pub fn revoke_role(&mut self, caller: &AccountId, target: &AccountId) -> Result<(), RegistryError> {
        if !self.access.revoke_role(caller, target) {
            return Err(RegistryError::Unauthorized);
        }
        info!(account = %target, "role revoked");
        Ok(())
    }

    /// Fold one ledger event into metadata and counters.
    ///
    /// Events for other components are ignored, as are campaign events for
    /// vaults the registry never saw created.
    pub fn observe(&mut self, event: &LedgerEvent, now: i64) {
        match event {
            LedgerEvent::CampaignCreated(e) => {
                self.stats.total_campaigns += 1;
                if e.status == CampaignStatus::Active {
                    self.stats.active_campaigns += 1;
                }
                self.entries.insert(
                    e.vault_id,
                    CampaignMetadata {
                        vault_id: e.vault_id,
                        creator: e.creator,
                        title: e.title.clone(),
                        description: e.description.clone(),
                        category: e.category.clone(),
                        image_uri: e.image_uri.clone(),
                        tags: Vec::new(),
                        tier: VerificationTier::Unverified,
                        status: e.status,
                        contribution_count: 0,
                        unique_contributors: 0,
                        withdrawals: 0,
                        updated_at: now,
                    },
                );
            }
            LedgerEvent::CampaignStatusChanged(e) => {
                self.set_status(e.vault_id, e.to, now);
            }
            LedgerEvent::ContributionRecorded(e) => {
                if let Some(entry) = self.entries.get_mut(&e.vault_id) {
                    entry.contribution_count += 1;
                    entry.unique_contributors = e.contributor_count;
                    entry.updated_at = now;
                    self.stats.total_contributions += 1;
                }
            }
            LedgerEvent::CampaignCompleted(e) => {
                self.set_status(e.vault_id, CampaignStatus::Completed, now);
            }
            LedgerEvent::CampaignCancelled(e) => {
                self.set_status(e.vault_id, CampaignStatus::Cancelled, now);
            }
            LedgerEvent::ContributionWithdrawn(e) => {
                if let Some(entry) = self.entries.get_mut(&e.vault_id) {
                    entry.withdrawals += 1;
                    entry.updated_at = now;
                    self.stats.total_withdrawals += 1;
                }
            }
            _ => {}
        }
    }

    fn set_status(&mut self, vault_id: VaultId, to: CampaignStatus, now: i64) {
        let Some(entry) = self.entries.get_mut(&vault_id) else {
            return;
        };
        let from = entry.status;
        if from == to {
            return;
        }
        entry.status = to;
        entry.updated_at = now;

        if from == CampaignStatus::Active {
            self.stats.active_campaigns = self.stats.active_campaigns.saturating_sub(1);
        }
        match to {
            CampaignStatus::Active => self.stats.active_campaigns += 1,
            CampaignStatus::Completed => self.stats.completed_campaigns += 1,
            CampaignStatus::Cancelled => self.stats.cancelled_campaigns += 1,
            CampaignStatus::Draft | CampaignStatus::Paused => {}
        }
        debug!(vault_id = %vault_id, from = %from, to = %to, "registry status updated");
    }

    // ───────────────────────── Edits ─────────────────────────

    /// Creator only.
    pub fn update_metadata(
        &mut self,
        caller: &AccountId,
        vault_id: VaultId,
        update: MetadataUpdate,
        now: i64,
    ) -> Result<(), RegistryError> {
        let entry = self
            .entries
            .get(&vault_id)
            .ok_or(RegistryError::UnknownCampaign { vault_id })?;
        if entry.creator != *caller {
            return Err(RegistryError::Unauthorized);
        }
        self.validate_update(&update)?;

        let entry = self
            .entries
            .get_mut(&vault_id)
            .ok_or(RegistryError::UnknownCampaign { vault_id })?;
        if let Some(title) = update.title {
            entry.title = title;
        }
        if let Some(description) = update.description {
            entry.description = description;
        }
        if let Some(category) = update.category {
            entry.category = category;
        }
        if let Some(image_uri) = update.image_uri {
            entry.image_uri = Some(image_uri);
        }
        if let Some(tags) = update.tags {
            entry.tags = tags;
        }
        entry.updated_at = now;

        info!(vault_id = %vault_id, "campaign metadata updated");
        Ok(())
    }

    fn validate_update(&self, update: &MetadataUpdate) -> Result<(), RegistryError> {
        if let Some(title) = &update.title {
            let len = title.chars().count();
            if len < self.config.min_title_len || len > self.config.max_title_len {
                return Err(RegistryError::InvalidParameter {
                    field: "title",
                    reason: format!(
                        "length {} outside {}..={}",
                        len, self.config.min_title_len, self.config.max_title_len
                    ),
                });
            }
        }
        if let Some(description) = &update.description {
            let len = description.chars().count();
            if len > self.config.max_description_len {
                return Err(RegistryError::InvalidParameter {
                    field: "description",
                    reason: format!("length {} exceeds {}", len, self.config.max_description_len),
                });
            }
        }
        if let Some(tags) = &update.tags {
            if tags.len() > MAX_TAGS {
                return Err(RegistryError::InvalidParameter {
                    field: "tags",
                    reason: format!("at most {} tags", MAX_TAGS),
                });
            }
            if tags.iter().any(|t| t.is_empty() || t.chars().count() > MAX_TAG_LEN) {
                return Err(RegistryError::InvalidParameter {
                    field: "tags",
                    reason: format!("each tag must be 1..={} characters", MAX_TAG_LEN),
                });
            }
        }
        Ok(())
    }

    /// Admin or operator.
    pub fn set_verification(
        &mut self,
        caller: &AccountId,
        vault_id: VaultId,
        tier: VerificationTier,
        now: i64,
    ) -> Result<(), RegistryError> {
        if !self.access.is_privileged(caller) {
            return Err(RegistryError::Unauthorized);
        }
        let entry = self
            .entries
            .get_mut(&vault_id)
            .ok_or(RegistryError::UnknownCampaign { vault_id })?;
        entry.tier = tier;
        entry.updated_at = now;

        info!(vault_id = %vault_id, tier = ?tier, "verification tier set");
        Ok(())
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn metadata(&self, vault_id: VaultId) -> Result<&CampaignMetadata, RegistryError> {
        self.entries
            .get(&vault_id)
            .ok_or(RegistryError::UnknownCampaign { vault_id })
    }

    pub fn by_category(&self, category: &str) -> Vec<VaultId> {
        self.select(|m| m.category == category)
    }

    pub fn by_creator(&self, creator: &AccountId) -> Vec<VaultId> {
        self.select(|m| m.creator == *creator)
    }

    /// Campaigns at exactly `tier`.
    pub fn by_tier(&self, tier: VerificationTier) -> Vec<VaultId> {
        self.select(|m| m.tier == tier)
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats
    }

    fn select(&self, predicate: impl Fn(&CampaignMetadata) -> bool) -> Vec<VaultId> {
        self.entries
            .values()
            .filter(|m| predicate(m))
            .map(|m| m.vault_id)
            .collect()
    }
}
