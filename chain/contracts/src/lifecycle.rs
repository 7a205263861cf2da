//! Campaign lifecycle state machine
//!
//! ```text
//! DRAFT ──launch──▶ ACTIVE ──pause──▶ PAUSED
//!                     │  ▲──resume──────┘ │
//!                     │                   │
//!    contribution     │ cancel            │ cancel
//!    (target reached) ▼                   ▼
//!                COMPLETED*          CANCELLED*
//! ```
//!
//! Every transition goes through [`next_status`]. Contribution bookkeeping
//! calls it after each contribution with the plaintext threshold result, so
//! auto-completion is a table entry rather than a side effect.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::CampaignError;

/// Campaign status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CampaignStatus {
    /// Registered, not yet accepting contributions
    Draft,
    /// Accepting contributions until the deadline
    Active,
    /// Temporarily closed by the creator
    Paused,
    /// Target reached (terminal)
    Completed,
    /// Cancelled by the creator (terminal)
    Cancelled,
}

impl CampaignStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Cancelled)
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CampaignStatus::Draft => "DRAFT",
            CampaignStatus::Active => "ACTIVE",
            CampaignStatus::Paused => "PAUSED",
            CampaignStatus::Completed => "COMPLETED",
            CampaignStatus::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

/// Event driving a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Launch,
    Pause,
    Resume,
    /// A contribution was recorded; `target_reached` is the plaintext threshold check.
    Contribution { target_reached: bool },
    Cancel,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Launch => write!(f, "launch"),
            Trigger::Pause => write!(f, "pause"),
            Trigger::Resume => write!(f, "resume"),
            Trigger::Contribution { target_reached } => {
                write!(f, "contribution(target_reached={})", target_reached)
            }
            Trigger::Cancel => write!(f, "cancel"),
        }
    }
}

/// Transition table. Anything not listed is rejected.
pub fn next_status(current: CampaignStatus, trigger: Trigger) -> Result<CampaignStatus, CampaignError> {
    use CampaignStatus::*;

    match (current, trigger) {
        (Draft, Trigger::Launch) => Ok(Active),
        (Active, Trigger::Pause) => Ok(Paused),
        (Paused, Trigger::Resume) => Ok(Active),
        (Active, Trigger::Contribution { target_reached: false }) => Ok(Active),
        (Active, Trigger::Contribution { target_reached: true }) => Ok(Completed),
        (Active | Paused, Trigger::Cancel) => Ok(Cancelled),
        _ => Err(CampaignError::InvalidTransition {
            from: current.to_string(),
            trigger: trigger.to_string(),
        }),
    }
}
