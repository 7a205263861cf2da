//! Ledger Hardening Tests
//!
//! End-to-end behaviour through the `ConfidentialLedger` facade:
//! - Campaign lifecycle and completion idempotence
//! - Contributor registration and accumulation
//! - Pool uniqueness and order execution
//! - Self-trade and permission checks, including granted operators
//! - Atomicity of rejected calls
//! - Fuzz testing (proptest)

use cipher_core::{CipherEngine, DigestProofBackend, EncryptionContext};
use contracts::campaign::CampaignParams;
use contracts::clock::{Clock, ManualClock};
use contracts::config::LedgerConfig;
use contracts::errors::LedgerError;
use contracts::events::TracingSink;
use contracts::exchange::{OrderRequest, SwapRequest};
use contracts::lifecycle::CampaignStatus;
use contracts::registry::VerificationTier;
use contracts::security::Role;
use contracts::{ConfidentialLedger, CONTRACT_ABI_VERSION};
use rust_decimal::Decimal;
use std::sync::Arc;
use types::errors::ErrorKind;
use types::handle::{EncryptedHandle, Proof};
use types::ids::{AccountId, AssetId, OrderId, VaultId};
use types::order::{OrderKind, Side};

const START: i64 = 1_700_000_000;
const DAY: i64 = 86_400;

// ═══════════════════════════════════════════════════════════════════
// Campaign Lifecycle
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_campaign_lifecycle_sixty_forty() {
    let (ledger, _) = setup_ledger();
    let vault_id = ledger
        .register_campaign(AccountId::new(), campaign(100))
        .unwrap();
    assert_eq!(ledger.vault_details(vault_id).unwrap().status, CampaignStatus::Active);

    let a = AccountId::new();
    let b = AccountId::new();
    let (ha, _) = give(&ledger, vault_id, a, 60).unwrap();
    let details = ledger.vault_details(vault_id).unwrap();
    assert_eq!(details.status, CampaignStatus::Active);
    assert_eq!(details.contributor_count, 1);

    let (hb, status) = give(&ledger, vault_id, b, 40).unwrap();
    assert_eq!(status, CampaignStatus::Completed);

    let details = ledger.vault_details(vault_id).unwrap();
    assert_eq!(details.status, CampaignStatus::Completed);
    assert_eq!(details.contributor_count, 2);
    assert_eq!(details.raised, Decimal::from(100));
    assert_eq!(ledger.contribution_of(vault_id, &a).unwrap(), ha);
    assert_eq!(ledger.contribution_of(vault_id, &b).unwrap(), hb);
}

#[test]
fn test_completion_is_idempotent() {
    let (ledger, _) = setup_ledger();
    let vault_id = ledger
        .register_campaign(AccountId::new(), campaign(50))
        .unwrap();
    give(&ledger, vault_id, AccountId::new(), 50).unwrap();

    let err = give(&ledger, vault_id, AccountId::new(), 10).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let completions = ledger
        .events()
        .iter()
        .filter(|e| e.label() == "CampaignCompleted")
        .count();
    assert_eq!(completions, 1);
    assert_eq!(ledger.stats().completed_campaigns, 1);
}

#[test]
fn test_no_double_registration() {
    let (ledger, _) = setup_ledger();
    let vault_id = ledger
        .register_campaign(AccountId::new(), campaign(1_000))
        .unwrap();
    let who = AccountId::new();

    let (first, _) = give(&ledger, vault_id, who, 10).unwrap();
    let (second, _) = give(&ledger, vault_id, who, 15).unwrap();

    assert_eq!(ledger.contributors(vault_id).unwrap(), vec![who]);
    assert_eq!(
        ledger.contribution_of(vault_id, &who).unwrap(),
        ledger.engine().add(&first, &second)
    );
}

#[test]
fn test_withdraw_after_expiry_keeps_total() {
    let (ledger, clock) = setup_ledger();
    let vault_id = ledger
        .register_campaign(AccountId::new(), campaign(1_000))
        .unwrap();
    let who = AccountId::new();
    let (handle, _) = give(&ledger, vault_id, who, 10).unwrap();
    let total = ledger.vault_details(vault_id).unwrap().encrypted_total;

    clock.advance(DAY);
    assert_eq!(ledger.withdraw(who, vault_id).unwrap(), handle);
    assert_eq!(ledger.vault_details(vault_id).unwrap().encrypted_total, total);
    assert!(ledger.contribution_of(vault_id, &who).unwrap().is_null());

    let err = ledger.withdraw(who, vault_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn test_paused_campaign_keeps_contributions_locked() {
    let (ledger, _) = setup_ledger();
    let creator = AccountId::new();
    let vault_id = ledger.register_campaign(creator, campaign(100)).unwrap();
    let a = AccountId::new();
    give(&ledger, vault_id, a, 60).unwrap();
    ledger.pause(creator, vault_id).unwrap();

    let err = ledger.withdraw(a, vault_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert!(ledger.has_contributed(vault_id, &a).unwrap());

    ledger.resume(creator, vault_id).unwrap();
    let (_, status) = give(&ledger, vault_id, AccountId::new(), 40).unwrap();
    assert_eq!(status, CampaignStatus::Completed);
    assert!(!ledger.withdraw(a, vault_id).unwrap().is_null());
}

#[test]
fn test_emergency_exit_releases_every_contributor() {
    let (ledger, _) = setup_ledger();
    let creator = AccountId::new();
    let vault_id = ledger.register_campaign(creator, campaign(1_000)).unwrap();
    let contributors: Vec<AccountId> = (0..5).map(|_| AccountId::new()).collect();
    for who in &contributors {
        give(&ledger, vault_id, *who, 3).unwrap();
    }

    let refunds = ledger.emergency_exit(creator, vault_id).unwrap();
    assert_eq!(refunds.len(), contributors.len());
    for who in &contributors {
        assert!(ledger.contribution_of(vault_id, who).unwrap().is_null());
    }
    assert_eq!(
        ledger.vault_details(vault_id).unwrap().status,
        CampaignStatus::Cancelled
    );
}

// ═══════════════════════════════════════════════════════════════════
// Exchange
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_pool_uniqueness_is_order_insensitive() {
    let (ledger, _) = setup_ledger();
    let creator = AccountId::new();
    ledger
        .create_pool(creator, AssetId::from("XAU"), AssetId::from("YEN"), 25)
        .unwrap();

    let err = ledger
        .create_pool(creator, AssetId::from("YEN"), AssetId::from("XAU"), 25)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn test_order_execution_shrinks_active_list() {
    let (ledger, _) = setup_ledger();
    let pool_id = ledger
        .create_pool(AccountId::new(), AssetId::from("XAU"), AssetId::from("YEN"), 25)
        .unwrap();
    let owner = AccountId::new();
    let order_id = ledger
        .place_order(owner, pool_id, order(&ledger, owner, Side::Buy))
        .unwrap();
    assert_eq!(order_id, OrderId::new(1));
    let before = ledger.active_order_ids(pool_id, Side::Buy).unwrap();

    ledger
        .execute_order(AccountId::new(), pool_id, order_id, Side::Buy)
        .unwrap();

    let after = ledger.active_order_ids(pool_id, Side::Buy).unwrap();
    assert!(!ledger.order(pool_id, order_id).unwrap().active);
    assert!(!after.contains(&order_id));
    assert_eq!(after.len(), before.len() - 1);
}

#[test]
fn test_self_trade_rejected_on_both_sides() {
    let (ledger, _) = setup_ledger();
    let pool_id = ledger
        .create_pool(AccountId::new(), AssetId::from("XAU"), AssetId::from("YEN"), 25)
        .unwrap();
    let owner = AccountId::new();

    for side in [Side::Buy, Side::Sell] {
        let order_id = ledger
            .place_order(owner, pool_id, order(&ledger, owner, side))
            .unwrap();
        for claimed in [Side::Buy, Side::Sell] {
            let err = ledger
                .execute_order(owner, pool_id, order_id, claimed)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unauthorized);
        }
        assert!(ledger.order(pool_id, order_id).unwrap().active);
    }
}

#[test]
fn test_remove_liquidity_bad_proof_changes_nothing() {
    let (ledger, _) = setup_ledger();
    let pool_id = ledger
        .create_pool(AccountId::new(), AssetId::from("XAU"), AssetId::from("YEN"), 25)
        .unwrap();
    let provider = AccountId::new();
    let (a, pa) = seal(&ledger, provider, 1_000);
    let (b, pb) = seal(&ledger, provider, 5_000);
    let share = ledger
        .add_liquidity(provider, pool_id, a, &pa, b, &pb)
        .unwrap();
    let info = ledger.pool_info(pool_id).unwrap();
    let journal_len = ledger.journal().len();

    let err = ledger
        .remove_liquidity(provider, pool_id, share, &Proof::empty())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidProof);
    assert_eq!(ledger.pool_info(pool_id).unwrap(), info);
    assert_eq!(ledger.liquidity_of(pool_id, &provider).unwrap(), share);
    assert_eq!(ledger.journal().len(), journal_len);
}

#[test]
fn test_inactive_pool_only_allows_cancel() {
    let (ledger, _, admin) = setup_ledger_with_admin();
    let pool_id = ledger
        .create_pool(AccountId::new(), AssetId::from("XAU"), AssetId::from("YEN"), 25)
        .unwrap();
    let provider = AccountId::new();
    let (a, pa) = seal(&ledger, provider, 1_000);
    let (b, pb) = seal(&ledger, provider, 5_000);
    ledger
        .add_liquidity(provider, pool_id, a, &pa, b, &pb)
        .unwrap();
    let owner = AccountId::new();
    let order_id = ledger
        .place_order(owner, pool_id, order(&ledger, owner, Side::Sell))
        .unwrap();

    ledger.set_pool_active(admin, pool_id, false).unwrap();
    let info = ledger.pool_info(pool_id).unwrap();
    let trader = AccountId::new();

    let rejected = [
        ledger
            .add_liquidity(provider, pool_id, a, &pa, b, &pb)
            .map(drop),
        ledger
            .execute_swap(trader, pool_id, swap(&ledger, trader, "YEN", "XAU"))
            .map(drop),
        ledger.execute_order(trader, pool_id, order_id, Side::Sell),
        ledger
            .place_order(trader, pool_id, order(&ledger, trader, Side::Buy))
            .map(drop),
    ];
    for result in rejected {
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidState);
    }
    assert_eq!(ledger.pool_info(pool_id).unwrap(), info);
    assert!(ledger.swaps_by_trader(&trader).is_empty());

    ledger.cancel_order(owner, pool_id, order_id).unwrap();
    assert!(ledger.active_order_ids(pool_id, Side::Sell).unwrap().is_empty());
}

#[test]
fn test_swap_round_trip_through_facade() {
    let (ledger, _) = setup_ledger();
    let pool_id = ledger
        .create_pool(AccountId::new(), AssetId::from("XAU"), AssetId::from("YEN"), 25)
        .unwrap();
    let provider = AccountId::new();
    let (a, pa) = seal(&ledger, provider, 1_000);
    let (b, pb) = seal(&ledger, provider, 5_000);
    ledger
        .add_liquidity(provider, pool_id, a, &pa, b, &pb)
        .unwrap();

    let trader = AccountId::new();
    let swap_id = ledger
        .execute_swap(trader, pool_id, swap(&ledger, trader, "YEN", "XAU"))
        .unwrap();
    let record = ledger.swap(swap_id).unwrap();
    assert!(record.executed);
    assert_eq!(ledger.swaps_by_trader(&trader), vec![swap_id]);
}

#[test]
fn test_rejected_swap_changes_nothing() {
    let (ledger, _) = setup_ledger();
    let pool_id = ledger
        .create_pool(AccountId::new(), AssetId::from("XAU"), AssetId::from("YEN"), 25)
        .unwrap();
    let reserves = ledger.pool_reserves(pool_id).unwrap();
    let journal_len = ledger.journal().len();
    let trader = AccountId::new();

    let mut request = swap(&ledger, trader, "XAU", "YEN");
    request.min_amount_out_proof = Proof::empty();
    let err = ledger.execute_swap(trader, pool_id, request).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidProof);
    assert_eq!(ledger.pool_reserves(pool_id).unwrap(), reserves);
    assert_eq!(ledger.journal().len(), journal_len);
}

// ═══════════════════════════════════════════════════════════════════
// Permission Escalation
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_non_admin_cannot_toggle_pool() {
    let (ledger, _) = setup_ledger();
    let pool_id = ledger
        .create_pool(AccountId::new(), AssetId::from("XAU"), AssetId::from("YEN"), 25)
        .unwrap();
    let err = ledger
        .set_pool_active(AccountId::new(), pool_id, false)
        .unwrap_err();
    assert!(matches!(err, LedgerError::Exchange(_)));
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn test_operator_assigns_tier_after_grant() {
    let (ledger, _, admin) = setup_ledger_with_admin();
    let vault_id = ledger
        .register_campaign(AccountId::new(), campaign(100))
        .unwrap();
    let operator = AccountId::new();

    let err = ledger
        .set_verification(operator, vault_id, VerificationTier::Verified)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    ledger.grant_role(admin, operator, Role::Operator).unwrap();
    ledger
        .set_verification(operator, vault_id, VerificationTier::Verified)
        .unwrap();
    assert_eq!(ledger.campaigns_by_tier(VerificationTier::Verified), vec![vault_id]);

    let err = ledger
        .grant_role(operator, AccountId::new(), Role::Operator)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn test_stranger_cannot_pause_campaign() {
    let (ledger, _) = setup_ledger();
    let vault_id = ledger
        .register_campaign(AccountId::new(), campaign(100))
        .unwrap();
    let err = ledger.pause(AccountId::new(), vault_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

// ═══════════════════════════════════════════════════════════════════
// Upgrade Path (ABI Freeze)
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_contract_abi_version_frozen() {
    assert_eq!(CONTRACT_ABI_VERSION, "1.0.0");
}

// ═══════════════════════════════════════════════════════════════════
// Fuzz Tests (Proptest)
// ═══════════════════════════════════════════════════════════════════

mod fuzz {
    use super::*;
    use proptest::prelude::*;

    fn amounts() -> impl Strategy<Value = Vec<u64>> {
        prop::collection::vec(1u64..=1_000u64, 1..15)
    }

    proptest! {
        /// Completion happens exactly when the plaintext running total
        /// first reaches the target, and never twice.
        #[test]
        fn fuzz_completion_matches_plaintext_total(
            target in 1i64..5_000,
            amounts in amounts(),
        ) {
            let (ledger, _) = setup_ledger();
            let vault_id = ledger.register_campaign(AccountId::new(), campaign(target)).unwrap();
            let mut running = 0i64;

            for amount in amounts {
                let result = give(&ledger, vault_id, AccountId::new(), amount);
                if running >= target {
                    prop_assert!(result.is_err());
                    continue;
                }
                running += amount as i64;
                let (_, status) = result.unwrap();
                let expected = if running >= target {
                    CampaignStatus::Completed
                } else {
                    CampaignStatus::Active
                };
                prop_assert_eq!(status, expected);
            }

            let completions = ledger
                .events()
                .iter()
                .filter(|e| e.label() == "CampaignCompleted")
                .count();
            prop_assert_eq!(completions, usize::from(running >= target));
        }

        /// Repeat contributors appear once; the handle is the fold of theirs.
        #[test]
        fn fuzz_contributor_list_has_no_duplicates(
            picks in prop::collection::vec(0usize..4, 1..20),
        ) {
            let (ledger, _) = setup_ledger();
            let vault_id = ledger.register_campaign(AccountId::new(), campaign(1_000_000)).unwrap();
            let accounts: Vec<AccountId> = (0..4).map(|_| AccountId::new()).collect();
            let mut handles: Vec<Vec<EncryptedHandle>> = vec![Vec::new(); 4];

            for pick in picks {
                let (h, _) = give(&ledger, vault_id, accounts[pick], 1).unwrap();
                handles[pick].push(h);
            }

            let contributors = ledger.contributors(vault_id).unwrap();
            let distinct = handles.iter().filter(|h| !h.is_empty()).count();
            prop_assert_eq!(contributors.len(), distinct);

            for (account, own) in accounts.iter().zip(&handles) {
                prop_assert_eq!(
                    ledger.contribution_of(vault_id, account).unwrap(),
                    ledger.engine().homomorphic_sum(own)
                );
            }
        }

        /// Executing any subset of orders removes exactly those ids.
        #[test]
        fn fuzz_active_index_tracks_executions(
            sides in prop::collection::vec(any::<bool>(), 1..12),
            execute_mask in prop::collection::vec(any::<bool>(), 12),
        ) {
            let (ledger, _) = setup_ledger();
            let pool_id = ledger
                .create_pool(AccountId::new(), AssetId::from("XAU"), AssetId::from("YEN"), 25)
                .unwrap();
            let owner = AccountId::new();
            let executor = AccountId::new();
            let mut remaining = Vec::new();

            for (i, is_buy) in sides.iter().enumerate() {
                let side = if *is_buy { Side::Buy } else { Side::Sell };
                let id = ledger.place_order(owner, pool_id, order(&ledger, owner, side)).unwrap();
                if execute_mask[i] {
                    ledger.execute_order(executor, pool_id, id, side).unwrap();
                } else {
                    remaining.push((id, side));
                }
            }

            for side in [Side::Buy, Side::Sell] {
                let mut active = ledger.active_order_ids(pool_id, side).unwrap();
                active.sort();
                let expected: Vec<OrderId> = remaining
                    .iter()
                    .filter(|(_, s)| *s == side)
                    .map(|(id, _)| *id)
                    .collect();
                prop_assert_eq!(active, expected);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

fn setup_ledger() -> (ConfidentialLedger, Arc<ManualClock>) {
    let (ledger, clock, _) = setup_ledger_with_admin();
    (ledger, clock)
}

fn setup_ledger_with_admin() -> (ConfidentialLedger, Arc<ManualClock>, AccountId) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let clock = Arc::new(ManualClock::new(START));
    let engine = Arc::new(CipherEngine::new(DigestProofBackend::new()));
    let admin = AccountId::new();
    let ledger = ConfidentialLedger::new(
        LedgerConfig::default(),
        admin,
        engine,
        Arc::clone(&clock) as Arc<dyn Clock>,
    )
    .unwrap();
    ledger.add_sink(Arc::new(TracingSink));
    (ledger, clock, admin)
}

fn campaign(target: i64) -> CampaignParams {
    CampaignParams {
        title: "Neighbourhood solar".to_string(),
        description: "Panels for the community hall".to_string(),
        category: "energy".to_string(),
        image_uri: None,
        target: Decimal::from(target),
        deadline: START + DAY,
    }
}

fn seal(ledger: &ConfidentialLedger, who: AccountId, value: u64) -> (EncryptedHandle, Proof) {
    let handle = ledger
        .engine()
        .encrypt(value, &EncryptionContext::new(who, ledger.now()));
    (handle, DigestProofBackend::prove(&handle))
}

fn give(
    ledger: &ConfidentialLedger,
    vault_id: VaultId,
    who: AccountId,
    amount: u64,
) -> Result<(EncryptedHandle, CampaignStatus), LedgerError> {
    let (handle, proof) = seal(ledger, who, amount);
    let status = ledger.contribute(who, vault_id, Decimal::from(amount), handle, &proof)?;
    Ok((handle, status))
}

fn order(ledger: &ConfidentialLedger, owner: AccountId, side: Side) -> OrderRequest {
    let (amount, amount_proof) = seal(ledger, owner, 10);
    let (price, price_proof) = seal(ledger, owner, 250);
    OrderRequest {
        side,
        kind: OrderKind::Limit,
        amount,
        amount_proof,
        price,
        price_proof,
    }
}

fn swap(ledger: &ConfidentialLedger, trader: AccountId, token_in: &str, token_out: &str) -> SwapRequest {
    let (amount_in, amount_in_proof) = seal(ledger, trader, 20);
    let (min_amount_out, min_amount_out_proof) = seal(ledger, trader, 15);
    let (slippage, _) = seal(ledger, trader, 100);
    SwapRequest {
        token_in: AssetId::from(token_in),
        token_out: AssetId::from(token_out),
        amount_in,
        amount_in_proof,
        min_amount_out,
        min_amount_out_proof,
        slippage,
        slippage_proof: DigestProofBackend::prove_range(&slippage, 0, 5_000),
    }
}
