// ============ AU-AMM Integration Tests ============
// Full flows through the SDK ledger: every call carries its transfers, the
// contract returns instructions and the ledger applies them.
//
// Test categories:
// 1. Bootstrap -> initial mint -> mint -> swap
// 2. Withheld initial mint
// 3. Burn returns the deposit
// 4. Auction win, fee change and displacement refund
// 5. Escrow receives fee payouts
// 6. JSON envelopes and SDK quotes

use au_amm_contract::{AmmContract, AmmError, BurnOutcome, CallOutput, MintOutcome, Refund};
use au_amm_sdk::{derive_account, quote_mint, quote_swap, CallEnvelope, SdkError};
use au_amm_types::{AssetId, Call, LIQUIDITY_DECIMALS, TOTAL_SUPPLY};

use crate::harness::*;

fn minted(output: &CallOutput) -> MintOutcome {
    match output {
        CallOutput::Mint(outcome) => *outcome,
        other => panic!("expected mint output, got {other:?}"),
    }
}

// ============ Test 1: End-To-End Scenario ============

#[test]
fn test_bootstrap_mint_swap_scenario() {
    let mut market = Market::delivering();
    let token = market.bootstrap(10);

    assert_eq!(market.asset_a, AssetId(1));
    assert_eq!(market.asset_b, AssetId(2));
    let record = market.host.asset(token).unwrap();
    assert_eq!(record.name, "VLP-AAA-BBB");
    assert_eq!(record.unit_name, "vlp");
    assert_eq!(record.decimals, LIQUIDITY_DECIMALS);
    assert_eq!(record.total, TOTAL_SUPPLY);

    let pool = market.pool();
    assert_eq!(pool.current_fee, 5);
    assert_eq!(pool.max_fee, 10);
    assert_eq!(pool.fee_recipient, CREATOR);

    // Initial deposit: sqrt(1000 * 1000)
    let receipt = market.mint(ALICE, 1, 1000, 1000).unwrap();
    assert_eq!(
        minted(&receipt.output),
        MintOutcome { minted: 1000, initial: true, delivered: true }
    );
    assert_eq!(market.balance(ALICE, token), 1000);

    // Balanced follow-up with 1000 issued
    let receipt = market.mint(BOB, 2, 500, 500).unwrap();
    assert_eq!(minted(&receipt.output).minted, 500);
    assert_eq!(market.reserves().issued(), Ok(1500));

    // Swap 100 A against (1500, 1500) at fee 5
    let a = market.asset_a;
    let receipt = market.swap(CAROL, 3, a, 100).unwrap();
    let CallOutput::Swap(outcome) = receipt.output else {
        panic!("expected swap output");
    };
    assert_eq!(outcome.asset_out, market.asset_b);
    assert_eq!(outcome.quote.amount_out, 93);
    // Exact zero-fee amount is 100 * 1500 / 1600 = 93.75
    assert!(outcome.quote.amount_out as u128 * 1600 < 100 * 1500);

    assert_eq!(market.balance(CAROL, market.asset_a), START_BALANCE - 100);
    assert_eq!(market.balance(CAROL, market.asset_b), START_BALANCE + 93);
    assert_eq!(market.balance(APP, market.asset_a), 1600);
    assert_eq!(market.balance(APP, market.asset_b), 1407);
    assert_eq!(market.pool().last_ratio, 1600 * 1000 / 1407);

    assert_eq!(market.host.persisted(), Some(&market.amm.snapshot()));
}

#[test]
fn test_contract_resumes_from_persisted_records() {
    let mut market = Market::delivering();
    let token = market.bootstrap(10);
    market.mint(ALICE, 1, 1000, 1000).unwrap();

    let persisted = market.host.persisted().cloned().unwrap();
    market.amm = AmmContract::from_snapshot(&persisted).unwrap();
    assert!(market.amm.config().deliver_initial_mint);

    market.mint(BOB, 2, 500, 500).unwrap();
    assert_eq!(market.balance(BOB, token), 500);
    assert_eq!(market.host.persisted(), Some(&market.amm.snapshot()));
}

// ============ Test 2: Withheld Initial Mint ============

#[test]
fn test_withheld_initial_mint_blocks_later_deposits() {
    let mut market = Market::new(Default::default());
    let token = market.bootstrap(10);

    let receipt = market.mint(ALICE, 1, 1000, 1000).unwrap();
    assert_eq!(
        minted(&receipt.output),
        MintOutcome { minted: 1000, initial: true, delivered: false }
    );
    assert_eq!(market.balance(ALICE, token), 0);
    assert_eq!(market.balance(APP, token), TOTAL_SUPPLY);

    // Nothing is issued, so a second deposit earns nothing and is rolled back
    assert_eq!(
        market.mint(BOB, 2, 500, 500).unwrap_err(),
        SdkError::Contract(AmmError::NothingToMint)
    );
    assert_eq!(market.balance(BOB, market.asset_a), START_BALANCE);
    assert_eq!(market.balance(APP, market.asset_a), 1000);
}

// ============ Test 3: Burn ============

#[test]
fn test_burn_returns_deposit() {
    let mut market = Market::delivering();
    let token = market.bootstrap(10);
    market.mint(ALICE, 1, 1000, 1000).unwrap();
    market.mint(BOB, 2, 500, 500).unwrap();

    let receipt = market.burn(BOB, 3, 500).unwrap();
    assert_eq!(receipt.output, CallOutput::Burn(BurnOutcome { amount_a: 500, amount_b: 500 }));

    assert_eq!(market.balance(BOB, token), 0);
    assert_eq!(market.balance(BOB, market.asset_a), START_BALANCE);
    assert_eq!(market.balance(BOB, market.asset_b), START_BALANCE);
    assert_eq!(market.reserves().issued(), Ok(1000));
    assert_eq!(market.pool().last_ratio, 1000);
}

#[test]
fn test_unbalanced_deposit_credited_at_smaller_ratio() {
    let mut market = Market::delivering();
    let token = market.bootstrap(10);
    market.mint(ALICE, 1, 1000, 1000).unwrap();

    // 50% of A but only 10% of B: 100 tokens, the surplus A stays in the pool
    let receipt = market.mint(BOB, 2, 500, 100).unwrap();
    assert_eq!(minted(&receipt.output).minted, 100);
    assert_eq!(market.balance(BOB, token), 100);
    assert_eq!(market.balance(APP, market.asset_a), 1500);
}

// ============ Test 4: Auction ============

#[test]
fn test_auction_winner_collects_fees() {
    let mut market = Market::delivering();
    let token = market.bootstrap(10);
    market.mint(ALICE, 1, 1000, 1000).unwrap();
    market.mint(BOB, 1, 500, 500).unwrap();

    // Bob bonds 5 * 20 for [20, 40)
    let receipt = market.bid(BOB, 2, 20, 20, 5).unwrap();
    assert_eq!(receipt.output, CallOutput::Bid(None));
    assert_eq!(market.balance(BOB, token), 400);
    assert_eq!(market.amm.auction().window_end, 40);

    let claim = market.builder(BOB).set_manager();
    market.call(BOB, 21, &claim).unwrap();
    assert_eq!(market.pool().fee_recipient, BOB);

    let raise = market.builder(BOB).set_new_fee(10);
    market.call(BOB, 21, &raise).unwrap();

    // 1% of 10_000 goes to Bob, the rest is priced against (1500, 1500)
    let a = market.asset_a;
    market.swap(CAROL, 22, a, 10_000).unwrap();
    assert_eq!(market.balance(BOB, market.asset_a), START_BALANCE - 500 + 100);
    assert_eq!(market.balance(CAROL, market.asset_b), START_BALANCE + 1302);

    // Alice outbids mid-window; Bob gets back what the remaining rounds do not cover
    let receipt = market.bid(ALICE, 30, 41, 20, 6).unwrap();
    assert_eq!(receipt.output, CallOutput::Bid(Some(Refund { recipient: BOB, amount: 50 })));
    assert_eq!(market.balance(BOB, token), 450);
    assert_eq!(market.balance(ALICE, token), 880);
    assert_eq!(market.amm.auction().bidder, ALICE);

    // Bob stays fee recipient until Alice claims
    assert_eq!(market.pool().fee_recipient, BOB);
    let claim = market.builder(ALICE).set_manager();
    market.call(ALICE, 42, &claim).unwrap();
    assert_eq!(market.pool().fee_recipient, ALICE);
}

#[test]
fn test_expired_window_taken_by_any_bid() {
    let mut market = Market::delivering();
    market.bootstrap(10);
    market.mint(ALICE, 1, 1000, 1000).unwrap();

    market.bid(ALICE, 1, 20, 20, 5).unwrap();
    // After 40 a later, smaller bid wins and Alice is owed nothing
    let receipt = market.bid(ALICE, 41, 100, 11, 1).unwrap();
    assert_eq!(receipt.output, CallOutput::Bid(None));
    assert_eq!(market.amm.auction().window_start, 100);
}

// ============ Test 5: Escrow ============

#[test]
fn test_escrow_receives_fee_payouts() {
    let mut market = Market::delivering();
    let token = market.bootstrap(10);
    market.mint(ALICE, 1, 1_000_000, 1_000_000).unwrap();

    let provision = market.builder(CREATOR).provision_escrow(500_000);
    let receipt = market.call(CREATOR, 2, &provision).unwrap();
    let CallOutput::Escrow(delegate) = receipt.output else {
        panic!("expected escrow output");
    };
    assert_eq!(delegate, derive_account(&APP, 0));
    assert_eq!(market.host.native_balance(&delegate), 300_000);
    assert_eq!(market.host.native_balance(&APP), SEED + 500_000 - 300_000);
    for asset in [token, market.asset_a, market.asset_b] {
        assert!(market.host.is_opted_in(&delegate, asset));
    }

    let creator_a = market.balance(CREATOR, market.asset_a);
    let a = market.asset_a;
    market.swap(CAROL, 3, a, 10_000).unwrap();
    assert_eq!(market.balance(delegate, market.asset_a), 50);
    assert_eq!(market.balance(CREATOR, market.asset_a), creator_a);
}

// ============ Test 6: Envelopes And Quotes ============

#[test]
fn test_call_submitted_from_json_envelope() {
    let mut market = Market::delivering();
    let token = market.bootstrap(10);

    let call = market.builder(ALICE).mint(&market.pool(), 400, 900);
    let json = CallEnvelope::from(&call).to_json().unwrap();
    let decoded = Call::try_from(&CallEnvelope::from_json(&json).unwrap()).unwrap();
    assert_eq!(decoded, call);

    market.call(ALICE, 1, &decoded).unwrap();
    assert_eq!(market.balance(ALICE, token), 600);
}

#[test]
fn test_quotes_match_execution() {
    let mut market = Market::delivering();
    market.bootstrap(10);
    market.mint(ALICE, 1, 40_000, 90_000).unwrap();

    let expected = quote_mint(&market.reserves(), 4_000, 9_000).unwrap();
    let receipt = market.mint(BOB, 2, 4_000, 9_000).unwrap();
    assert_eq!(minted(&receipt.output).minted, expected);

    let b = market.asset_b;
    let quote = quote_swap(&market.reserves(), &market.pool(), b, 7_777).unwrap();
    let receipt = market.swap(CAROL, 3, b, 7_777).unwrap();
    let CallOutput::Swap(outcome) = receipt.output else {
        panic!("expected swap output");
    };
    assert_eq!(outcome.quote, quote);
    assert_eq!(outcome.asset_out, market.asset_a);
}
