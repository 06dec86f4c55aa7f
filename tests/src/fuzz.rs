// ============ AU-AMM Fuzz / Property-Based Tests ============
// Seeded random call sequences against the contract and ledger.
// Reproducible from the seed alone; every test checks an invariant that must
// hold for ALL generated inputs.

use au_amm_contract::auction::{resolve_bid, BidRequest};
use au_amm_contract::{AmmError, CallOutput};
use au_amm_types::{Address, AssetId, AssetTransfer, AuctionState, Call};

use crate::harness::*;

// ============ Deterministic PRNG ============

struct TestRng {
    state: u64,
}

impl TestRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn range_u64(&mut self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        min + (self.next_u64() % (max - min))
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn chance(&mut self, percent: u64) -> bool {
        self.next_u64() % 100 < percent
    }
}

fn seeded_market(rng: &mut TestRng) -> Market {
    let mut market = Market::delivering();
    market.bootstrap(10);
    let a = rng.range_u64(10_000, 100_000_000);
    let b = rng.range_u64(10_000, 100_000_000);
    market.mint(ALICE, 1, a, b).unwrap();
    market
}

fn product(market: &Market) -> u128 {
    let reserves = market.reserves();
    reserves.reserve_a as u128 * reserves.reserve_b as u128
}

// ============ Test 1: Swaps Never Shrink The Reserve Product ============

#[test]
fn test_fuzz_swaps_never_shrink_reserve_product() {
    let mut rng = TestRng::new(0xA0A0_0001);

    for i in 0..100 {
        let mut market = seeded_market(&mut rng);
        let fee = rng.range_u64(0, 11);
        let call = market.builder(CREATOR).set_new_fee(fee);
        market.call(CREATOR, 2, &call).unwrap();

        for j in 0..10 {
            let asset_in = rng.pick(&[market.asset_a, market.asset_b]);
            let reserve_in = market.balance(APP, asset_in);
            let amount = rng.range_u64(1, reserve_in / 2 + 2);

            let k_before = product(&market);
            match market.swap(CAROL, 3, asset_in, amount) {
                Ok(_) => {
                    let k_after = product(&market);
                    assert!(
                        k_after >= k_before,
                        "Iteration {i}.{j}: k decreased {k_before} -> {k_after}, \
                         fee={fee}, in={amount}"
                    );
                }
                Err(_) => assert_eq!(
                    product(&market),
                    k_before,
                    "Iteration {i}.{j}: failed swap moved funds"
                ),
            }
        }
    }
}

// ============ Test 2: Mint Then Burn Never Profits ============

#[test]
fn test_fuzz_mint_then_burn_never_profits() {
    let mut rng = TestRng::new(0xA0A0_0002);

    for i in 0..200 {
        let mut market = seeded_market(&mut rng);
        let token = market.pool().liquidity_token;
        let a = rng.range_u64(1, 50_000_000);
        let b = rng.range_u64(1, 50_000_000);

        let minted = match market.mint(BOB, 2, a, b) {
            Ok(receipt) => match receipt.output {
                CallOutput::Mint(outcome) => outcome.minted,
                other => panic!("Iteration {i}: unexpected output {other:?}"),
            },
            Err(_) => continue,
        };
        assert_eq!(market.balance(BOB, token), minted);

        market.burn(BOB, 3, minted).unwrap();
        assert!(market.balance(BOB, market.asset_a) <= START_BALANCE, "Iteration {i}: A profit");
        assert!(market.balance(BOB, market.asset_b) <= START_BALANCE, "Iteration {i}: B profit");
    }
}

// ============ Test 3: Issued Supply Tracks Holdings ============

#[test]
fn test_fuzz_issued_supply_matches_holdings() {
    let mut rng = TestRng::new(0xA0A0_0003);
    let mut market = seeded_market(&mut rng);
    let token = market.pool().liquidity_token;

    for i in 0..300 {
        let user = rng.pick(&USERS);
        let held = market.balance(user, token);
        let _ = if held > 0 && rng.chance(40) {
            let amount = rng.range_u64(1, held + 1);
            market.burn(user, 10, amount)
        } else {
            let a = rng.range_u64(1, 1_000_000);
            let b = rng.range_u64(1, 1_000_000);
            market.mint(user, 10, a, b)
        };

        let holdings: u64 = USERS.iter().map(|u| market.balance(*u, token)).sum();
        assert_eq!(market.reserves().issued(), Ok(holdings), "Iteration {i}");
    }
}

// ============ Test 4: Auction Refunds Are Bounded ============

#[test]
fn test_fuzz_auction_refund_bounded() {
    let mut rng = TestRng::new(0xA0A0_0004);

    for i in 0..5000 {
        let window_start = rng.range_u64(0, 1_000);
        let snapshot = AuctionState {
            window_start,
            window_end: window_start + rng.range_u64(11, 200),
            bidder: Address([rng.range_u64(1, 255) as u8; 32]),
            bid_amount: rng.range_u64(1, 100),
            bonded_deposit: rng.range_u64(0, 50_000),
        };
        let bid = BidRequest {
            bidder: Address([0xB0; 32]),
            window_start: rng.range_u64(0, 1_200),
            rounds: rng.range_u64(11, 200),
            bid_amount: rng.range_u64(1, 100),
            deposit: 0,
        };
        let now = rng.range_u64(0, 1_300);

        let expired = snapshot.window_end < now;
        let earlier = snapshot.window_start > bid.window_start;
        let higher = snapshot.bid_amount < bid.bid_amount;

        match resolve_bid(&snapshot, &bid, now) {
            Ok(Some(resolution)) => {
                assert!(expired || earlier || higher, "Iteration {i}: no rule should fire");
                assert_eq!(resolution.state.bidder, bid.bidder);
                assert_eq!(resolution.state.window_end, bid.window_start + bid.rounds);
                if let Some(refund) = resolution.refund {
                    assert!(!expired, "Iteration {i}: expired slot refunded");
                    assert_eq!(refund.recipient, snapshot.bidder);
                    assert!(refund.amount <= snapshot.bonded_deposit, "Iteration {i}");
                }
            }
            Ok(None) => assert!(!(expired || earlier || higher), "Iteration {i}: rule ignored"),
            Err(err) => {
                assert_eq!(err, AmmError::RefundUnderflow, "Iteration {i}");
                assert!(!expired && (earlier || higher));
            }
        }
    }
}

// ============ Test 5: Failed Calls Leave No Trace ============

fn random_call(rng: &mut TestRng, market: &Market, user: Address) -> Call {
    let pool = market.pool();
    let builder = market.builder(user);
    let asset = rng.pick(&[pool.asset_a, pool.asset_b, pool.liquidity_token, AssetId(77)]);
    let amount = rng.range_u64(0, 5_000);

    match rng.range_u64(0, 8) {
        0 => builder.mint(&pool, amount, rng.range_u64(0, 5_000)),
        1 => builder.burn(&pool, amount),
        2 => Call::Swap {
            xfer: AssetTransfer { asset, amount, sender: user, receiver: APP },
            asset_a: pool.asset_a,
            asset_b: pool.asset_b,
        },
        3 => Call::Bid {
            liquidity_token: pool.liquidity_token,
            rounds: rng.range_u64(5, 30),
            bid_amount: rng.range_u64(0, 20),
            window_start: rng.range_u64(0, 200),
            bond: AssetTransfer {
                asset,
                amount: rng.range_u64(0, 400),
                sender: user,
                receiver: APP,
            },
        },
        4 => builder.set_manager(),
        5 => builder.set_new_fee(rng.range_u64(0, 20)),
        6 => builder.provision_escrow(rng.range_u64(390_000, 410_000)),
        _ => builder.bootstrap(SEED, pool.asset_a, pool.asset_b, 10),
    }
}

#[test]
fn test_fuzz_failed_calls_leave_no_trace() {
    let mut rng = TestRng::new(0xA0A0_0005);
    let mut market = seeded_market(&mut rng);
    let token = market.pool().liquidity_token;
    for user in USERS {
        market.host.transfer_asset(token, ALICE, user, 100).unwrap();
    }

    let mut failures = 0;
    for i in 0..500 {
        let user = rng.pick(&[ALICE, BOB, CAROL, CREATOR]);
        let now = i / 2;
        let call = random_call(&mut rng, &market, user);

        let host_before = market.host.clone();
        let state_before = market.amm.state().clone();
        match market.call(user, now, &call) {
            Ok(_) => assert_eq!(
                market.host.persisted(),
                Some(&market.amm.snapshot()),
                "Iteration {i}: persisted state out of date"
            ),
            Err(err) => {
                failures += 1;
                assert_eq!(market.host, host_before, "Iteration {i}: {err} moved funds");
                assert_eq!(market.amm.state(), &state_before, "Iteration {i}: {err} changed state");
            }
        }
    }
    assert!(failures > 0);
}
