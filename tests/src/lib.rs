// ============ AU-AMM Test Suite ============
// Cross-crate tests driving the contract through the SDK's in-memory ledger.
//
// Test categories:
// 1. Integration: bootstrap -> mint -> swap -> burn, auction and escrow flows
// 2. Adversarial: forged transfers, unauthorized calls, auction abuse
// 3. Fuzz/Property: seeded random inputs with invariant checks


#[cfg(test)]
mod integration;


#[cfg(test)]
mod fuzz;
