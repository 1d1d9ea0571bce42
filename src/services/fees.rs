//! Fee math. Pure functions over minor-unit amounts; all division floors.

use crate::models::quote::FeeBreakdown;

const BPS_DENOMINATOR: u64 = 10_000;

// Platform fee tiers, (upper bound inclusive, basis points).
const TIER_SMALL_MAX: u64 = 50_000;
const TIER_MID_MAX: u64 = 500_000;
const TIER_SMALL_BPS: u64 = 120;
const TIER_MID_BPS: u64 = 90;
const TIER_LARGE_BPS: u64 = 60;
const PLATFORM_FEE_MIN: u64 = 50;

const INBOUND_BPS: u64 = 25;
const INBOUND_FLAT: u64 = 10;
const OUTBOUND_BPS: u64 = 40;
const OUTBOUND_FLAT: u64 = 30;

fn bps(amount: u64, basis_points: u64) -> u64 {
    // Widen before multiplying: amounts are caller-supplied and the product
    // can exceed u64. The quotient always fits since basis_points < 10_000.
    (u128::from(amount) * u128::from(basis_points) / u128::from(BPS_DENOMINATOR)) as u64
}

/// Tiered platform fee: smaller transfers pay a higher rate, floored at a
/// fixed minimum.
pub fn platform_fee(amount: u64) -> u64 {
    let rate = if amount <= TIER_SMALL_MAX {
        TIER_SMALL_BPS
    } else if amount <= TIER_MID_MAX {
        TIER_MID_BPS
    } else {
        TIER_LARGE_BPS
    };
    bps(amount, rate).max(PLATFORM_FEE_MIN)
}

/// Estimated cost of the inbound conversion leg.
pub fn inbound_leg_fee(amount: u64) -> u64 {
    bps(amount, INBOUND_BPS) + INBOUND_FLAT
}

/// Estimated cost of the outbound conversion leg.
pub fn outbound_leg_fee(amount: u64) -> u64 {
    bps(amount, OUTBOUND_BPS) + OUTBOUND_FLAT
}

pub fn estimate_fees(amount: u64) -> FeeBreakdown {
    FeeBreakdown {
        platform_fee: platform_fee(amount),
        inbound_fee: inbound_leg_fee(amount),
        outbound_fee: outbound_leg_fee(amount),
    }
}
