use anchor_lang::prelude::*;
use crate::constants::BPS_DENOMINATOR;
use crate::utils::apply_bps;

pub const TIER_NONE: u8 = 0;
pub const TIER_HIGH: u8 = 3;

/// Per-model surge state: Normal (inactive) or Surging at tier 1..=3.
#[account]
pub struct SurgeState {
    pub model_id: [u8; 32],
    pub active: bool,
    pub tier: u8,
    pub multiplier_bps: u16,
    pub price_cap: u64, // absolute, 0 = uncapped
    pub last_demand: u64,
    pub high_tier_since: i64, // 0 when not at the high tier
    pub updated_at: i64,
    pub bump: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurgeTransition {
    Activated { tier: u8, multiplier_bps: u16 },
    Deactivated,
    Unchanged,
}

/// Highest tier (1-based) whose threshold `demand` meets or exceeds.
pub fn select_surge_tier(demand: u64, thresholds: &[u64; 3]) -> Option<u8> {
    thresholds
        .iter()
        .rposition(|&threshold| demand >= threshold)
        .map(|idx| idx as u8 + 1)
}

impl SurgeState {
    pub const SIZE: usize = 8 + // discriminator
        32 + // model_id
        1 + // active
        1 + // tier
        2 + // multiplier_bps
        8 + // price_cap
        8 + // last_demand
        8 + // high_tier_since
        8 + // updated_at
        1; // bump

    pub fn multiplier(&self) -> u16 {
        if self.active {
            self.multiplier_bps
        } else {
            BPS_DENOMINATOR as u16
        }
    }

    /// Moves the state machine for the observed demand.
    pub fn apply_demand(
        &mut self,
        demand: u64,
        thresholds: &[u64; 3],
        multipliers: &[u16; 3],
        now: i64,
    ) -> SurgeTransition {
        self.last_demand = demand;
        self.updated_at = now;

        let Some(tier) = select_surge_tier(demand, thresholds) else {
            if !self.active {
                return SurgeTransition::Unchanged;
            }
            self.active = false;
            self.tier = TIER_NONE;
            self.multiplier_bps = BPS_DENOMINATOR as u16;
            self.high_tier_since = 0;
            return SurgeTransition::Deactivated;
        };

        if tier == TIER_HIGH {
            if self.tier != TIER_HIGH || self.high_tier_since == 0 {
                self.high_tier_since = now;
            }
        } else {
            self.high_tier_since = 0;
        }

        let multiplier_bps = multipliers[(tier - 1) as usize];
        if self.active && self.tier == tier && self.multiplier_bps == multiplier_bps {
            return SurgeTransition::Unchanged;
        }
        self.active = true;
        self.tier = tier;
        self.multiplier_bps = multiplier_bps;
        SurgeTransition::Activated { tier, multiplier_bps }
    }

    /// `base * multiplier / 10000`, clamped to the cap when one is set.
    pub fn surge_price(&self, base_price: u64) -> Result<u64> {
        let surged = apply_bps(base_price, self.multiplier() as u64)?;
        if self.price_cap > 0 {
            Ok(surged.min(self.price_cap))
        } else {
            Ok(surged)
        }
    }

    /// Whether demand was observed at the high tier at both ends of a span
    /// of at least `window` seconds, the latest observation being no older
    /// than `window`.
    pub fn sustained_high(&self, now: i64, window: i64) -> bool {
        self.active
            && self.tier == TIER_HIGH
            && self.high_tier_since > 0
            && self.updated_at.saturating_sub(self.high_tier_since) >= window
            && now.saturating_sub(self.updated_at) <= window
    }
}
