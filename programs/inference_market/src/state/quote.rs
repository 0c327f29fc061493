use anchor_lang::prelude::*;
use crate::state::{DiscountTier, VolumeDiscount};
use crate::utils::{apply_discount_bps, checked_total};

/// Buyer-facing quote. Computed on every call and returned to the caller,
/// never stored. Must be recomputed once `valid_until` has passed.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct PriceQuote {
    pub buyer: Pubkey,
    pub host: Pubkey,
    pub model_id: [u8; 32],
    pub volume: u64,
    pub payment_token: Pubkey,
    pub unit_price: u64,
    pub discount_bps: u16,
    pub total_price: u64,
    pub issued_at: i64,
    pub valid_until: i64,
}

impl PriceQuote {
    pub fn is_valid_at(&self, now: i64) -> bool {
        now <= self.valid_until
    }
}

/// Effective prices of one model for a host.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct ModelPriceView {
    pub model_id: [u8; 32],
    pub native_price: u64,
    pub stable_price: u64,
}

/// One cell of a cross-host, cross-token price comparison.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct HostPriceView {
    pub host: Pubkey,
    pub token: Pubkey,
    pub unit_price: u64,
}

/// Returns `(total, discount_bps)` for `volume` tokens at `unit_price`.
pub fn compute_quote_total(unit_price: u64, volume: u64, tiers: &[DiscountTier]) -> Result<(u64, u16)> {
    let gross = checked_total(unit_price, volume)?;
    let discount_bps = VolumeDiscount::discount_for(tiers, volume);
    Ok((apply_discount_bps(gross, discount_bps)?, discount_bps))
}
