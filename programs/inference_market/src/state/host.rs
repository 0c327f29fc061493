use anchor_lang::prelude::*;
use crate::constants::{MAX_PRICE_HISTORY, MAX_REGION_LEN, MAX_SUPPORTED_MODELS, NATIVE_TOKEN};
use crate::state::PriceBounds;

#[account]
pub struct Host {
    pub authority: Pubkey,
    pub active: bool,
    pub registration_id: u64,
    pub region: String,
    pub supported_models: Vec<[u8; 32]>,
    pub native_price: u64, // lamports per token
    pub stable_price: u64, // stable micro-units per token
    pub utilization_percent: u8,
    pub utilization_updated_at: i64,
    pub registered_at: i64,
    pub history: Vec<PriceHistoryEntry>,
    pub bump: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceHistoryEntry {
    pub token: Pubkey,
    pub price: u64,
    pub timestamp: i64,
}

impl PriceHistoryEntry {
    pub const SIZE: usize = 32 + 8 + 8;
}

/// Appends to a bounded price log, dropping the oldest entry when full.
pub fn push_history(history: &mut Vec<PriceHistoryEntry>, entry: PriceHistoryEntry) {
    if history.len() >= MAX_PRICE_HISTORY {
        history.remove(0);
    }
    history.push(entry);
}

impl Host {
    pub const SIZE: usize = 8 + // discriminator
        32 + // authority
        1 + // active
        8 + // registration_id
        4 + MAX_REGION_LEN + // region
        4 + (MAX_SUPPORTED_MODELS * 32) + // supported_models
        8 + // native_price
        8 + // stable_price
        1 + // utilization_percent
        8 + // utilization_updated_at
        8 + // registered_at
        4 + (MAX_PRICE_HISTORY * PriceHistoryEntry::SIZE) + // history
        1; // bump

    /// Overwrites both defaults, logging each write. Returns the
    /// `(token, old, new)` of every class whose price actually changed.
    pub fn set_default_prices(
        &mut self,
        bounds: &PriceBounds,
        native_price: u64,
        stable_price: u64,
        stable_mint: Pubkey,
        now: i64,
    ) -> Result<Vec<(Pubkey, u64, u64)>> {
        bounds.check(true, native_price)?;
        bounds.check(false, stable_price)?;

        let changes = [
            (NATIVE_TOKEN, self.native_price, native_price),
            (stable_mint, self.stable_price, stable_price),
        ]
        .into_iter()
        .filter(|(_, old, new)| old != new)
        .collect();

        self.native_price = native_price;
        self.stable_price = stable_price;
        for (token, price) in [(NATIVE_TOKEN, native_price), (stable_mint, stable_price)] {
            push_history(&mut self.history, PriceHistoryEntry { token, price, timestamp: now });
        }
        Ok(changes)
    }

    pub fn supports_model(&self, model_id: &[u8; 32]) -> bool {
        self.supported_models.iter().any(|m| m == model_id)
    }

    pub fn default_price(&self, is_native: bool) -> u64 {
        if !self.active {
            return 0;
        }
        if is_native {
            self.native_price
        } else {
            self.stable_price
        }
    }
}

#[cfg(test)]
pub(crate) fn test_host(native_price: u64, stable_price: u64, models: &[[u8; 32]]) -> Host {
    Host {
        authority: Pubkey::new_unique(),
        active: true,
        registration_id: 1,
        region: "us-east-1".to_string(),
        supported_models: models.to_vec(),
        native_price,
        stable_price,
        utilization_percent: 0,
        utilization_updated_at: 0,
        registered_at: 0,
        history: Vec::new(),
        bump: 255,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_keeps_the_most_recent_entries() {
        let token = Pubkey::new_unique();
        let mut history = Vec::new();
        for i in 0..(MAX_PRICE_HISTORY as u64 + 3) {
            push_history(&mut history, PriceHistoryEntry { token, price: i, timestamp: i as i64 });
        }
        assert_eq!(history.len(), MAX_PRICE_HISTORY);
        assert_eq!(history.first().unwrap().price, 3);
        assert_eq!(history.last().unwrap().price, MAX_PRICE_HISTORY as u64 + 2);
    }

    #[test]
    fn inactive_host_reads_as_unpriced() {
        let mut host = test_host(5_000, 50, &[[1u8; 32]]);
        assert_eq!(host.default_price(true), 5_000);
        assert_eq!(host.default_price(false), 50);
        assert!(host.supports_model(&[1u8; 32]));
        assert!(!host.supports_model(&[2u8; 32]));

        host.active = false;
        assert_eq!(host.default_price(true), 0);
        assert_eq!(host.default_price(false), 0);
    }

    #[test]
    fn default_changes_are_reported_per_class() {
        let bounds = PriceBounds::default();
        let stable_mint = Pubkey::new_unique();
        let mut host = test_host(5_000, 50, &[[1u8; 32]]);

        let changes = host.set_default_prices(&bounds, 6_000, 50, stable_mint, 10).unwrap();
        assert_eq!(changes, vec![(NATIVE_TOKEN, 5_000, 6_000)]);
        assert_eq!(host.history.len(), 2);

        let changes = host.set_default_prices(&bounds, 6_000, 60, stable_mint, 20).unwrap();
        assert_eq!(changes, vec![(stable_mint, 50, 60)]);
        assert!(host.set_default_prices(&bounds, 6_000, 60, stable_mint, 30).unwrap().is_empty());
    }

    #[test]
    fn out_of_bounds_defaults_are_not_written() {
        let bounds = PriceBounds::default();
        let mut host = test_host(5_000, 50, &[[1u8; 32]]);
        assert!(host.set_default_prices(&bounds, 6_000, 0, Pubkey::new_unique(), 10).is_err());
        assert_eq!((host.native_price, host.stable_price), (5_000, 50));
        assert!(host.history.is_empty());
    }
}
