use anchor_lang::prelude::*;
use crate::constants::{BPS_DENOMINATOR, MAX_MARKET_PARTICIPANTS};
use crate::errors::MarketErrorCode;
use crate::state::PriceBounds;
use crate::utils::{apply_bps, clamp_price, mul_div};

/// Observed traffic share and last known prices of every host serving a
/// model. Feeds price suggestions only, never billing.
#[account]
pub struct ModelMarket {
    pub model_id: [u8; 32],
    pub enabled: bool,
    pub total_share: u64,
    pub participants: Vec<MarketParticipant>,
    pub bump: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarketParticipant {
    pub host: Pubkey,
    pub share: u64,
    pub native_price: u64,
    pub stable_price: u64,
    pub updated_at: i64,
}

impl MarketParticipant {
    pub const SIZE: usize = 32 + 8 + 8 + 8 + 8;

    pub fn price(&self, is_native: bool) -> u64 {
        if is_native {
            self.native_price
        } else {
            self.stable_price
        }
    }
}

impl ModelMarket {
    pub const SIZE: usize = 8 + // discriminator
        32 + // model_id
        1 + // enabled
        8 + // total_share
        4 + (MAX_MARKET_PARTICIPANTS * MarketParticipant::SIZE) + // participants
        1; // bump

    pub fn participant(&self, host: &Pubkey) -> Option<&MarketParticipant> {
        self.participants.iter().find(|p| p.host == *host)
    }

    /// Adds `share` to the host's accumulated traffic and refreshes its
    /// price snapshot.
    pub fn record_usage(
        &mut self,
        host: Pubkey,
        share: u64,
        native_price: u64,
        stable_price: u64,
        now: i64,
    ) -> Result<u64> {
        let idx = match self.participants.iter().position(|p| p.host == host) {
            Some(idx) => idx,
            None => {
                require!(
                    self.participants.len() < MAX_MARKET_PARTICIPANTS,
                    MarketErrorCode::MarketFull
                );
                self.participants.push(MarketParticipant {
                    host,
                    share: 0,
                    native_price: 0,
                    stable_price: 0,
                    updated_at: now,
                });
                self.participants.len() - 1
            }
        };

        let participant = &mut self.participants[idx];
        participant.share = participant
            .share
            .checked_add(share)
            .ok_or(MarketErrorCode::ArithmeticOverflow)?;
        participant.native_price = native_price;
        participant.stable_price = stable_price;
        participant.updated_at = now;
        let host_share = participant.share;

        self.total_share = self
            .total_share
            .checked_add(share)
            .ok_or(MarketErrorCode::ArithmeticOverflow)?;
        Ok(host_share)
    }

    /// Steers an underperforming host toward the best competitor priced
    /// below it. The cut is the price gap scaled by how much more traffic
    /// that competitor captures, so the result never rises above
    /// `current_price`.
    pub fn suggested_price(
        &self,
        host: &Pubkey,
        current_price: u64,
        is_native: bool,
        bounds: &PriceBounds,
    ) -> Result<u64> {
        require!(self.enabled, MarketErrorCode::MarketPricingDisabled);
        let (min, max) = bounds.range(is_native);
        let my_share = self.participant(host).map(|p| p.share).unwrap_or(0);

        let leader = self
            .participants
            .iter()
            .filter(|p| p.host != *host)
            .filter(|p| {
                let price = p.price(is_native);
                price > 0 && price < current_price && p.share > my_share
            })
            .max_by(|a, b| {
                a.share
                    .cmp(&b.share)
                    .then(b.price(is_native).cmp(&a.price(is_native)))
            });

        let Some(leader) = leader else {
            return Ok(clamp_price(current_price, min, max));
        };

        let gap_bps = mul_div(leader.share - my_share, BPS_DENOMINATOR, leader.share)?;
        let cut = apply_bps(current_price - leader.price(is_native), gap_bps)?;
        Ok(clamp_price(current_price - cut, min, max))
    }

    /// A price strictly inside `average * (1 +/- band)`, a quarter band
    /// below the simple average of every participant's price.
    pub fn competitive_price(&self, band_bps: u16, is_native: bool, bounds: &PriceBounds) -> Result<u64> {
        require!(
            band_bps > 0 && (band_bps as u64) < BPS_DENOMINATOR,
            MarketErrorCode::InvalidBand
        );
        let prices: Vec<u64> = self
            .participants
            .iter()
            .map(|p| p.price(is_native))
            .filter(|&price| price > 0)
            .collect();
        require!(!prices.is_empty(), MarketErrorCode::NoMarketData);

        let sum: u128 = prices.iter().map(|&p| p as u128).sum();
        let average = (sum / prices.len() as u128) as u64;
        // Band edges scaled by BPS_DENOMINATOR so they are never truncated
        let lower = average as u128 * (BPS_DENOMINATOR - band_bps as u64) as u128;
        let upper = average as u128 * (BPS_DENOMINATOR + band_bps as u64) as u128;
        let inside = |price: u64| {
            let scaled = price as u128 * BPS_DENOMINATOR as u128;
            scaled > lower && scaled < upper
        };

        let bias = mul_div(average, band_bps as u64, 4 * BPS_DENOMINATOR)?;
        let mut price = average - bias;
        if !inside(price) {
            price = average;
        }

        let (min, max) = bounds.range(is_native);
        Ok(clamp_price(price, min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MAX_PRICE_STABLE, MIN_PRICE_NATIVE, MIN_PRICE_STABLE};
    use proptest::prelude::*;

    const MODEL: [u8; 32] = [3u8; 32];
    const NOW: i64 = 1_700_000_000;

    fn market(enabled: bool) -> ModelMarket {
        ModelMarket {
            model_id: MODEL,
            enabled,
            total_share: 0,
            participants: Vec::new(),
            bump: 255,
        }
    }

    #[test]
    fn usage_accumulates_per_host() {
        let mut market = market(true);
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        market.record_usage(a, 10, 1_000_000, 100, NOW).unwrap();
        market.record_usage(b, 5, 900_000, 90, NOW).unwrap();
        assert_eq!(market.record_usage(a, 7, 1_100_000, 110, NOW + 1).unwrap(), 17);
        assert_eq!(market.total_share, 22);
        assert_eq!(market.participant(&a).unwrap().native_price, 1_100_000);
    }

    #[test]
    fn participants_are_capped() {
        let mut market = market(true);
        for _ in 0..MAX_MARKET_PARTICIPANTS {
            market.record_usage(Pubkey::new_unique(), 1, 1_000, 10, NOW).unwrap();
        }
        assert!(market.record_usage(Pubkey::new_unique(), 1, 1_000, 10, NOW).is_err());
    }

    #[test]
    fn underperforming_host_is_steered_down() {
        let bounds = PriceBounds::default();
        let mut market = market(true);
        let me = Pubkey::new_unique();
        let rival = Pubkey::new_unique();
        market.record_usage(me, 20, 2_000_000, 200, NOW).unwrap();
        market.record_usage(rival, 80, 1_000_000, 100, NOW).unwrap();

        // gap = (80 - 20) / 80 = 75% of the 1_000_000 price difference
        let suggested = market.suggested_price(&me, 2_000_000, true, &bounds).unwrap();
        assert_eq!(suggested, 1_250_000);
        assert!(suggested >= bounds.min_native);
    }

    #[test]
    fn leading_host_keeps_its_price() {
        let bounds = PriceBounds::default();
        let mut market = market(true);
        let me = Pubkey::new_unique();
        let rival = Pubkey::new_unique();
        market.record_usage(me, 80, 2_000_000, 200, NOW).unwrap();
        market.record_usage(rival, 20, 1_000_000, 100, NOW).unwrap();
        assert_eq!(market.suggested_price(&me, 2_000_000, true, &bounds).unwrap(), 2_000_000);

        // a busier but pricier rival does not pull the price down
        let mut market2 = self::market(true);
        market2.record_usage(me, 10, 1_000_000, 100, NOW).unwrap();
        market2.record_usage(rival, 90, 3_000_000, 300, NOW).unwrap();
        assert_eq!(market2.suggested_price(&me, 1_000_000, true, &bounds).unwrap(), 1_000_000);
    }

    #[test]
    fn suggestion_requires_market_pricing() {
        let market = market(false);
        assert!(market
            .suggested_price(&Pubkey::new_unique(), 1_000_000, true, &PriceBounds::default())
            .is_err());
    }

    #[test]
    fn suggestion_stays_in_bounds() {
        let bounds = PriceBounds::default();
        let mut market = market(true);
        let me = Pubkey::new_unique();
        let rival = Pubkey::new_unique();
        market.record_usage(me, 0, 50, 50, NOW).unwrap();
        market.record_usage(rival, 100, 1, 1, NOW).unwrap();
        assert_eq!(market.suggested_price(&me, 50, false, &bounds).unwrap(), bounds.min_stable);
    }

    #[test]
    fn competitive_price_sits_inside_the_band_below_average() {
        let bounds = PriceBounds::default();
        let mut market = market(false);
        market.record_usage(Pubkey::new_unique(), 1, 800_000, 80, NOW).unwrap();
        market.record_usage(Pubkey::new_unique(), 1, 1_200_000, 120, NOW).unwrap();

        let price = market.competitive_price(1_000, true, &bounds).unwrap();
        assert_eq!(price, 975_000);
        assert!(price > 900_000 && price < 1_100_000);

        let stable = market.competitive_price(1_000, false, &bounds).unwrap();
        assert!(stable > 90 && stable < 100);
    }

    #[test]
    fn competitive_price_validates_inputs() {
        let bounds = PriceBounds::default();
        let mut market = market(false);
        assert!(market.competitive_price(1_000, true, &bounds).is_err());
        market.record_usage(Pubkey::new_unique(), 1, 1_000_000, 100, NOW).unwrap();
        assert!(market.competitive_price(0, true, &bounds).is_err());
        assert!(market.competitive_price(10_000, true, &bounds).is_err());
    }

    #[test]
    fn competitive_price_on_small_averages() {
        let bounds = PriceBounds::default();
        let mut market = market(false);
        market.record_usage(Pubkey::new_unique(), 1, 1_000, 10, NOW).unwrap();
        market.record_usage(Pubkey::new_unique(), 1, 1_000, 11, NOW).unwrap();

        // band edges 9.9 and 10.1 around an average of 10
        assert_eq!(market.competitive_price(100, false, &bounds).unwrap(), 10);
        assert_eq!(market.competitive_price(9_999, false, &bounds).unwrap(), 10);
    }

    proptest! {
        #[test]
        fn competitive_price_is_strictly_inside_the_band(
            price in MIN_PRICE_STABLE..=MAX_PRICE_STABLE,
            band in 1u16..10_000,
        ) {
            let bounds = PriceBounds::default();
            let mut market = market(false);
            market.record_usage(Pubkey::new_unique(), 1, MIN_PRICE_NATIVE, price, NOW).unwrap();

            let competitive = market.competitive_price(band, false, &bounds).unwrap() as u128;
            let scaled = competitive * BPS_DENOMINATOR as u128;
            prop_assert!(scaled > price as u128 * (BPS_DENOMINATOR - band as u64) as u128);
            prop_assert!(scaled < price as u128 * (BPS_DENOMINATOR + band as u64) as u128);
            prop_assert!(competitive <= price as u128);
        }
    }
}
