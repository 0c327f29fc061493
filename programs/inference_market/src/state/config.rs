use anchor_lang::prelude::*;
use crate::constants::*;
use crate::errors::MarketErrorCode;
use crate::utils::{apply_bps, in_peak_window};

#[account]
pub struct MarketConfig {
    pub authority: Pubkey,          // governance
    pub registry_authority: Pubkey, // node registry, external
    pub demand_reporter: Pubkey,    // job matcher, external
    pub usage_reporter: Pubkey,
    pub stable_mint: Pubkey,        // canonical stable payment token
    pub bounds: PriceBounds,
    pub surge_thresholds: [u64; 3],   // requests per window
    pub surge_multipliers: [u16; 3],  // basis points
    pub peak_start_hour: u8,
    pub peak_end_hour: u8,
    pub peak_multiplier_bps: u16,
    pub regional_multipliers: Vec<RegionalMultiplier>,
    pub high_utilization: u8, // percent
    pub low_utilization: u8,  // percent
    pub utilization_premium_bps: u16,
    pub utilization_discount_bps: u16,
    pub automatic_adjustments_enabled: bool,
    pub auto_adjust_step_bps: u16,
    pub auto_adjust_cooldown: i64,    // seconds
    pub sustained_demand_window: i64, // seconds
    pub host_registrations: u64,
    pub bump: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceBounds {
    pub min_native: u64,
    pub max_native: u64,
    pub min_stable: u64,
    pub max_stable: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RegionalMultiplier {
    pub region: String,
    pub multiplier_bps: u16,
}

impl PriceBounds {
    pub const SIZE: usize = 8 * 4;

    pub fn validate(&self) -> Result<()> {
        require!(
            self.min_native > 0 && self.min_native <= self.max_native,
            MarketErrorCode::InvalidPriceBounds
        );
        require!(
            self.min_stable > 0 && self.min_stable <= self.max_stable,
            MarketErrorCode::InvalidPriceBounds
        );
        Ok(())
    }

    pub fn range(&self, is_native: bool) -> (u64, u64) {
        if is_native {
            (self.min_native, self.max_native)
        } else {
            (self.min_stable, self.max_stable)
        }
    }

    pub fn check(&self, is_native: bool, price: u64) -> Result<()> {
        let (min, max) = self.range(is_native);
        if price < min || price > max {
            return if is_native {
                err!(MarketErrorCode::NativePriceOutOfBounds)
            } else {
                err!(MarketErrorCode::StablePriceOutOfBounds)
            };
        }
        Ok(())
    }

    /// Like `check`, but 0 passes as the "clear this field" sentinel.
    pub fn check_override(&self, is_native: bool, price: u64) -> Result<()> {
        if price == 0 {
            return Ok(());
        }
        self.check(is_native, price)
    }

    /// Bounds may only widen once prices exist under them, otherwise a
    /// stored price could end up outside the range.
    pub fn check_widening(&self, next: &PriceBounds) -> Result<()> {
        require!(
            next.min_native <= self.min_native
                && next.max_native >= self.max_native
                && next.min_stable <= self.min_stable
                && next.max_stable >= self.max_stable,
            MarketErrorCode::InvalidPriceBounds
        );
        Ok(())
    }
}

impl Default for PriceBounds {
    fn default() -> Self {
        Self {
            min_native: MIN_PRICE_NATIVE,
            max_native: MAX_PRICE_NATIVE,
            min_stable: MIN_PRICE_STABLE,
            max_stable: MAX_PRICE_STABLE,
        }
    }
}

impl RegionalMultiplier {
    pub const SIZE: usize = 4 + MAX_REGION_LEN + 2;
}

impl MarketConfig {
    pub const SIZE: usize = 8 + // discriminator
        32 + // authority
        32 + // registry_authority
        32 + // demand_reporter
        32 + // usage_reporter
        32 + // stable_mint
        PriceBounds::SIZE +
        (8 * 3) + // surge_thresholds
        (2 * 3) + // surge_multipliers
        1 + // peak_start_hour
        1 + // peak_end_hour
        2 + // peak_multiplier_bps
        4 + (MAX_REGIONS * RegionalMultiplier::SIZE) + // regional_multipliers
        1 + // high_utilization
        1 + // low_utilization
        2 + // utilization_premium_bps
        2 + // utilization_discount_bps
        1 + // automatic_adjustments_enabled
        2 + // auto_adjust_step_bps
        8 + // auto_adjust_cooldown
        8 + // sustained_demand_window
        8 + // host_registrations
        1;  // bump

    pub fn regional_multiplier(&self, region: &str) -> u16 {
        self.regional_multipliers
            .iter()
            .find(|rm| rm.region == region)
            .map(|rm| rm.multiplier_bps)
            .unwrap_or(BPS_DENOMINATOR as u16)
    }

    pub fn upsert_regional_multiplier(&mut self, region: String, multiplier_bps: u16) -> Result<()> {
        require!(
            !region.is_empty() && region.len() <= MAX_REGION_LEN,
            MarketErrorCode::InvalidRegion
        );
        validate_multiplier(multiplier_bps)?;

        if let Some(existing) = self
            .regional_multipliers
            .iter_mut()
            .find(|rm| rm.region == region)
        {
            existing.multiplier_bps = multiplier_bps;
            return Ok(());
        }

        require!(
            self.regional_multipliers.len() < MAX_REGIONS,
            MarketErrorCode::TooManyRegions
        );
        self.regional_multipliers.push(RegionalMultiplier { region, multiplier_bps });
        Ok(())
    }

    pub fn regional_price(&self, region: &str, base_price: u64) -> Result<u64> {
        apply_bps(base_price, self.regional_multiplier(region) as u64)
    }

    pub fn time_adjusted_price(&self, hour: u8, base_price: u64) -> Result<u64> {
        if in_peak_window(hour, self.peak_start_hour, self.peak_end_hour) {
            apply_bps(base_price, self.peak_multiplier_bps as u64)
        } else {
            Ok(base_price)
        }
    }

    /// Pushes price up above the high threshold and down below the low one.
    /// The move is at least one unit so the direction holds for tiny prices.
    pub fn utilization_adjusted_price(&self, utilization: u8, base_price: u64) -> Result<u64> {
        if utilization > self.high_utilization {
            let adjusted = apply_bps(
                base_price,
                BPS_DENOMINATOR + self.utilization_premium_bps as u64,
            )?;
            if adjusted > base_price {
                Ok(adjusted)
            } else {
                base_price
                    .checked_add(1)
                    .ok_or(error!(MarketErrorCode::ArithmeticOverflow))
            }
        } else if utilization < self.low_utilization {
            let adjusted = apply_bps(
                base_price,
                BPS_DENOMINATOR.saturating_sub(self.utilization_discount_bps as u64),
            )?;
            if adjusted < base_price {
                Ok(adjusted)
            } else {
                Ok(base_price.saturating_sub(1))
            }
        } else {
            Ok(base_price)
        }
    }

    pub fn set_surge_thresholds(&mut self, thresholds: [u64; 3]) -> Result<()> {
        require!(
            thresholds[0] > 0 && thresholds[0] < thresholds[1] && thresholds[1] < thresholds[2],
            MarketErrorCode::InvalidSurgeThresholds
        );
        self.surge_thresholds = thresholds;
        Ok(())
    }

    pub fn set_surge_multipliers(&mut self, multipliers: [u16; 3]) -> Result<()> {
        for &multiplier in &multipliers {
            require!(
                multiplier as u64 >= BPS_DENOMINATOR && multiplier <= MAX_MULTIPLIER_BPS,
                MarketErrorCode::InvalidSurgeMultiplier
            );
        }
        require!(
            multipliers[0] <= multipliers[1] && multipliers[1] <= multipliers[2],
            MarketErrorCode::InvalidSurgeMultiplier
        );
        self.surge_multipliers = multipliers;
        Ok(())
    }

    pub fn set_peak_hours(&mut self, start_hour: u8, end_hour: u8) -> Result<()> {
        require!(
            start_hour < 24 && end_hour < 24 && start_hour != end_hour,
            MarketErrorCode::InvalidPeakHours
        );
        self.peak_start_hour = start_hour;
        self.peak_end_hour = end_hour;
        Ok(())
    }

    pub fn set_peak_multiplier(&mut self, multiplier_bps: u16) -> Result<()> {
        validate_multiplier(multiplier_bps)?;
        self.peak_multiplier_bps = multiplier_bps;
        Ok(())
    }

    pub fn set_utilization_thresholds(&mut self, low: u8, high: u8) -> Result<()> {
        require!(
            low < high && high <= 100,
            MarketErrorCode::InvalidUtilizationThresholds
        );
        self.low_utilization = low;
        self.high_utilization = high;
        Ok(())
    }
}

pub fn validate_multiplier(multiplier_bps: u16) -> Result<()> {
    require!(
        multiplier_bps > 0 && multiplier_bps <= MAX_MULTIPLIER_BPS,
        MarketErrorCode::InvalidMultiplier
    );
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_config() -> MarketConfig {
    MarketConfig {
        authority: Pubkey::new_unique(),
        registry_authority: Pubkey::new_unique(),
        demand_reporter: Pubkey::new_unique(),
        usage_reporter: Pubkey::new_unique(),
        stable_mint: Pubkey::new_unique(),
        bounds: PriceBounds::default(),
        surge_thresholds: DEFAULT_SURGE_THRESHOLDS,
        surge_multipliers: DEFAULT_SURGE_MULTIPLIERS,
        peak_start_hour: DEFAULT_PEAK_START_HOUR,
        peak_end_hour: DEFAULT_PEAK_END_HOUR,
        peak_multiplier_bps: DEFAULT_PEAK_MULTIPLIER_BPS,
        regional_multipliers: Vec::new(),
        high_utilization: DEFAULT_HIGH_UTILIZATION,
        low_utilization: DEFAULT_LOW_UTILIZATION,
        utilization_premium_bps: DEFAULT_UTILIZATION_PREMIUM_BPS,
        utilization_discount_bps: DEFAULT_UTILIZATION_DISCOUNT_BPS,
        automatic_adjustments_enabled: false,
        auto_adjust_step_bps: DEFAULT_AUTO_ADJUST_STEP_BPS,
        auto_adjust_cooldown: DEFAULT_AUTO_ADJUST_COOLDOWN,
        sustained_demand_window: DEFAULT_SUSTAINED_DEMAND_WINDOW,
        host_registrations: 0,
        bump: 255,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: u64 = 1_000_000; // 0.001 SOL

    #[test]
    fn bounds_reject_out_of_range() {
        let bounds = PriceBounds::default();
        assert!(bounds.check(true, MIN_PRICE_NATIVE).is_ok());
        assert!(bounds.check(true, MAX_PRICE_NATIVE).is_ok());
        assert!(bounds.check(true, MIN_PRICE_NATIVE - 1).is_err());
        assert!(bounds.check(false, MAX_PRICE_STABLE + 1).is_err());
        assert!(bounds.check(false, 0).is_err());
    }

    #[test]
    fn zero_is_the_clear_sentinel_for_overrides_only() {
        let bounds = PriceBounds::default();
        assert!(bounds.check_override(true, 0).is_ok());
        assert!(bounds.check_override(false, 0).is_ok());
        assert!(bounds.check_override(false, 1).is_err());
    }

    #[test]
    fn bounds_only_widen() {
        let bounds = PriceBounds::default();
        let wider = PriceBounds {
            min_native: MIN_PRICE_NATIVE - 1,
            max_native: MAX_PRICE_NATIVE + 1,
            ..bounds
        };
        assert!(bounds.check_widening(&bounds).is_ok());
        assert!(bounds.check_widening(&wider).is_ok());

        // a stored price at the old maximum would fall outside
        let tighter = PriceBounds { max_native: MAX_PRICE_NATIVE - 1, ..bounds };
        assert!(tighter.check(true, MAX_PRICE_NATIVE).is_err());
        assert_eq!(
            bounds.check_widening(&tighter).unwrap_err(),
            MarketErrorCode::InvalidPriceBounds.into()
        );
        let raised_floor = PriceBounds { min_stable: MIN_PRICE_STABLE + 1, ..bounds };
        assert!(bounds.check_widening(&raised_floor).is_err());
    }

    #[test]
    fn peak_hours_scenario() {
        let config = test_config();
        assert_eq!(config.time_adjusted_price(2, BASE).unwrap(), BASE);
        assert_eq!(config.time_adjusted_price(14, BASE).unwrap(), 1_250_000);
    }

    #[test]
    fn peak_hours_wrap_past_midnight() {
        let mut config = test_config();
        config.set_peak_hours(22, 2).unwrap();
        assert_eq!(config.time_adjusted_price(23, BASE).unwrap(), 1_250_000);
        assert_eq!(config.time_adjusted_price(1, BASE).unwrap(), 1_250_000);
        assert_eq!(config.time_adjusted_price(2, BASE).unwrap(), BASE);
        assert!(config.set_peak_hours(5, 5).is_err());
        assert!(config.set_peak_hours(24, 2).is_err());
    }

    #[test]
    fn regional_scenario() {
        let mut config = test_config();
        config.upsert_regional_multiplier("us-east-1".to_string(), 10_000).unwrap();
        config.upsert_regional_multiplier("eu-west-1".to_string(), 11_000).unwrap();
        config.upsert_regional_multiplier("ap-south-1".to_string(), 9_000).unwrap();

        assert_eq!(config.regional_price("us-east-1", BASE).unwrap(), 1_000_000);
        assert_eq!(config.regional_price("eu-west-1", BASE).unwrap(), 1_100_000);
        assert_eq!(config.regional_price("ap-south-1", BASE).unwrap(), 900_000);
        // unconfigured region is neutral
        assert_eq!(config.regional_price("sa-east-1", BASE).unwrap(), BASE);
    }

    #[test]
    fn regional_upsert_replaces_and_caps() {
        let mut config = test_config();
        config.upsert_regional_multiplier("eu-west-1".to_string(), 11_000).unwrap();
        config.upsert_regional_multiplier("eu-west-1".to_string(), 12_000).unwrap();
        assert_eq!(config.regional_multipliers.len(), 1);
        assert_eq!(config.regional_multiplier("eu-west-1"), 12_000);

        assert!(config.upsert_regional_multiplier(String::new(), 10_000).is_err());
        assert!(config.upsert_regional_multiplier("x".repeat(33), 10_000).is_err());
        assert!(config.upsert_regional_multiplier("r".to_string(), 0).is_err());

        for i in 1..MAX_REGIONS {
            config.upsert_regional_multiplier(format!("region-{i}"), 10_000).unwrap();
        }
        assert!(config.upsert_regional_multiplier("one-too-many".to_string(), 10_000).is_err());
    }

    #[test]
    fn utilization_moves_price_in_the_right_direction() {
        let config = test_config();
        assert!(config.utilization_adjusted_price(95, BASE).unwrap() > BASE);
        assert!(config.utilization_adjusted_price(5, BASE).unwrap() < BASE);
        assert_eq!(config.utilization_adjusted_price(50, BASE).unwrap(), BASE);
        // thresholds themselves are neutral
        assert_eq!(config.utilization_adjusted_price(80, BASE).unwrap(), BASE);
        assert_eq!(config.utilization_adjusted_price(20, BASE).unwrap(), BASE);
        // tiny prices still move
        assert_eq!(config.utilization_adjusted_price(95, 1).unwrap(), 2);
        assert_eq!(config.utilization_adjusted_price(5, 1).unwrap(), 0);
    }

    #[test]
    fn surge_tables_are_validated() {
        let mut config = test_config();
        assert!(config.set_surge_thresholds([50, 50, 200]).is_err());
        assert!(config.set_surge_thresholds([0, 10, 20]).is_err());
        assert!(config.set_surge_thresholds([10, 20, 30]).is_ok());

        assert!(config.set_surge_multipliers([9_999, 15_000, 20_000]).is_err());
        assert!(config.set_surge_multipliers([15_000, 12_000, 20_000]).is_err());
        assert!(config.set_surge_multipliers([12_000, 15_000, 50_001]).is_err());
        assert!(config.set_surge_multipliers([10_000, 15_000, 50_000]).is_ok());
    }
}
