use anchor_lang::prelude::*;

pub const BPS_DENOMINATOR: u64 = 10_000;
pub const MAX_MULTIPLIER_BPS: u16 = 50_000; // 5x

// Native token (SOL) price per inference token, in lamports
pub const MIN_PRICE_NATIVE: u64 = 1_000;
pub const MAX_PRICE_NATIVE: u64 = 10_000_000;

// Stablecoin price per inference token, in micro-units (6 decimals)
pub const MIN_PRICE_STABLE: u64 = 10;
pub const MAX_PRICE_STABLE: u64 = 100_000;

/// The reserved address that selects native-currency pricing.
pub const NATIVE_TOKEN: Pubkey = Pubkey::new_from_array([0u8; 32]);

// Surge defaults: low / medium / high
pub const DEFAULT_SURGE_THRESHOLDS: [u64; 3] = [50, 100, 200];
pub const DEFAULT_SURGE_MULTIPLIERS: [u16; 3] = [12_000, 15_000, 20_000];

// Peak hours, UTC, half-open [start, end)
pub const DEFAULT_PEAK_START_HOUR: u8 = 9;
pub const DEFAULT_PEAK_END_HOUR: u8 = 17;
pub const DEFAULT_PEAK_MULTIPLIER_BPS: u16 = 12_500;

// Utilization based pricing
pub const DEFAULT_HIGH_UTILIZATION: u8 = 80;
pub const DEFAULT_LOW_UTILIZATION: u8 = 20;
pub const DEFAULT_UTILIZATION_PREMIUM_BPS: u16 = 2_000;
pub const DEFAULT_UTILIZATION_DISCOUNT_BPS: u16 = 1_000;

// Automatic adjustment
pub const DEFAULT_AUTO_ADJUST_STEP_BPS: u16 = 1_000; // +10%
pub const MAX_AUTO_ADJUST_STEP_BPS: u16 = 5_000;
pub const DEFAULT_AUTO_ADJUST_COOLDOWN: i64 = 24 * 60 * 60;
pub const DEFAULT_SUSTAINED_DEMAND_WINDOW: i64 = 60 * 60;

pub const SECONDS_PER_HOUR: i64 = 3_600;
pub const SECONDS_PER_DAY: i64 = 86_400;
pub const QUOTE_VALIDITY_SECONDS: i64 = 300;
pub const MIN_FORECAST_SAMPLES: usize = 7;

// Storage limits
pub const MAX_SUPPORTED_MODELS: usize = 16;
pub const MAX_REGIONS: usize = 16;
pub const MAX_REGION_LEN: usize = 32;
pub const MAX_DISCOUNT_TIERS: usize = 5;
pub const MAX_PRICE_HISTORY: usize = 10;
pub const DEMAND_HISTORY_DAYS: usize = 28;
pub const MAX_MARKET_PARTICIPANTS: usize = 16;
pub const MAX_BULK_PRICES: usize = 8;

// PDA seeds
pub const MARKET_CONFIG_SEED: &[u8] = b"market_config";
pub const HOST_SEED: &[u8] = b"host";
pub const MODEL_OVERRIDE_SEED: &[u8] = b"model_override";
pub const TOKEN_OVERRIDE_SEED: &[u8] = b"token_override";
pub const VOLUME_DISCOUNT_SEED: &[u8] = b"volume_discount";
pub const DEMAND_SEED: &[u8] = b"demand";
pub const SURGE_SEED: &[u8] = b"surge";
pub const MARKET_SEED: &[u8] = b"market";

pub const REASON_SUSTAINED_DEMAND: &str = "sustained_high_demand";
