use anchor_lang::prelude::*;

declare_id!("6Qj2WJcAmvQUh6tTYMT1yuDLL6eSpp8cFY9PzPLCeSgj");

pub mod constants;
pub mod errors;
pub mod instructions;
pub mod state;
pub mod utils;

pub use errors::*;
pub use instructions::*;
pub use state::*;

#[program]
pub mod inference_market {
    use super::*;

    // Governance

    pub fn initialize_market_config(
        ctx: Context<InitializeMarketConfig>,
        registry_authority: Pubkey,
        demand_reporter: Pubkey,
        usage_reporter: Pubkey,
        stable_mint: Pubkey,
    ) -> Result<()> {
        initialize_market_config_handler(ctx, registry_authority, demand_reporter, usage_reporter, stable_mint)
    }

    pub fn update_market_config(ctx: Context<GovernConfig>, update: MarketConfigUpdate) -> Result<()> {
        update_market_config_handler(ctx, update)
    }

    pub fn enable_automatic_adjustments(ctx: Context<GovernConfig>, enabled: bool) -> Result<()> {
        enable_automatic_adjustments_handler(ctx, enabled)
    }

    // Host registry

    pub fn register_host(
        ctx: Context<RegisterHost>,
        host_authority: Pubkey,
        region: String,
        supported_models: Vec<[u8; 32]>,
    ) -> Result<()> {
        register_host_handler(ctx, host_authority, region, supported_models)
    }

    pub fn set_host_models(ctx: Context<UpdateHostRegistration>, supported_models: Vec<[u8; 32]>) -> Result<()> {
        set_host_models_handler(ctx, supported_models)
    }

    pub fn unregister_host(ctx: Context<UnregisterHost>) -> Result<()> {
        unregister_host_handler(ctx)
    }

    // Price store

    pub fn set_default_pricing(
        ctx: Context<UpdateDefaultPricing>,
        native_price: u64,
        stable_price: u64,
    ) -> Result<()> {
        set_default_pricing_handler(ctx, native_price, stable_price)
    }

    pub fn set_model_override(
        ctx: Context<UpdateModelOverride>,
        model_id: [u8; 32],
        native_price: u64,
        stable_price: u64,
    ) -> Result<()> {
        set_model_override_handler(ctx, model_id, native_price, stable_price)
    }

    pub fn clear_model_override(ctx: Context<ClearModelOverride>, model_id: [u8; 32]) -> Result<()> {
        clear_model_override_handler(ctx, model_id)
    }

    pub fn set_token_override(ctx: Context<UpdateTokenOverride>, token: Pubkey, price: u64) -> Result<()> {
        set_token_override_handler(ctx, token, price)
    }

    pub fn set_bulk_prices<'info>(
        ctx: Context<'_, '_, '_, 'info, SetBulkPrices<'info>>,
        model_ids: Vec<[u8; 32]>,
        native_prices: Vec<u64>,
        stable_prices: Vec<u64>,
    ) -> Result<()> {
        set_bulk_prices_handler(ctx, model_ids, native_prices, stable_prices)
    }

    pub fn resolve_model_price(
        ctx: Context<ResolveModelPrice>,
        host: Pubkey,
        model_id: [u8; 32],
        is_native: bool,
    ) -> Result<u64> {
        resolve_model_price_handler(ctx, host, model_id, is_native)
    }

    pub fn resolve_token_price(ctx: Context<ResolveTokenPrice>, host: Pubkey, token: Pubkey) -> Result<u64> {
        resolve_token_price_handler(ctx, host, token)
    }

    pub fn get_all_overrides<'info>(
        ctx: Context<'_, '_, '_, 'info, GetAllOverrides<'info>>,
        host: Pubkey,
    ) -> Result<Vec<ModelPriceView>> {
        get_all_overrides_handler(ctx, host)
    }

    // Quotes

    pub fn set_volume_discount(
        ctx: Context<UpdateVolumeDiscount>,
        model_id: [u8; 32],
        tiers: Vec<DiscountTier>,
    ) -> Result<()> {
        set_volume_discount_handler(ctx, model_id, tiers)
    }

    pub fn calculate_quote(
        ctx: Context<QuoteAccounts>,
        host: Pubkey,
        model_id: [u8; 32],
        token: Pubkey,
        volume: u64,
    ) -> Result<u64> {
        calculate_quote_handler(ctx, host, model_id, token, volume)
    }

    pub fn generate_quote(
        ctx: Context<GenerateQuote>,
        host: Pubkey,
        model_id: [u8; 32],
        token: Pubkey,
        volume: u64,
    ) -> Result<PriceQuote> {
        generate_quote_handler(ctx, host, model_id, token, volume)
    }

    pub fn compare_prices<'info>(
        ctx: Context<'_, '_, '_, 'info, ComparePrices>,
        model_id: [u8; 32],
        tokens: Vec<Pubkey>,
    ) -> Result<Vec<HostPriceView>> {
        compare_prices_handler(ctx, model_id, tokens)
    }

    // Demand

    pub fn record_request(ctx: Context<RecordRequest>, model_id: [u8; 32]) -> Result<()> {
        record_request_handler(ctx, model_id)
    }

    pub fn roll_demand_window(ctx: Context<RollDemandWindow>, model_id: [u8; 32]) -> Result<()> {
        roll_demand_window_handler(ctx, model_id)
    }

    pub fn snapshot_demand(ctx: Context<ReadDemand>, model_id: [u8; 32]) -> Result<u64> {
        snapshot_demand_handler(ctx, model_id)
    }

    pub fn forecast_demand(
        ctx: Context<ReadDemand>,
        model_id: [u8; 32],
        at_timestamp: i64,
        window_duration: i64,
    ) -> Result<u64> {
        forecast_demand_handler(ctx, model_id, at_timestamp, window_duration)
    }

    // Surge

    pub fn set_surge_thresholds(ctx: Context<GovernConfig>, thresholds: [u64; 3]) -> Result<()> {
        set_surge_thresholds_handler(ctx, thresholds)
    }

    pub fn set_surge_multipliers(ctx: Context<GovernConfig>, multipliers: [u16; 3]) -> Result<()> {
        set_surge_multipliers_handler(ctx, multipliers)
    }

    pub fn set_price_cap(ctx: Context<SetPriceCap>, model_id: [u8; 32], price_cap: u64) -> Result<()> {
        set_price_cap_handler(ctx, model_id, price_cap)
    }

    pub fn update_surge_pricing(ctx: Context<UpdateSurgePricing>, model_id: [u8; 32]) -> Result<()> {
        update_surge_pricing_handler(ctx, model_id)
    }

    pub fn get_surge_price(ctx: Context<ReadSurge>, model_id: [u8; 32], base_price: u64) -> Result<u64> {
        get_surge_price_handler(ctx, model_id, base_price)
    }

    // Time and region

    pub fn set_peak_hours(ctx: Context<GovernConfig>, start_hour: u8, end_hour: u8) -> Result<()> {
        set_peak_hours_handler(ctx, start_hour, end_hour)
    }

    pub fn set_peak_price_multiplier(ctx: Context<GovernConfig>, multiplier_bps: u16) -> Result<()> {
        set_peak_price_multiplier_handler(ctx, multiplier_bps)
    }

    pub fn set_regional_multiplier(
        ctx: Context<GovernConfig>,
        region: String,
        multiplier_bps: u16,
    ) -> Result<()> {
        set_regional_multiplier_handler(ctx, region, multiplier_bps)
    }

    pub fn get_time_adjusted_price(
        ctx: Context<ReadMarketConfig>,
        model_id: [u8; 32],
        base_price: u64,
    ) -> Result<u64> {
        get_time_adjusted_price_handler(ctx, model_id, base_price)
    }

    pub fn get_regional_price(ctx: Context<ReadMarketConfig>, region: String, base_price: u64) -> Result<u64> {
        get_regional_price_handler(ctx, region, base_price)
    }

    // Market adviser

    pub fn enable_market_pricing(
        ctx: Context<EnableMarketPricing>,
        model_id: [u8; 32],
        enabled: bool,
    ) -> Result<()> {
        enable_market_pricing_handler(ctx, model_id, enabled)
    }

    pub fn record_host_usage(
        ctx: Context<RecordHostUsage>,
        model_id: [u8; 32],
        host: Pubkey,
        share: u64,
    ) -> Result<()> {
        record_host_usage_handler(ctx, model_id, host, share)
    }

    pub fn get_suggested_market_price(
        ctx: Context<ReadHostMarket>,
        host: Pubkey,
        model_id: [u8; 32],
        is_native: bool,
    ) -> Result<u64> {
        get_suggested_market_price_handler(ctx, host, model_id, is_native)
    }

    pub fn update_host_utilization(ctx: Context<UpdateHostUtilization>, utilization_percent: u8) -> Result<()> {
        update_host_utilization_handler(ctx, utilization_percent)
    }

    pub fn get_utilization_adjusted_price(
        ctx: Context<ReadUtilization>,
        host: Pubkey,
        base_price: u64,
    ) -> Result<u64> {
        get_utilization_adjusted_price_handler(ctx, host, base_price)
    }

    pub fn get_competitive_price(
        ctx: Context<ReadMarket>,
        host: Pubkey,
        model_id: [u8; 32],
        band_bps: u16,
        is_native: bool,
    ) -> Result<u64> {
        get_competitive_price_handler(ctx, host, model_id, band_bps, is_native)
    }

    pub fn perform_automatic_adjustment(
        ctx: Context<PerformAutomaticAdjustment>,
        host: Pubkey,
        model_id: [u8; 32],
    ) -> Result<()> {
        perform_automatic_adjustment_handler(ctx, host, model_id)
    }
}
