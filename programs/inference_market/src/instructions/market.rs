use anchor_lang::prelude::*;
use crate::constants::*;
use crate::errors::MarketErrorCode;
use crate::instructions::PriceSet;
use crate::state::{resolve_model_price, Host, MarketConfig, ModelMarket, ModelPriceOverride, SurgeState};
use crate::utils::{apply_bps, load_optional};

pub fn enable_market_pricing_handler(
    ctx: Context<EnableMarketPricing>,
    model_id: [u8; 32],
    enabled: bool,
) -> Result<()> {
    let market = &mut ctx.accounts.market;
    market.model_id = model_id;
    market.enabled = enabled;
    market.bump = ctx.bumps.market;

    emit!(MarketPricingToggled { model_id, enabled });
    Ok(())
}

/// Adds observed traffic for a host and snapshots its current prices.
/// Recorded for suggestions only, never for billing.
pub fn record_host_usage_handler(
    ctx: Context<RecordHostUsage>,
    model_id: [u8; 32],
    _host: Pubkey,
    share: u64,
) -> Result<()> {
    let host: &Host = &ctx.accounts.host_record;
    let model_override = load_optional::<ModelPriceOverride>(&ctx.accounts.model_override)?;
    let native_price = resolve_model_price(Some(host), model_override.as_ref(), true);
    let stable_price = resolve_model_price(Some(host), model_override.as_ref(), false);
    let clock = Clock::get()?;

    let market = &mut ctx.accounts.market;
    market.model_id = model_id;
    market.bump = ctx.bumps.market;
    let host_share = market.record_usage(
        host.authority,
        share,
        native_price,
        stable_price,
        clock.unix_timestamp,
    )?;

    msg!("usage for {}: share={} total={}", host.authority, host_share, market.total_share);
    Ok(())
}

/// Suggested price for a host given how its traffic compares to cheaper
/// competitors. Never above the host's live price, never outside bounds.
pub fn get_suggested_market_price_handler(
    ctx: Context<ReadHostMarket>,
    host: Pubkey,
    _model_id: [u8; 32],
    is_native: bool,
) -> Result<u64> {
    let market = load_optional::<ModelMarket>(&ctx.accounts.market)?
        .ok_or(MarketErrorCode::MarketPricingDisabled)?;
    let host_record = load_optional::<Host>(&ctx.accounts.host_record)?
        .filter(|h| h.active)
        .ok_or(MarketErrorCode::HostNotRegistered)?;
    let model_override = load_optional::<ModelPriceOverride>(&ctx.accounts.model_override)?;

    let current = resolve_model_price(Some(&host_record), model_override.as_ref(), is_native);
    let suggested = market.suggested_price(&host, current, is_native, &ctx.accounts.market_config.bounds)?;

    msg!("suggested market price: {} (current {})", suggested, current);
    Ok(suggested)
}

/// Stores the host's self-reported utilization percentage.
pub fn update_host_utilization_handler(ctx: Context<UpdateHostUtilization>, utilization_percent: u8) -> Result<()> {
    require!(utilization_percent <= 100, MarketErrorCode::InvalidUtilization);

    let host = &mut ctx.accounts.host;
    let clock = Clock::get()?;
    host.utilization_percent = utilization_percent;
    host.utilization_updated_at = clock.unix_timestamp;

    emit!(UtilizationUpdated {
        host: host.authority,
        utilization_percent,
        timestamp: clock.unix_timestamp,
    });
    Ok(())
}

pub fn get_utilization_adjusted_price_handler(
    ctx: Context<ReadUtilization>,
    _host: Pubkey,
    base_price: u64,
) -> Result<u64> {
    let host = load_optional::<Host>(&ctx.accounts.host_record)?
        .filter(|h| h.active)
        .ok_or(MarketErrorCode::HostNotRegistered)?;
    let price = ctx
        .accounts
        .market_config
        .utilization_adjusted_price(host.utilization_percent, base_price)?;

    msg!("utilization {}% adjusted price: {}", host.utilization_percent, price);
    Ok(price)
}

/// Band-limited price just under the market average for the model.
/// The result does not depend on which host asks.
pub fn get_competitive_price_handler(
    ctx: Context<ReadMarket>,
    _host: Pubkey,
    _model_id: [u8; 32],
    band_bps: u16,
    is_native: bool,
) -> Result<u64> {
    let market = load_optional::<ModelMarket>(&ctx.accounts.market)?
        .ok_or(MarketErrorCode::NoMarketData)?;
    let price = market.competitive_price(band_bps, is_native, &ctx.accounts.market_config.bounds)?;

    msg!("competitive price: {}", price);
    Ok(price)
}

/// Raises a host's stored model prices by one step after demand has held
/// at the top surge tier for the sustain window. At most once per cooldown.
pub fn perform_automatic_adjustment_handler(
    ctx: Context<PerformAutomaticAdjustment>,
    _host: Pubkey,
    model_id: [u8; 32],
) -> Result<()> {
    // Check trigger conditions
    let config = &ctx.accounts.market_config;
    require!(
        config.automatic_adjustments_enabled,
        MarketErrorCode::AutomaticAdjustmentsDisabled
    );

    let host: &Host = &ctx.accounts.host_record;
    require!(host.supports_model(&model_id), MarketErrorCode::ModelNotSupported);

    let clock = Clock::get()?;
    let now = clock.unix_timestamp;
    let sustained = load_optional::<SurgeState>(&ctx.accounts.surge_state)?
        .map(|s| s.sustained_high(now, config.sustained_demand_window))
        .unwrap_or(false);
    require!(sustained, MarketErrorCode::DemandNotSustained);

    // One adjustment per cooldown period
    let model_override = &mut ctx.accounts.model_override;
    model_override.reset_if_orphaned(host);
    model_override.bump = ctx.bumps.model_override;

    let last = model_override.last_auto_adjustment_at;
    require!(
        last == 0 || now.saturating_sub(last) >= config.auto_adjust_cooldown,
        MarketErrorCode::AdjustmentCooldownActive
    );

    // Raise each currency class by one step, capped at the maximum
    let step = BPS_DENOMINATOR + config.auto_adjust_step_bps as u64;
    let mut next = [0u64; 2];
    let mut changes = Vec::with_capacity(2);
    for (i, is_native) in [true, false].into_iter().enumerate() {
        let current = resolve_model_price(Some(host), Some(&**model_override), is_native);
        let (_, max) = config.bounds.range(is_native);
        let raised = apply_bps(current, step)?.min(max);
        if raised > current {
            next[i] = raised;
            changes.push((is_native, current, raised));
        } else {
            next[i] = model_override.price(is_native);
        }
    }
    require!(!changes.is_empty(), MarketErrorCode::PriceAtMaximum);

    // Persist and report
    model_override.set_prices(host, model_id, next[0], next[1], config.stable_mint, now);
    model_override.last_auto_adjustment_at = now;

    for (is_native, old_price, new_price) in changes {
        let token = if is_native { NATIVE_TOKEN } else { config.stable_mint };
        msg!("auto adjustment {} -> {}", old_price, new_price);
        emit!(PriceAdjusted {
            host: host.authority,
            model_id,
            token,
            old_price,
            new_price,
            reason: REASON_SUSTAINED_DEMAND.to_string(),
        });
        emit!(PriceSet {
            host: host.authority,
            model_id,
            token,
            old_price,
            new_price,
            timestamp: now,
        });
    }

    Ok(())
}

// Account contexts:

#[derive(Accounts)]
#[instruction(model_id: [u8; 32])]
pub struct EnableMarketPricing<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
        has_one = authority @ MarketErrorCode::UnauthorizedGovernance,
    )]
    pub market_config: Account<'info, MarketConfig>,

    #[account(
        init_if_needed,
        payer = authority,
        space = ModelMarket::SIZE,
        seeds = [MARKET_SEED, model_id.as_ref()],
        bump
    )]
    pub market: Account<'info, ModelMarket>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(model_id: [u8; 32], host: Pubkey)]
pub struct RecordHostUsage<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
        has_one = usage_reporter @ MarketErrorCode::UnauthorizedUsageReporter,
    )]
    pub market_config: Account<'info, MarketConfig>,

    #[account(
        seeds = [HOST_SEED, host.as_ref()],
        bump = host_record.bump,
        constraint = host_record.active @ MarketErrorCode::HostNotRegistered,
    )]
    pub host_record: Account<'info, Host>,

    /// CHECK: Override PDA, possibly never created; decoded in the handler
    #[account(seeds = [MODEL_OVERRIDE_SEED, host.as_ref(), model_id.as_ref()], bump)]
    pub model_override: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = usage_reporter,
        space = ModelMarket::SIZE,
        seeds = [MARKET_SEED, model_id.as_ref()],
        bump
    )]
    pub market: Account<'info, ModelMarket>,

    #[account(mut)]
    pub usage_reporter: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(host: Pubkey, model_id: [u8; 32])]
pub struct ReadHostMarket<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
    )]
    pub market_config: Account<'info, MarketConfig>,

    /// CHECK: Host record, possibly closed; decoded in the handler
    #[account(seeds = [HOST_SEED, host.as_ref()], bump)]
    pub host_record: UncheckedAccount<'info>,

    /// CHECK: Override PDA, possibly never created; decoded in the handler
    #[account(seeds = [MODEL_OVERRIDE_SEED, host.as_ref(), model_id.as_ref()], bump)]
    pub model_override: UncheckedAccount<'info>,

    /// CHECK: Market PDA, possibly never created; decoded in the handler
    #[account(seeds = [MARKET_SEED, model_id.as_ref()], bump)]
    pub market: UncheckedAccount<'info>,
}

#[derive(Accounts)]
pub struct UpdateHostUtilization<'info> {
    #[account(
        mut,
        seeds = [HOST_SEED, authority.key().as_ref()],
        bump = host.bump,
        has_one = authority @ MarketErrorCode::UnauthorizedHost,
        constraint = host.active @ MarketErrorCode::UnauthorizedHost,
    )]
    pub host: Account<'info, Host>,

    pub authority: Signer<'info>,
}

#[derive(Accounts)]
#[instruction(host: Pubkey)]
pub struct ReadUtilization<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
    )]
    pub market_config: Account<'info, MarketConfig>,

    /// CHECK: Host record, possibly closed; decoded in the handler
    #[account(seeds = [HOST_SEED, host.as_ref()], bump)]
    pub host_record: UncheckedAccount<'info>,
}

#[derive(Accounts)]
#[instruction(host: Pubkey, model_id: [u8; 32])]
pub struct ReadMarket<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
    )]
    pub market_config: Account<'info, MarketConfig>,

    /// CHECK: Market PDA, possibly never created; decoded in the handler
    #[account(seeds = [MARKET_SEED, model_id.as_ref()], bump)]
    pub market: UncheckedAccount<'info>,
}

#[derive(Accounts)]
#[instruction(host: Pubkey, model_id: [u8; 32])]
pub struct PerformAutomaticAdjustment<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
    )]
    pub market_config: Account<'info, MarketConfig>,

    #[account(
        seeds = [HOST_SEED, host.as_ref()],
        bump = host_record.bump,
        constraint = host_record.active @ MarketErrorCode::HostNotRegistered,
    )]
    pub host_record: Account<'info, Host>,

    /// CHECK: Surge PDA, possibly never created; decoded in the handler
    #[account(seeds = [SURGE_SEED, model_id.as_ref()], bump)]
    pub surge_state: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = caller,
        space = ModelPriceOverride::SIZE,
        seeds = [MODEL_OVERRIDE_SEED, host.as_ref(), model_id.as_ref()],
        bump
    )]
    pub model_override: Account<'info, ModelPriceOverride>,

    #[account(
        mut,
        constraint = caller.key() == host_record.authority
            || caller.key() == market_config.authority @ MarketErrorCode::UnauthorizedHost,
    )]
    pub caller: Signer<'info>,

    pub system_program: Program<'info, System>,
}

// Events:

#[event]
pub struct MarketPricingToggled {
    pub model_id: [u8; 32],
    pub enabled: bool,
}

#[event]
pub struct UtilizationUpdated {
    pub host: Pubkey,
    pub utilization_percent: u8,
    pub timestamp: i64,
}

#[event]
pub struct PriceAdjusted {
    pub host: Pubkey,
    pub model_id: [u8; 32],
    pub token: Pubkey,
    pub old_price: u64,
    pub new_price: u64,
    pub reason: String,
}
