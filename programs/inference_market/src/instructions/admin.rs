use anchor_lang::prelude::*;
use crate::constants::*;
use crate::errors::MarketErrorCode;
use crate::state::{MarketConfig, PriceBounds};

/// Initializes the market configuration with default parameters.
/// This must be called once before any other market operation.
pub fn initialize_market_config_handler(
    ctx: Context<InitializeMarketConfig>,
    registry_authority: Pubkey,
    demand_reporter: Pubkey,
    usage_reporter: Pubkey,
    stable_mint: Pubkey,
) -> Result<()> {
    require!(stable_mint != NATIVE_TOKEN, MarketErrorCode::NativeTokenOverride);

    let config = &mut ctx.accounts.market_config;
    config.authority = ctx.accounts.authority.key();
    config.registry_authority = registry_authority;
    config.demand_reporter = demand_reporter;
    config.usage_reporter = usage_reporter;
    config.stable_mint = stable_mint;
    config.bounds = PriceBounds::default();
    config.surge_thresholds = DEFAULT_SURGE_THRESHOLDS;
    config.surge_multipliers = DEFAULT_SURGE_MULTIPLIERS;
    config.peak_start_hour = DEFAULT_PEAK_START_HOUR;
    config.peak_end_hour = DEFAULT_PEAK_END_HOUR;
    config.peak_multiplier_bps = DEFAULT_PEAK_MULTIPLIER_BPS;
    config.regional_multipliers = Vec::new();
    config.high_utilization = DEFAULT_HIGH_UTILIZATION;
    config.low_utilization = DEFAULT_LOW_UTILIZATION;
    config.utilization_premium_bps = DEFAULT_UTILIZATION_PREMIUM_BPS;
    config.utilization_discount_bps = DEFAULT_UTILIZATION_DISCOUNT_BPS;
    config.automatic_adjustments_enabled = false;
    config.auto_adjust_step_bps = DEFAULT_AUTO_ADJUST_STEP_BPS;
    config.auto_adjust_cooldown = DEFAULT_AUTO_ADJUST_COOLDOWN;
    config.sustained_demand_window = DEFAULT_SUSTAINED_DEMAND_WINDOW;
    config.host_registrations = 0;
    config.bump = ctx.bumps.market_config;

    msg!("Market config initialized by {}", config.authority);

    emit!(MarketConfigInitialized {
        authority: config.authority,
        registry_authority,
        stable_mint,
    });

    Ok(())
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default)]
pub struct MarketConfigUpdate {
    pub new_authority: Option<Pubkey>,
    pub registry_authority: Option<Pubkey>,
    pub demand_reporter: Option<Pubkey>,
    pub usage_reporter: Option<Pubkey>,
    pub bounds: Option<PriceBounds>,
    pub utilization_thresholds: Option<UtilizationThresholds>,
    pub utilization_premium_bps: Option<u16>,
    pub utilization_discount_bps: Option<u16>,
    pub auto_adjust_step_bps: Option<u16>,
    pub auto_adjust_cooldown: Option<i64>,
    pub sustained_demand_window: Option<i64>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug)]
pub struct UtilizationThresholds {
    pub low: u8,  // percent
    pub high: u8, // percent
}

/// Updates governance parameters. Every field is validated before any is
/// written, so a rejected update leaves the config untouched.
pub fn update_market_config_handler(
    ctx: Context<GovernConfig>,
    update: MarketConfigUpdate,
) -> Result<()> {
    if let Some(bounds) = &update.bounds {
        bounds.validate()?;
        ctx.accounts.market_config.bounds.check_widening(bounds)?;
    }
    if let Some(t) = &update.utilization_thresholds {
        require!(t.low < t.high && t.high <= 100, MarketErrorCode::InvalidUtilizationThresholds);
    }
    for bps in [update.utilization_premium_bps, update.utilization_discount_bps]
        .into_iter()
        .flatten()
    {
        require!(bps as u64 <= BPS_DENOMINATOR, MarketErrorCode::InvalidMultiplier);
    }
    if let Some(step) = update.auto_adjust_step_bps {
        require!(
            step > 0 && step <= MAX_AUTO_ADJUST_STEP_BPS,
            MarketErrorCode::InvalidAdjustmentStep
        );
    }
    for duration in [update.auto_adjust_cooldown, update.sustained_demand_window]
        .into_iter()
        .flatten()
    {
        require!(duration > 0, MarketErrorCode::InvalidDuration);
    }

    let config = &mut ctx.accounts.market_config;
    update_if_some(&mut config.authority, update.new_authority);
    update_if_some(&mut config.registry_authority, update.registry_authority);
    update_if_some(&mut config.demand_reporter, update.demand_reporter);
    update_if_some(&mut config.usage_reporter, update.usage_reporter);
    update_if_some(&mut config.bounds, update.bounds);
    if let Some(t) = &update.utilization_thresholds {
        config.set_utilization_thresholds(t.low, t.high)?;
    }
    update_if_some(&mut config.utilization_premium_bps, update.utilization_premium_bps);
    update_if_some(&mut config.utilization_discount_bps, update.utilization_discount_bps);
    update_if_some(&mut config.auto_adjust_step_bps, update.auto_adjust_step_bps);
    update_if_some(&mut config.auto_adjust_cooldown, update.auto_adjust_cooldown);
    update_if_some(&mut config.sustained_demand_window, update.sustained_demand_window);

    emit!(MarketConfigUpdated {
        authority: ctx.accounts.authority.key(),
        new_authority: update.new_authority,
        bounds: update.bounds,
    });

    Ok(())
}

/// Turns the autonomous price-increase path on or off for the deployment.
pub fn enable_automatic_adjustments_handler(ctx: Context<GovernConfig>, enabled: bool) -> Result<()> {
    let config = &mut ctx.accounts.market_config;
    config.automatic_adjustments_enabled = enabled;

    msg!("Automatic adjustments enabled: {}", enabled);

    emit!(AutomaticAdjustmentsToggled {
        authority: ctx.accounts.authority.key(),
        enabled,
    });

    Ok(())
}

fn update_if_some<T>(field: &mut T, new_value: Option<T>) {
    if let Some(value) = new_value {
        *field = value;
    }
}

// Account contexts:

#[derive(Accounts)]
pub struct InitializeMarketConfig<'info> {
    #[account(
        init,
        payer = authority,
        space = MarketConfig::SIZE,
        seeds = [MARKET_CONFIG_SEED],
        bump
    )]
    pub market_config: Account<'info, MarketConfig>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Any governance-only write to the global configuration.
#[derive(Accounts)]
pub struct GovernConfig<'info> {
    #[account(
        mut,
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
        has_one = authority @ MarketErrorCode::UnauthorizedGovernance,
    )]
    pub market_config: Account<'info, MarketConfig>,

    pub authority: Signer<'info>,
}

// Events:

#[event]
pub struct MarketConfigInitialized {
    pub authority: Pubkey,
    pub registry_authority: Pubkey,
    pub stable_mint: Pubkey,
}

#[event]
pub struct MarketConfigUpdated {
    pub authority: Pubkey,
    pub new_authority: Option<Pubkey>,
    pub bounds: Option<PriceBounds>,
}

#[event]
pub struct AutomaticAdjustmentsToggled {
    pub authority: Pubkey,
    pub enabled: bool,
}
