use anchor_lang::prelude::*;
use crate::constants::MARKET_CONFIG_SEED;
use crate::instructions::GovernConfig;
use crate::state::MarketConfig;
use crate::utils::hour_of_day;

pub fn set_peak_hours_handler(ctx: Context<GovernConfig>, start_hour: u8, end_hour: u8) -> Result<()> {
    let config = &mut ctx.accounts.market_config;
    config.set_peak_hours(start_hour, end_hour)?;

    emit!(PeakHoursUpdated {
        start_hour,
        end_hour,
        multiplier_bps: config.peak_multiplier_bps,
    });
    Ok(())
}

pub fn set_peak_price_multiplier_handler(ctx: Context<GovernConfig>, multiplier_bps: u16) -> Result<()> {
    let config = &mut ctx.accounts.market_config;
    config.set_peak_multiplier(multiplier_bps)?;

    emit!(PeakHoursUpdated {
        start_hour: config.peak_start_hour,
        end_hour: config.peak_end_hour,
        multiplier_bps,
    });
    Ok(())
}

/// Adds or replaces the multiplier for a region label.
pub fn set_regional_multiplier_handler(
    ctx: Context<GovernConfig>,
    region: String,
    multiplier_bps: u16,
) -> Result<()> {
    let config = &mut ctx.accounts.market_config;
    config.upsert_regional_multiplier(region.clone(), multiplier_bps)?;

    emit!(RegionalMultiplierUpdated { region, multiplier_bps });
    Ok(())
}

/// `base_price` with the peak multiplier applied if the current UTC hour
/// is inside the peak window. Surge state is not consulted.
pub fn get_time_adjusted_price_handler(
    ctx: Context<ReadMarketConfig>,
    _model_id: [u8; 32],
    base_price: u64,
) -> Result<u64> {
    let clock = Clock::get()?;
    let hour = hour_of_day(clock.unix_timestamp);
    let price = ctx.accounts.market_config.time_adjusted_price(hour, base_price)?;

    msg!("time adjusted price at hour {}: {}", hour, price);
    Ok(price)
}

/// `base_price` scaled by the region's multiplier; unknown regions are neutral.
pub fn get_regional_price_handler(
    ctx: Context<ReadMarketConfig>,
    region: String,
    base_price: u64,
) -> Result<u64> {
    let price = ctx.accounts.market_config.regional_price(&region, base_price)?;

    msg!("regional price for {}: {}", region, price);
    Ok(price)
}

// Account contexts:

#[derive(Accounts)]
pub struct ReadMarketConfig<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
    )]
    pub market_config: Account<'info, MarketConfig>,
}

// Events:

#[event]
pub struct PeakHoursUpdated {
    pub start_hour: u8,
    pub end_hour: u8,
    pub multiplier_bps: u16,
}

#[event]
pub struct RegionalMultiplierUpdated {
    pub region: String,
    pub multiplier_bps: u16,
}
