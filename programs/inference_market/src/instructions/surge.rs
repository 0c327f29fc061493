use anchor_lang::prelude::*;
use crate::constants::*;
use crate::errors::MarketErrorCode;
use crate::instructions::GovernConfig;
use crate::state::{MarketConfig, ModelDemand, SurgeState, SurgeTransition, TIER_NONE};
use crate::utils::load_optional;

pub fn set_surge_thresholds_handler(ctx: Context<GovernConfig>, thresholds: [u64; 3]) -> Result<()> {
    let config = &mut ctx.accounts.market_config;
    config.set_surge_thresholds(thresholds)?;

    emit!(SurgeConfigUpdated {
        thresholds: config.surge_thresholds,
        multipliers: config.surge_multipliers,
    });
    Ok(())
}

pub fn set_surge_multipliers_handler(ctx: Context<GovernConfig>, multipliers: [u16; 3]) -> Result<()> {
    let config = &mut ctx.accounts.market_config;
    config.set_surge_multipliers(multipliers)?;

    emit!(SurgeConfigUpdated {
        thresholds: config.surge_thresholds,
        multipliers: config.surge_multipliers,
    });
    Ok(())
}

/// Sets an absolute ceiling on the surged price of a model. 0 removes it.
pub fn set_price_cap_handler(ctx: Context<SetPriceCap>, model_id: [u8; 32], price_cap: u64) -> Result<()> {
    let surge = &mut ctx.accounts.surge_state;
    init_surge_state(surge, model_id, ctx.bumps.surge_state);
    surge.price_cap = price_cap;

    msg!("price cap set to {}", price_cap);
    Ok(())
}

/// Re-evaluates the surge tier of a model from its current demand.
/// Surge state only ever moves through this call, paid for by the caller.
pub fn update_surge_pricing_handler(ctx: Context<UpdateSurgePricing>, model_id: [u8; 32]) -> Result<()> {
    let config = &ctx.accounts.market_config;
    let clock = Clock::get()?;
    let demand = load_optional::<ModelDemand>(&ctx.accounts.demand)?
        .map(|d| d.count_at(clock.unix_timestamp))
        .unwrap_or(0);

    let surge = &mut ctx.accounts.surge_state;
    init_surge_state(surge, model_id, ctx.bumps.surge_state);

    match surge.apply_demand(
        demand,
        &config.surge_thresholds,
        &config.surge_multipliers,
        clock.unix_timestamp,
    ) {
        SurgeTransition::Activated { tier, multiplier_bps } => {
            msg!("surge tier {} at demand {}", tier, demand);
            emit!(SurgePricingActivated {
                model_id,
                demand,
                tier,
                multiplier_bps,
                price_cap: surge.price_cap,
            });
        }
        SurgeTransition::Deactivated => {
            emit!(SurgePricingDeactivated { model_id, demand });
        }
        SurgeTransition::Unchanged => {
            msg!("surge unchanged: multiplier={} demand={}", surge.multiplier(), demand);
        }
    }

    Ok(())
}

/// `base_price` under the model's current surge multiplier and cap.
pub fn get_surge_price_handler(ctx: Context<ReadSurge>, _model_id: [u8; 32], base_price: u64) -> Result<u64> {
    let price = match load_optional::<SurgeState>(&ctx.accounts.surge_state)? {
        Some(surge) => surge.surge_price(base_price)?,
        None => base_price,
    };

    msg!("surge price: {}", price);
    Ok(price)
}

fn init_surge_state(surge: &mut SurgeState, model_id: [u8; 32], bump: u8) {
    if surge.multiplier_bps == 0 {
        surge.model_id = model_id;
        surge.active = false;
        surge.tier = TIER_NONE;
        surge.multiplier_bps = BPS_DENOMINATOR as u16;
        surge.bump = bump;
    }
}

// Account contexts:

#[derive(Accounts)]
#[instruction(model_id: [u8; 32])]
pub struct SetPriceCap<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
        has_one = authority @ MarketErrorCode::UnauthorizedGovernance,
    )]
    pub market_config: Account<'info, MarketConfig>,

    #[account(
        init_if_needed,
        payer = authority,
        space = SurgeState::SIZE,
        seeds = [SURGE_SEED, model_id.as_ref()],
        bump
    )]
    pub surge_state: Account<'info, SurgeState>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(model_id: [u8; 32])]
pub struct UpdateSurgePricing<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
    )]
    pub market_config: Account<'info, MarketConfig>,

    /// CHECK: Demand PDA, possibly never created; decoded in the handler
    #[account(seeds = [DEMAND_SEED, model_id.as_ref()], bump)]
    pub demand: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = caller,
        space = SurgeState::SIZE,
        seeds = [SURGE_SEED, model_id.as_ref()],
        bump
    )]
    pub surge_state: Account<'info, SurgeState>,

    #[account(mut)]
    pub caller: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(model_id: [u8; 32])]
pub struct ReadSurge<'info> {
    /// CHECK: Surge PDA, possibly never created; decoded in the handler
    #[account(seeds = [SURGE_SEED, model_id.as_ref()], bump)]
    pub surge_state: UncheckedAccount<'info>,
}

// Events:

#[event]
pub struct SurgeConfigUpdated {
    pub thresholds: [u64; 3],
    pub multipliers: [u16; 3],
}

#[event]
pub struct SurgePricingActivated {
    pub model_id: [u8; 32],
    pub demand: u64,
    pub tier: u8,
    pub multiplier_bps: u16,
    pub price_cap: u64, // 0 = uncapped
}

#[event]
pub struct SurgePricingDeactivated {
    pub model_id: [u8; 32],
    pub demand: u64,
}
