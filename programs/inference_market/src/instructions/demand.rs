use anchor_lang::prelude::*;
use crate::constants::*;
use crate::errors::MarketErrorCode;
use crate::state::{MarketConfig, ModelDemand};
use crate::utils::load_optional;

/// Counts one completed match for a model on the current UTC day.
/// Only the configured demand reporter (the job matcher) may call this.
pub fn record_request_handler(ctx: Context<RecordRequest>, model_id: [u8; 32]) -> Result<()> {
    let demand = &mut ctx.accounts.demand;
    let clock = Clock::get()?;

    demand.model_id = model_id;
    demand.bump = ctx.bumps.demand;

    let count = demand.record(clock.unix_timestamp)?;
    msg!("demand recorded: count={}", count);
    Ok(())
}

/// Archives every UTC day that ended since the last roll and restarts
/// counting on today. Anyone may call it once the open day is over.
pub fn roll_demand_window_handler(ctx: Context<RollDemandWindow>, model_id: [u8; 32]) -> Result<()> {
    let demand = &mut ctx.accounts.demand;
    let clock = Clock::get()?;

    let window_started_at = demand.window_started_at;
    let closed = demand.roll(clock.unix_timestamp)?;

    emit!(DemandUpdated {
        model_id,
        window_started_at,
        window_count: closed,
        average_demand: demand.average_demand,
        samples: demand.history.len() as u8,
    });

    Ok(())
}

/// Requests counted so far today. Does not reset anything.
pub fn snapshot_demand_handler(ctx: Context<ReadDemand>, _model_id: [u8; 32]) -> Result<u64> {
    let clock = Clock::get()?;
    let current = load_optional::<ModelDemand>(&ctx.accounts.demand)?
        .map(|d| d.count_at(clock.unix_timestamp))
        .unwrap_or(0);

    msg!("current demand: {}", current);
    Ok(current)
}

/// Predicted request count for a window starting at `at_timestamp`.
pub fn forecast_demand_handler(
    ctx: Context<ReadDemand>,
    _model_id: [u8; 32],
    at_timestamp: i64,
    window_duration: i64,
) -> Result<u64> {
    let demand = load_optional::<ModelDemand>(&ctx.accounts.demand)?
        .ok_or(MarketErrorCode::InsufficientDemandHistory)?;
    let forecast = demand.forecast(at_timestamp, window_duration)?;

    msg!("forecast demand: {}", forecast);
    Ok(forecast)
}

// Account contexts:

#[derive(Accounts)]
#[instruction(model_id: [u8; 32])]
pub struct RecordRequest<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
        has_one = demand_reporter @ MarketErrorCode::UnauthorizedDemandReporter,
    )]
    pub market_config: Account<'info, MarketConfig>,

    #[account(
        init_if_needed,
        payer = demand_reporter,
        space = ModelDemand::SIZE,
        seeds = [DEMAND_SEED, model_id.as_ref()],
        bump
    )]
    pub demand: Account<'info, ModelDemand>,

    #[account(mut)]
    pub demand_reporter: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(model_id: [u8; 32])]
pub struct RollDemandWindow<'info> {
    #[account(
        mut,
        seeds = [DEMAND_SEED, model_id.as_ref()],
        bump = demand.bump,
    )]
    pub demand: Account<'info, ModelDemand>,
}

#[derive(Accounts)]
#[instruction(model_id: [u8; 32])]
pub struct ReadDemand<'info> {
    /// CHECK: Demand PDA, possibly never created; decoded in the handler
    #[account(seeds = [DEMAND_SEED, model_id.as_ref()], bump)]
    pub demand: UncheckedAccount<'info>,
}

// Events:

#[event]
pub struct DemandUpdated {
    pub model_id: [u8; 32],
    pub window_started_at: i64,
    pub window_count: u64,
    pub average_demand: u64,
    pub samples: u8,
}
