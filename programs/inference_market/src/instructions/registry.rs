use anchor_lang::prelude::*;
use crate::constants::*;
use crate::errors::MarketErrorCode;
use crate::state::{Host, MarketConfig};

// The node registry owns host lifecycle. These instructions are the narrow
// surface it drives; pricing only ever reads `active` and the model set.

/// Creates the host record for a newly registered, staked node.
pub fn register_host_handler(
    ctx: Context<RegisterHost>,
    host_authority: Pubkey,
    region: String,
    supported_models: Vec<[u8; 32]>,
) -> Result<()> {
    require!(
        !region.is_empty() && region.len() <= MAX_REGION_LEN,
        MarketErrorCode::InvalidRegion
    );
    require!(
        supported_models.len() <= MAX_SUPPORTED_MODELS,
        MarketErrorCode::TooManyModels
    );

    let config = &mut ctx.accounts.market_config;
    let clock = Clock::get()?;

    config.host_registrations = config
        .host_registrations
        .checked_add(1)
        .ok_or(MarketErrorCode::ArithmeticOverflow)?;

    let host = &mut ctx.accounts.host;
    host.authority = host_authority;
    host.active = true;
    host.registration_id = config.host_registrations;
    host.region = region;
    host.supported_models = supported_models;
    host.native_price = 0;
    host.stable_price = 0;
    host.utilization_percent = 0;
    host.utilization_updated_at = 0;
    host.registered_at = clock.unix_timestamp;
    host.history = Vec::new();
    host.bump = ctx.bumps.host;

    emit!(HostRegistered {
        host: host_authority,
        registration_id: host.registration_id,
        region: host.region.clone(),
        model_count: host.supported_models.len() as u8,
    });

    Ok(())
}

/// Replaces the set of models a host serves.
pub fn set_host_models_handler(
    ctx: Context<UpdateHostRegistration>,
    supported_models: Vec<[u8; 32]>,
) -> Result<()> {
    require!(
        supported_models.len() <= MAX_SUPPORTED_MODELS,
        MarketErrorCode::TooManyModels
    );
    let host = &mut ctx.accounts.host;
    host.supported_models = supported_models;

    msg!("Host {} now serves {} models", host.authority, host.supported_models.len());
    Ok(())
}

/// Deletes the host record. Overrides written under this registration are
/// orphaned and read as unset from now on.
pub fn unregister_host_handler(ctx: Context<UnregisterHost>) -> Result<()> {
    let host = &ctx.accounts.host;

    emit!(HostUnregistered {
        host: host.authority,
        registration_id: host.registration_id,
    });

    // Host account is closed via the close constraint
    Ok(())
}

// Account contexts:

#[derive(Accounts)]
#[instruction(host_authority: Pubkey)]
pub struct RegisterHost<'info> {
    #[account(
        mut,
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
        has_one = registry_authority @ MarketErrorCode::UnauthorizedRegistry,
    )]
    pub market_config: Account<'info, MarketConfig>,

    #[account(
        init,
        payer = registry_authority,
        space = Host::SIZE,
        seeds = [HOST_SEED, host_authority.as_ref()],
        bump
    )]
    pub host: Account<'info, Host>,

    #[account(mut)]
    pub registry_authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct UpdateHostRegistration<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
        has_one = registry_authority @ MarketErrorCode::UnauthorizedRegistry,
    )]
    pub market_config: Account<'info, MarketConfig>,

    #[account(
        mut,
        seeds = [HOST_SEED, host.authority.as_ref()],
        bump = host.bump,
    )]
    pub host: Account<'info, Host>,

    pub registry_authority: Signer<'info>,
}

#[derive(Accounts)]
pub struct UnregisterHost<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
        has_one = registry_authority @ MarketErrorCode::UnauthorizedRegistry,
    )]
    pub market_config: Account<'info, MarketConfig>,

    #[account(
        mut,
        seeds = [HOST_SEED, host.authority.as_ref()],
        bump = host.bump,
        close = registry_authority
    )]
    pub host: Account<'info, Host>,

    #[account(mut)]
    pub registry_authority: Signer<'info>,
}

// Events:

#[event]
pub struct HostRegistered {
    pub host: Pubkey,
    pub registration_id: u64,
    pub region: String,
    pub model_count: u8,
}

#[event]
pub struct HostUnregistered {
    pub host: Pubkey,
    pub registration_id: u64,
}
