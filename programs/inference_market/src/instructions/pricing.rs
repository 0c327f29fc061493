use anchor_lang::{prelude::*, system_program};
use anchor_spl::token_interface::Mint;
use crate::constants::*;
use crate::errors::MarketErrorCode;
use crate::state::{
    resolve_model_price, resolve_token_price, validate_bulk_prices, validate_token_price,
    Host, MarketConfig, ModelPriceOverride, ModelPriceView, TokenPriceOverride,
};
use crate::utils::{load_all, load_optional};

/// Sets a host's default native and stable prices. Both must be in bounds.
pub fn set_default_pricing_handler(
    ctx: Context<UpdateDefaultPricing>,
    native_price: u64,
    stable_price: u64,
) -> Result<()> {
    let config = &ctx.accounts.market_config;
    let host = &mut ctx.accounts.host;
    let clock = Clock::get()?;
    let old_native = host.native_price;
    let old_stable = host.stable_price;

    let changes = host.set_default_prices(
        &config.bounds,
        native_price,
        stable_price,
        config.stable_mint,
        clock.unix_timestamp,
    )?;

    msg!("Host {} default pricing: native={} stable={}", host.authority, native_price, stable_price);

    emit!(PricingUpdated {
        host: host.authority,
        old_native_price: old_native,
        native_price,
        old_stable_price: old_stable,
        stable_price,
    });

    // Defaults are not tied to a model
    for (token, old_price, new_price) in changes {
        emit_price_set(host.authority, [0u8; 32], token, old_price, new_price, clock.unix_timestamp);
    }

    Ok(())
}

/// Sets a per-model override. A field of 0 clears it back to the default.
pub fn set_model_override_handler(
    ctx: Context<UpdateModelOverride>,
    model_id: [u8; 32],
    native_price: u64,
    stable_price: u64,
) -> Result<()> {
    let config = &ctx.accounts.market_config;
    let host = &ctx.accounts.host;
    let clock = Clock::get()?;

    let model_override = &mut ctx.accounts.model_override;
    let (old_native, old_stable) = model_override.apply(
        config,
        host,
        model_id,
        native_price,
        stable_price,
        clock.unix_timestamp,
    )?;
    model_override.bump = ctx.bumps.model_override;

    emit_model_pricing(
        host,
        model_id,
        (old_native, native_price),
        (old_stable, stable_price),
        config.stable_mint,
        clock.unix_timestamp,
    );

    Ok(())
}

/// Same as setting both override fields to 0. Clearing an override that
/// was never created is a no-op and creates nothing.
pub fn clear_model_override_handler(ctx: Context<ClearModelOverride>, model_id: [u8; 32]) -> Result<()> {
    let config = &ctx.accounts.market_config;
    let host = &ctx.accounts.host;
    let info = ctx.accounts.model_override.to_account_info();

    let Some(mut record) = load_optional::<ModelPriceOverride>(&info)? else {
        msg!("No override to clear");
        return Ok(());
    };

    let clock = Clock::get()?;
    let (old_native, old_stable) = record.apply(config, host, model_id, 0, 0, clock.unix_timestamp)?;

    let mut data = info.try_borrow_mut_data()?;
    let mut writer: &mut [u8] = &mut data;
    record.try_serialize(&mut writer)?;

    emit_model_pricing(
        host,
        model_id,
        (old_native, 0),
        (old_stable, 0),
        config.stable_mint,
        clock.unix_timestamp,
    );

    Ok(())
}

/// Sets a custom price for one payment token. 0 clears it.
pub fn set_token_override_handler(
    ctx: Context<UpdateTokenOverride>,
    token: Pubkey,
    price: u64,
) -> Result<()> {
    let config = &ctx.accounts.market_config;
    validate_token_price(&config.bounds, &token, price)?;
    verify_mint(&ctx.accounts.token_mint)?;

    let host = &ctx.accounts.host;
    let clock = Clock::get()?;
    let token_override = &mut ctx.accounts.token_override;
    let old_price = token_override.set_price(host, token, price, clock.unix_timestamp);
    token_override.bump = ctx.bumps.token_override;

    emit!(TokenPricingUpdated {
        host: host.authority,
        token,
        old_price,
        price,
        effective_price: if price == 0 { host.stable_price } else { price },
    });

    emit_price_set(host.authority, [0u8; 32], token, old_price, price, clock.unix_timestamp);

    Ok(())
}

/// Sets overrides for several models at once. Every entry is validated
/// before anything is written; one bad entry rejects the whole batch.
///
/// `remaining_accounts` must hold the writable override PDA of each model,
/// in the same order as `model_ids`. Missing PDAs are created.
pub fn set_bulk_prices_handler<'info>(
    ctx: Context<'_, '_, '_, 'info, SetBulkPrices<'info>>,
    model_ids: Vec<[u8; 32]>,
    native_prices: Vec<u64>,
    stable_prices: Vec<u64>,
) -> Result<()> {
    let config = &ctx.accounts.market_config;
    let host = &ctx.accounts.host;
    let authority = ctx.accounts.authority.key();

    // Validate every entry before writing any
    validate_bulk_prices(host, &config.bounds, &model_ids, &native_prices, &stable_prices)?;
    require!(
        model_ids.len() == ctx.remaining_accounts.len(),
        MarketErrorCode::InvalidBatch
    );

    // Match each remaining account to its override PDA
    let mut bumps = Vec::with_capacity(model_ids.len());
    for (i, model_id) in model_ids.iter().enumerate() {
        let (expected, bump) = Pubkey::find_program_address(
            &[MODEL_OVERRIDE_SEED, authority.as_ref(), model_id.as_ref()],
            ctx.program_id,
        );
        let info = &ctx.remaining_accounts[i];
        require_keys_eq!(info.key(), expected, MarketErrorCode::AccountMismatch);
        require!(info.is_writable, MarketErrorCode::AccountMismatch);
        bumps.push(bump);
    }

    let clock = Clock::get()?;
    let rent = Rent::get()?;

    for (i, model_id) in model_ids.iter().enumerate() {
        let info = &ctx.remaining_accounts[i];

        // Load the override, creating the account on first use
        let mut record = match load_optional::<ModelPriceOverride>(info)? {
            Some(record) => record,
            None => {
                let bump_seed = [bumps[i]];
                let signer_seeds: &[&[u8]] = &[
                    MODEL_OVERRIDE_SEED,
                    authority.as_ref(),
                    model_id.as_ref(),
                    &bump_seed,
                ];
                system_program::create_account(
                    CpiContext::new_with_signer(
                        ctx.accounts.system_program.to_account_info(),
                        system_program::CreateAccount {
                            from: ctx.accounts.authority.to_account_info(),
                            to: info.clone(),
                        },
                        &[signer_seeds],
                    ),
                    rent.minimum_balance(ModelPriceOverride::SIZE),
                    ModelPriceOverride::SIZE as u64,
                    ctx.program_id,
                )?;
                ModelPriceOverride {
                    host: Pubkey::default(),
                    model_id: *model_id,
                    native_price: 0,
                    stable_price: 0,
                    host_registration_id: 0,
                    last_auto_adjustment_at: 0,
                    history: Vec::new(),
                    bump: bumps[i],
                }
            }
        };

        // Write back
        let (old_native, old_stable) = record.set_prices(
            host,
            *model_id,
            native_prices[i],
            stable_prices[i],
            config.stable_mint,
            clock.unix_timestamp,
        );

        let mut data = info.try_borrow_mut_data()?;
        let mut writer: &mut [u8] = &mut data;
        record.try_serialize(&mut writer)?;

        emit_model_pricing(
            host,
            *model_id,
            (old_native, native_prices[i]),
            (old_stable, stable_prices[i]),
            config.stable_mint,
            clock.unix_timestamp,
        );
    }

    msg!("Host {} bulk-priced {} models", host.authority, model_ids.len());
    Ok(())
}

/// Effective price of a model for one currency class.
pub fn resolve_model_price_handler(
    ctx: Context<ResolveModelPrice>,
    _host: Pubkey,
    _model_id: [u8; 32],
    is_native: bool,
) -> Result<u64> {
    let host = load_optional::<Host>(&ctx.accounts.host_record)?;
    let model_override = load_optional::<ModelPriceOverride>(&ctx.accounts.model_override)?;
    let price = resolve_model_price(host.as_ref(), model_override.as_ref(), is_native);

    msg!("resolved model price: {}", price);
    Ok(price)
}

/// Effective price of a payment token for a host.
pub fn resolve_token_price_handler(
    ctx: Context<ResolveTokenPrice>,
    _host: Pubkey,
    token: Pubkey,
) -> Result<u64> {
    let host = load_optional::<Host>(&ctx.accounts.host_record)?;
    let token_override = load_optional::<TokenPriceOverride>(&ctx.accounts.token_override)?;
    let price = resolve_token_price(host.as_ref(), token_override.as_ref(), &token);

    msg!("resolved token price: {}", price);
    Ok(price)
}

/// Effective native and stable price of every model the host supports,
/// in one call. Override PDAs are passed as `remaining_accounts`; models
/// without one resolve to the host defaults.
pub fn get_all_overrides_handler<'info>(
    ctx: Context<'_, '_, '_, 'info, GetAllOverrides<'info>>,
    _host: Pubkey,
) -> Result<Vec<ModelPriceView>> {
    let Some(host) = load_optional::<Host>(&ctx.accounts.host_record)? else {
        return Ok(Vec::new());
    };
    let overrides = load_all::<ModelPriceOverride>(ctx.remaining_accounts);

    let views = host
        .supported_models
        .iter()
        .map(|model_id| {
            let model_override = overrides
                .iter()
                .find(|o| o.model_id == *model_id && o.belongs_to(&host));
            ModelPriceView {
                model_id: *model_id,
                native_price: resolve_model_price(Some(&host), model_override, true),
                stable_price: resolve_model_price(Some(&host), model_override, false),
            }
        })
        .collect();

    Ok(views)
}

fn verify_mint(token_mint: &AccountInfo) -> Result<()> {
    require!(
        token_mint.owner == &anchor_spl::token::ID || token_mint.owner == &anchor_spl::token_2022::ID,
        MarketErrorCode::AccountMismatch
    );
    let data = token_mint.try_borrow_data()?;
    Mint::try_deserialize(&mut &data[..])?;
    Ok(())
}

fn emit_model_pricing(
    host: &Host,
    model_id: [u8; 32],
    native: (u64, u64),
    stable: (u64, u64),
    stable_mint: Pubkey,
    timestamp: i64,
) {
    emit!(ModelPricingUpdated {
        host: host.authority,
        model_id,
        old_native_price: native.0,
        native_price: native.1,
        old_stable_price: stable.0,
        stable_price: stable.1,
        effective_native_price: if native.1 == 0 { host.native_price } else { native.1 },
        effective_stable_price: if stable.1 == 0 { host.stable_price } else { stable.1 },
    });

    for (token, (old_price, new_price)) in [(NATIVE_TOKEN, native), (stable_mint, stable)] {
        emit_price_set(host.authority, model_id, token, old_price, new_price, timestamp);
    }
}

fn emit_price_set(
    host: Pubkey,
    model_id: [u8; 32],
    token: Pubkey,
    old_price: u64,
    new_price: u64,
    timestamp: i64,
) {
    if old_price != new_price {
        emit!(PriceSet {
            host,
            model_id,
            token,
            old_price,
            new_price,
            timestamp,
        });
    }
}

// Account contexts:

#[derive(Accounts)]
pub struct UpdateDefaultPricing<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
    )]
    pub market_config: Account<'info, MarketConfig>,

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
#[instruction(model_id: [u8; 32])]
pub struct UpdateModelOverride<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
    )]
    pub market_config: Account<'info, MarketConfig>,

    #[account(
        seeds = [HOST_SEED, authority.key().as_ref()],
        bump = host.bump,
        has_one = authority @ MarketErrorCode::UnauthorizedHost,
        constraint = host.active @ MarketErrorCode::UnauthorizedHost,
    )]
    pub host: Account<'info, Host>,

    #[account(
        init_if_needed,
        payer = authority,
        space = ModelPriceOverride::SIZE,
        seeds = [MODEL_OVERRIDE_SEED, authority.key().as_ref(), model_id.as_ref()],
        bump
    )]
    pub model_override: Account<'info, ModelPriceOverride>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(model_id: [u8; 32])]
pub struct ClearModelOverride<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
    )]
    pub market_config: Account<'info, MarketConfig>,

    #[account(
        seeds = [HOST_SEED, authority.key().as_ref()],
        bump = host.bump,
        has_one = authority @ MarketErrorCode::UnauthorizedHost,
        constraint = host.active @ MarketErrorCode::UnauthorizedHost,
    )]
    pub host: Account<'info, Host>,

    /// CHECK: Override PDA, possibly never created; decoded in the handler
    #[account(
        mut,
        seeds = [MODEL_OVERRIDE_SEED, authority.key().as_ref(), model_id.as_ref()],
        bump
    )]
    pub model_override: UncheckedAccount<'info>,

    pub authority: Signer<'info>,
}

#[derive(Accounts)]
#[instruction(token: Pubkey)]
pub struct UpdateTokenOverride<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
    )]
    pub market_config: Account<'info, MarketConfig>,

    #[account(
        seeds = [HOST_SEED, authority.key().as_ref()],
        bump = host.bump,
        has_one = authority @ MarketErrorCode::UnauthorizedHost,
        constraint = host.active @ MarketErrorCode::UnauthorizedHost,
    )]
    pub host: Account<'info, Host>,

    /// CHECK: Verified in the handler to be an SPL Token or Token-2022 mint
    #[account(constraint = token_mint.key() == token @ MarketErrorCode::AccountMismatch)]
    pub token_mint: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = authority,
        space = TokenPriceOverride::SIZE,
        seeds = [TOKEN_OVERRIDE_SEED, authority.key().as_ref(), token.as_ref()],
        bump
    )]
    pub token_override: Account<'info, TokenPriceOverride>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct SetBulkPrices<'info> {
    #[account(
        seeds = [MARKET_CONFIG_SEED],
        bump = market_config.bump,
    )]
    pub market_config: Account<'info, MarketConfig>,

    #[account(
        seeds = [HOST_SEED, authority.key().as_ref()],
        bump = host.bump,
        has_one = authority @ MarketErrorCode::UnauthorizedHost,
        constraint = host.active @ MarketErrorCode::UnauthorizedHost,
    )]
    pub host: Account<'info, Host>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
    // Override PDAs are passed as remaining accounts
}

#[derive(Accounts)]
#[instruction(host: Pubkey, model_id: [u8; 32])]
pub struct ResolveModelPrice<'info> {
    /// CHECK: Host record, possibly closed; decoded in the handler
    #[account(seeds = [HOST_SEED, host.as_ref()], bump)]
    pub host_record: UncheckedAccount<'info>,

    /// CHECK: Override PDA, possibly never created; decoded in the handler
    #[account(seeds = [MODEL_OVERRIDE_SEED, host.as_ref(), model_id.as_ref()], bump)]
    pub model_override: UncheckedAccount<'info>,
}

#[derive(Accounts)]
#[instruction(host: Pubkey, token: Pubkey)]
pub struct ResolveTokenPrice<'info> {
    /// CHECK: Host record, possibly closed; decoded in the handler
    #[account(seeds = [HOST_SEED, host.as_ref()], bump)]
    pub host_record: UncheckedAccount<'info>,

    /// CHECK: Override PDA, possibly never created; decoded in the handler
    #[account(seeds = [TOKEN_OVERRIDE_SEED, host.as_ref(), token.as_ref()], bump)]
    pub token_override: UncheckedAccount<'info>,
}

#[derive(Accounts)]
#[instruction(host: Pubkey)]
pub struct GetAllOverrides<'info> {
    /// CHECK: Host record, possibly closed; decoded in the handler
    #[account(seeds = [HOST_SEED, host.as_ref()], bump)]
    pub host_record: UncheckedAccount<'info>,
    // Model override PDAs are passed as remaining accounts
}

// Events:

#[event]
pub struct PricingUpdated {
    pub host: Pubkey,
    pub old_native_price: u64,
    pub native_price: u64,
    pub old_stable_price: u64,
    pub stable_price: u64,
}

#[event]
pub struct ModelPricingUpdated {
    pub host: Pubkey,
    pub model_id: [u8; 32],
    pub old_native_price: u64,
    pub native_price: u64, // 0 = cleared
    pub old_stable_price: u64,
    pub stable_price: u64, // 0 = cleared
    pub effective_native_price: u64,
    pub effective_stable_price: u64,
}

#[event]
pub struct TokenPricingUpdated {
    pub host: Pubkey,
    pub token: Pubkey,
    pub old_price: u64,
    pub price: u64, // 0 = cleared
    pub effective_price: u64,
}

/// Appended whenever a stored price changes. `model_id` is zeroed for
/// host defaults and host-wide token overrides.
#[event]
pub struct PriceSet {
    pub host: Pubkey,
    pub model_id: [u8; 32],
    pub token: Pubkey,
    pub old_price: u64,
    pub new_price: u64,
    pub timestamp: i64,
}
