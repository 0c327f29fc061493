use anchor_lang::prelude::*;
use crate::constants::*;
use crate::errors::MarketErrorCode;
use crate::state::{
    compute_quote_total, resolve_quote_unit_price, DiscountTier, Host, HostPriceView,
    ModelPriceOverride, PriceQuote, TokenPriceOverride, VolumeDiscount,
};
use crate::utils::{load_all, load_optional};

/// Replaces the volume discount schedule for one of the host's models.
pub fn set_volume_discount_handler(
    ctx: Context<UpdateVolumeDiscount>,
    model_id: [u8; 32],
    tiers: Vec<DiscountTier>,
) -> Result<()> {
    let host = &ctx.accounts.host;
    let discount = &mut ctx.accounts.volume_discount;
    discount.assign(host, model_id, tiers)?;
    discount.bump = ctx.bumps.volume_discount;

    emit!(PriceDiscountSet {
        host: host.authority,
        model_id,
        tiers: discount.tiers.clone(),
    });

    Ok(())
}

struct QuoteInputs {
    unit_price: u64,
    tiers: Vec<DiscountTier>,
}

fn load_quote_inputs(accounts: &QuoteAccounts, token: &Pubkey) -> Result<QuoteInputs> {
    let host = load_optional::<Host>(&accounts.host_record)?;
    let model_override = load_optional::<ModelPriceOverride>(&accounts.model_override)?;
    let token_override = load_optional::<TokenPriceOverride>(&accounts.token_override)?;

    let unit_price = resolve_quote_unit_price(
        host.as_ref(),
        model_override.as_ref(),
        token_override.as_ref(),
        token,
    );
    let tiers = VolumeDiscount::tiers_for(
        host.as_ref(),
        load_optional::<VolumeDiscount>(&accounts.volume_discount)?,
    );
    Ok(QuoteInputs { unit_price, tiers })
}

/// Total a buyer pays for `volume` tokens, after volume discount.
pub fn calculate_quote_handler(
    ctx: Context<QuoteAccounts>,
    _host: Pubkey,
    _model_id: [u8; 32],
    token: Pubkey,
    volume: u64,
) -> Result<u64> {
    let inputs = load_quote_inputs(ctx.accounts, &token)?;
    let (total, discount_bps) = compute_quote_total(inputs.unit_price, volume, &inputs.tiers)?;

    msg!("quote: unit={} volume={} discount_bps={} total={}", inputs.unit_price, volume, discount_bps, total);
    Ok(total)
}

/// Full, time-bounded quote for a buyer. Returned, never stored.
pub fn generate_quote_handler(
    ctx: Context<GenerateQuote>,
    host: Pubkey,
    model_id: [u8; 32],
    token: Pubkey,
    volume: u64,
) -> Result<PriceQuote> {
    let inputs = load_quote_inputs(&ctx.accounts.quote, &token)?;
    let (total_price, discount_bps) = compute_quote_total(inputs.unit_price, volume, &inputs.tiers)?;
    let clock = Clock::get()?;

    let quote = PriceQuote {
        buyer: ctx.accounts.buyer.key(),
        host,
        model_id,
        volume,
        payment_token: token,
        unit_price: inputs.unit_price,
        discount_bps,
        total_price,
        issued_at: clock.unix_timestamp,
        valid_until: clock
            .unix_timestamp
            .checked_add(QUOTE_VALIDITY_SECONDS)
            .ok_or(MarketErrorCode::ArithmeticOverflow)?,
    };

    emit!(PriceQuoteGenerated {
        buyer: quote.buyer,
        host,
        model_id,
        payment_token: token,
        volume,
        unit_price: quote.unit_price,
        discount_bps,
        total_price,
        valid_until: quote.valid_until,
    });

    Ok(quote)
}

/// Unit price of a model on every supplied host, for every token asked.
///
/// `remaining_accounts` carries the host records plus any model and token
/// override PDAs the caller wants honored. Hosts that are inactive or do
/// not serve the model are left out.
pub fn compare_prices_handler<'info>(
    ctx: Context<'_, '_, '_, 'info, ComparePrices>,
    model_id: [u8; 32],
    tokens: Vec<Pubkey>,
) -> Result<Vec<HostPriceView>> {
    require!(!tokens.is_empty(), MarketErrorCode::InvalidBatch);

    let hosts = load_all::<Host>(ctx.remaining_accounts);
    let model_overrides = load_all::<ModelPriceOverride>(ctx.remaining_accounts);
    let token_overrides = load_all::<TokenPriceOverride>(ctx.remaining_accounts);

    let mut views = Vec::new();
    for host in hosts.iter().filter(|h| h.active && h.supports_model(&model_id)) {
        let model_override = model_overrides
            .iter()
            .find(|o| o.model_id == model_id && o.belongs_to(host));
        for token in &tokens {
            let token_override = token_overrides
                .iter()
                .find(|o| o.token == *token && o.belongs_to(host));
            views.push(HostPriceView {
                host: host.authority,
                token: *token,
                unit_price: resolve_quote_unit_price(Some(host), model_override, token_override, token),
            });
        }
    }

    msg!("compared {} host/token prices", views.len());
    Ok(views)
}

// Account contexts:

#[derive(Accounts)]
#[instruction(model_id: [u8; 32])]
pub struct UpdateVolumeDiscount<'info> {
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
        space = VolumeDiscount::SIZE,
        seeds = [VOLUME_DISCOUNT_SEED, authority.key().as_ref(), model_id.as_ref()],
        bump
    )]
    pub volume_discount: Account<'info, VolumeDiscount>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(host: Pubkey, model_id: [u8; 32], token: Pubkey)]
pub struct QuoteAccounts<'info> {
    /// CHECK: Host record, possibly closed; decoded in the handler
    #[account(seeds = [HOST_SEED, host.as_ref()], bump)]
    pub host_record: UncheckedAccount<'info>,

    /// CHECK: Optional override PDA; decoded in the handler
    #[account(seeds = [MODEL_OVERRIDE_SEED, host.as_ref(), model_id.as_ref()], bump)]
    pub model_override: UncheckedAccount<'info>,

    /// CHECK: Optional override PDA; decoded in the handler
    #[account(seeds = [TOKEN_OVERRIDE_SEED, host.as_ref(), token.as_ref()], bump)]
    pub token_override: UncheckedAccount<'info>,

    /// CHECK: Optional discount PDA; decoded in the handler
    #[account(seeds = [VOLUME_DISCOUNT_SEED, host.as_ref(), model_id.as_ref()], bump)]
    pub volume_discount: UncheckedAccount<'info>,
}

#[derive(Accounts)]
#[instruction(host: Pubkey, model_id: [u8; 32], token: Pubkey)]
pub struct GenerateQuote<'info> {
    pub quote: QuoteAccounts<'info>,

    pub buyer: Signer<'info>,
}

#[derive(Accounts)]
pub struct ComparePrices {}

// Events:

#[event]
pub struct PriceDiscountSet {
    pub host: Pubkey,
    pub model_id: [u8; 32],
    pub tiers: Vec<DiscountTier>,
}

#[event]
pub struct PriceQuoteGenerated {
    pub buyer: Pubkey,
    pub host: Pubkey,
    pub model_id: [u8; 32],
    pub payment_token: Pubkey,
    pub volume: u64,
    pub unit_price: u64,
    pub discount_bps: u16,
    pub total_price: u64,
    pub valid_until: i64,
}
