use anchor_lang::prelude::*;
use crate::constants::{MAX_BULK_PRICES, MAX_PRICE_HISTORY, NATIVE_TOKEN};
use crate::errors::MarketErrorCode;
use crate::state::{push_history, Host, MarketConfig, PriceBounds, PriceHistoryEntry};

/// Per (host, model) price override. A field set to 0 falls back to the
/// host default for that currency class.
#[account]
pub struct ModelPriceOverride {
    pub host: Pubkey,
    pub model_id: [u8; 32],
    pub native_price: u64,
    pub stable_price: u64,
    pub host_registration_id: u64,
    pub last_auto_adjustment_at: i64,
    pub history: Vec<PriceHistoryEntry>,
    pub bump: u8,
}

/// Per (host, payment token) price override. 0 falls back to the host's
/// default stable price.
#[account]
pub struct TokenPriceOverride {
    pub host: Pubkey,
    pub token: Pubkey,
    pub price: u64,
    pub host_registration_id: u64,
    pub history: Vec<PriceHistoryEntry>,
    pub bump: u8,
}

impl ModelPriceOverride {
    pub const SIZE: usize = 8 + // discriminator
        32 + // host
        32 + // model_id
        8 + // native_price
        8 + // stable_price
        8 + // host_registration_id
        8 + // last_auto_adjustment_at
        4 + (MAX_PRICE_HISTORY * PriceHistoryEntry::SIZE) + // history
        1; // bump

    /// An override only applies to the registration it was written under.
    pub fn belongs_to(&self, host: &Host) -> bool {
        self.host == host.authority && self.host_registration_id == host.registration_id
    }

    pub fn price(&self, is_native: bool) -> u64 {
        if is_native {
            self.native_price
        } else {
            self.stable_price
        }
    }

    /// Rebinds an override left behind by an earlier registration.
    pub fn reset_if_orphaned(&mut self, host: &Host) {
        if !self.belongs_to(host) {
            self.host = host.authority;
            self.native_price = 0;
            self.stable_price = 0;
            self.host_registration_id = host.registration_id;
            self.last_auto_adjustment_at = 0;
            self.history.clear();
        }
    }

    /// Writes both fields, logging each one that actually changes.
    /// Returns the previous `(native, stable)` pair.
    pub fn set_prices(
        &mut self,
        host: &Host,
        model_id: [u8; 32],
        native_price: u64,
        stable_price: u64,
        stable_mint: Pubkey,
        now: i64,
    ) -> (u64, u64) {
        self.reset_if_orphaned(host);
        self.model_id = model_id;
        let old = (self.native_price, self.stable_price);

        if native_price != self.native_price {
            self.native_price = native_price;
            push_history(&mut self.history, PriceHistoryEntry {
                token: NATIVE_TOKEN,
                price: native_price,
                timestamp: now,
            });
        }
        if stable_price != self.stable_price {
            self.stable_price = stable_price;
            push_history(&mut self.history, PriceHistoryEntry {
                token: stable_mint,
                price: stable_price,
                timestamp: now,
            });
        }
        old
    }

    /// `set_prices` behind the supported-model and bounds checks. A
    /// rejected write leaves the record untouched.
    pub fn apply(
        &mut self,
        config: &MarketConfig,
        host: &Host,
        model_id: [u8; 32],
        native_price: u64,
        stable_price: u64,
        now: i64,
    ) -> Result<(u64, u64)> {
        validate_model_prices(host, &config.bounds, &model_id, native_price, stable_price)?;
        Ok(self.set_prices(host, model_id, native_price, stable_price, config.stable_mint, now))
    }
}

/// A model override may only name a model the host serves. 0 in either
/// field passes as the clear sentinel.
pub fn validate_model_prices(
    host: &Host,
    bounds: &PriceBounds,
    model_id: &[u8; 32],
    native_price: u64,
    stable_price: u64,
) -> Result<()> {
    require!(host.supports_model(model_id), MarketErrorCode::ModelNotSupported);
    bounds.check_override(true, native_price)?;
    bounds.check_override(false, stable_price)
}

/// Native pricing is managed only through the host defaults.
pub fn validate_token_price(bounds: &PriceBounds, token: &Pubkey, price: u64) -> Result<()> {
    require!(*token != NATIVE_TOKEN, MarketErrorCode::NativeTokenOverride);
    bounds.check_override(false, price)
}

/// Checks a whole batch up front so one bad entry rejects all of it.
pub fn validate_bulk_prices(
    host: &Host,
    bounds: &PriceBounds,
    model_ids: &[[u8; 32]],
    native_prices: &[u64],
    stable_prices: &[u64],
) -> Result<()> {
    require!(
        !model_ids.is_empty()
            && model_ids.len() <= MAX_BULK_PRICES
            && model_ids.len() == native_prices.len()
            && model_ids.len() == stable_prices.len(),
        MarketErrorCode::InvalidBatch
    );
    for ((model_id, native), stable) in model_ids.iter().zip(native_prices).zip(stable_prices) {
        validate_model_prices(host, bounds, model_id, *native, *stable)?;
    }
    Ok(())
}

impl TokenPriceOverride {
    pub const SIZE: usize = 8 + // discriminator
        32 + // host
        32 + // token
        8 + // price
        8 + // host_registration_id
        4 + (MAX_PRICE_HISTORY * PriceHistoryEntry::SIZE) + // history
        1; // bump

    pub fn belongs_to(&self, host: &Host) -> bool {
        self.host == host.authority && self.host_registration_id == host.registration_id
    }

    pub fn reset_if_orphaned(&mut self, host: &Host) {
        if !self.belongs_to(host) {
            self.host = host.authority;
            self.price = 0;
            self.host_registration_id = host.registration_id;
            self.history.clear();
        }
    }

    /// Returns the previous price.
    pub fn set_price(&mut self, host: &Host, token: Pubkey, price: u64, now: i64) -> u64 {
        self.reset_if_orphaned(host);
        self.token = token;
        let old = self.price;
        if price != old {
            self.price = price;
            push_history(&mut self.history, PriceHistoryEntry { token, price, timestamp: now });
        }
        old
    }
}

/// Model override for the currency class if set, else the host default,
/// else 0 when the host has no live record.
pub fn resolve_model_price(
    host: Option<&Host>,
    model_override: Option<&ModelPriceOverride>,
    is_native: bool,
) -> u64 {
    let Some(host) = host.filter(|h| h.active) else {
        return 0;
    };
    match model_override {
        Some(o) if o.belongs_to(host) && o.price(is_native) != 0 => o.price(is_native),
        _ => host.default_price(is_native),
    }
}

/// Native token resolves to the native default; any other token resolves
/// to its override if set, else the default stable price.
pub fn resolve_token_price(
    host: Option<&Host>,
    token_override: Option<&TokenPriceOverride>,
    token: &Pubkey,
) -> u64 {
    let Some(host) = host.filter(|h| h.active) else {
        return 0;
    };
    if *token == NATIVE_TOKEN {
        return host.native_price;
    }
    match token_override {
        Some(o) if o.token == *token && o.belongs_to(host) && o.price != 0 => o.price,
        _ => host.stable_price,
    }
}

/// Unit price a buyer pays for `model_id` in `token`.
///
/// Native: model native override, else native default. Any other token:
/// token override, else model stable override, else stable default.
pub fn resolve_quote_unit_price(
    host: Option<&Host>,
    model_override: Option<&ModelPriceOverride>,
    token_override: Option<&TokenPriceOverride>,
    token: &Pubkey,
) -> u64 {
    if *token == NATIVE_TOKEN {
        return resolve_model_price(host, model_override, true);
    }
    let Some(live) = host.filter(|h| h.active) else {
        return 0;
    };
    match token_override {
        Some(o) if o.token == *token && o.belongs_to(live) && o.price != 0 => o.price,
        _ => resolve_model_price(host, model_override, false),
    }
}
