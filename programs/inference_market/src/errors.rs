use anchor_lang::prelude::*;

#[error_code]
pub enum MarketErrorCode {
    // Authorization
    #[msg("Authorization: caller is not an active registered host")]
    UnauthorizedHost,
    #[msg("Authorization: caller is not the governance authority")]
    UnauthorizedGovernance,
    #[msg("Authorization: caller is not the registry authority")]
    UnauthorizedRegistry,
    #[msg("Authorization: caller is not the configured demand reporter")]
    UnauthorizedDemandReporter,
    #[msg("Authorization: caller is not the configured usage reporter")]
    UnauthorizedUsageReporter,

    // Validation
    #[msg("Validation: native price outside [MIN, MAX]")]
    NativePriceOutOfBounds,
    #[msg("Validation: stable price outside [MIN, MAX]")]
    StablePriceOutOfBounds,
    #[msg("Validation: model is not in the host's supported set")]
    ModelNotSupported,
    #[msg("Validation: the native token address cannot hold a token override")]
    NativeTokenOverride,
    #[msg("Validation: price bounds must satisfy 0 < MIN <= MAX and may only widen")]
    InvalidPriceBounds,
    #[msg("Validation: discount tiers must ascend by threshold with non-decreasing bps <= 10000")]
    InvalidDiscountTiers,
    #[msg("Validation: surge thresholds must be strictly ascending")]
    InvalidSurgeThresholds,
    #[msg("Validation: surge multipliers must be >= 10000 bps, ascending and <= 50000 bps")]
    InvalidSurgeMultiplier,
    #[msg("Validation: peak hours must be distinct hours in 0..24")]
    InvalidPeakHours,
    #[msg("Validation: multiplier must be in (0, 50000] bps")]
    InvalidMultiplier,
    #[msg("Validation: region label must be 1..=32 bytes")]
    InvalidRegion,
    #[msg("Validation: too many regional multipliers")]
    TooManyRegions,
    #[msg("Validation: too many supported models")]
    TooManyModels,
    #[msg("Validation: utilization must be a percentage in 0..=100")]
    InvalidUtilization,
    #[msg("Validation: utilization thresholds must satisfy low < high <= 100")]
    InvalidUtilizationThresholds,
    #[msg("Validation: competitive band must be in (0, 10000) bps")]
    InvalidBand,
    #[msg("Validation: adjustment step must be in (0, 5000] bps")]
    InvalidAdjustmentStep,
    #[msg("Validation: durations must be positive")]
    InvalidDuration,
    #[msg("Validation: batch inputs must be non-empty and of equal length")]
    InvalidBatch,
    #[msg("Validation: account supplied does not match the derived address")]
    AccountMismatch,

    // State
    #[msg("State: host record does not exist or is inactive")]
    HostNotRegistered,
    #[msg("State: the current demand window has not elapsed yet")]
    DemandWindowOpen,
    #[msg("State: not enough daily demand history to forecast (need 7 days)")]
    InsufficientDemandHistory,
    #[msg("State: market pricing is not enabled for this model")]
    MarketPricingDisabled,
    #[msg("State: no market data recorded for this model")]
    NoMarketData,
    #[msg("State: market participant list is full")]
    MarketFull,
    #[msg("State: automatic price adjustments are disabled")]
    AutomaticAdjustmentsDisabled,
    #[msg("State: demand has not been sustained at the high surge tier")]
    DemandNotSustained,
    #[msg("State: automatic adjustment cooldown is still active")]
    AdjustmentCooldownActive,
    #[msg("State: price is already at the maximum bound")]
    PriceAtMaximum,

    #[msg("Arithmetic overflow")]
    ArithmeticOverflow,
}
