use anchor_lang::prelude::*;
use crate::constants::{BPS_DENOMINATOR, MAX_DISCOUNT_TIERS};
use crate::errors::MarketErrorCode;
use crate::state::Host;

#[account]
pub struct VolumeDiscount {
    pub host: Pubkey,
    pub model_id: [u8; 32],
    pub tiers: Vec<DiscountTier>,
    pub host_registration_id: u64,
    pub bump: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscountTier {
    pub threshold: u64, // tokens
    pub discount_bps: u16,
}

impl DiscountTier {
    pub const SIZE: usize = 8 + 2;
}

impl VolumeDiscount {
    pub const SIZE: usize = 8 + // discriminator
        32 + // host
        32 + // model_id
        4 + (MAX_DISCOUNT_TIERS * DiscountTier::SIZE) + // tiers
        8 + // host_registration_id
        1; // bump

    /// A schedule only applies to the registration it was written under.
    pub fn belongs_to(&self, host: &Host) -> bool {
        self.host == host.authority && self.host_registration_id == host.registration_id
    }

    /// Replaces the schedule after checking the model and the tiers. A
    /// rejected schedule leaves the record untouched.
    pub fn assign(&mut self, host: &Host, model_id: [u8; 32], tiers: Vec<DiscountTier>) -> Result<()> {
        require!(host.supports_model(&model_id), MarketErrorCode::ModelNotSupported);
        Self::validate_tiers(&tiers)?;

        self.host = host.authority;
        self.host_registration_id = host.registration_id;
        self.model_id = model_id;
        self.tiers = tiers;
        Ok(())
    }

    /// Tiers that apply to a quote from `host`. None for a missing host or
    /// a schedule left by an earlier registration.
    pub fn tiers_for(host: Option<&Host>, discount: Option<VolumeDiscount>) -> Vec<DiscountTier> {
        match (host, discount) {
            (Some(host), Some(discount)) if discount.belongs_to(host) => discount.tiers,
            _ => Vec::new(),
        }
    }

    /// Thresholds strictly ascending, discounts non-decreasing and <= 100%.
    /// An empty list removes all discounts.
    pub fn validate_tiers(tiers: &[DiscountTier]) -> Result<()> {
        require!(tiers.len() <= MAX_DISCOUNT_TIERS, MarketErrorCode::InvalidDiscountTiers);
        for tier in tiers {
            require!(
                tier.threshold > 0 && tier.discount_bps as u64 <= BPS_DENOMINATOR,
                MarketErrorCode::InvalidDiscountTiers
            );
        }
        for pair in tiers.windows(2) {
            require!(
                pair[0].threshold < pair[1].threshold
                    && pair[0].discount_bps <= pair[1].discount_bps,
                MarketErrorCode::InvalidDiscountTiers
            );
        }
        Ok(())
    }

    /// Discount of the highest threshold not exceeding `volume`.
    pub fn discount_for(tiers: &[DiscountTier], volume: u64) -> u16 {
        tiers
            .iter()
            .filter(|tier| tier.threshold <= volume)
            .map(|tier| tier.discount_bps)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_host;

    const MODEL: [u8; 32] = [3u8; 32];

    fn empty_discount() -> VolumeDiscount {
        VolumeDiscount {
            host: Pubkey::default(),
            model_id: [0u8; 32],
            tiers: Vec::new(),
            host_registration_id: 0,
            bump: 255,
        }
    }

    fn tiers() -> Vec<DiscountTier> {
        vec![
            DiscountTier { threshold: 10_000, discount_bps: 1_000 },
            DiscountTier { threshold: 100_000, discount_bps: 2_000 },
        ]
    }

    #[test]
    fn selects_highest_reached_threshold() {
        let tiers = tiers();
        assert_eq!(VolumeDiscount::discount_for(&tiers, 1_000), 0);
        assert_eq!(VolumeDiscount::discount_for(&tiers, 10_000), 1_000);
        assert_eq!(VolumeDiscount::discount_for(&tiers, 15_000), 1_000);
        assert_eq!(VolumeDiscount::discount_for(&tiers, 150_000), 2_000);
        assert_eq!(VolumeDiscount::discount_for(&[], 150_000), 0);
    }

    #[test]
    fn rejects_malformed_tiers() {
        assert!(VolumeDiscount::validate_tiers(&tiers()).is_ok());
        assert!(VolumeDiscount::validate_tiers(&[]).is_ok());

        let descending = vec![
            DiscountTier { threshold: 100_000, discount_bps: 2_000 },
            DiscountTier { threshold: 10_000, discount_bps: 1_000 },
        ];
        assert!(VolumeDiscount::validate_tiers(&descending).is_err());

        let shrinking = vec![
            DiscountTier { threshold: 10_000, discount_bps: 2_000 },
            DiscountTier { threshold: 100_000, discount_bps: 1_000 },
        ];
        assert!(VolumeDiscount::validate_tiers(&shrinking).is_err());

        let over_full = vec![DiscountTier { threshold: 1, discount_bps: 10_001 }];
        assert!(VolumeDiscount::validate_tiers(&over_full).is_err());

        let too_many: Vec<DiscountTier> = (1..=6)
            .map(|i| DiscountTier { threshold: i * 1_000, discount_bps: 100 })
            .collect();
        assert!(VolumeDiscount::validate_tiers(&too_many).is_err());
    }

    #[test]
    fn schedule_is_tied_to_the_registration() {
        let mut host = test_host(5_000, 50, &[MODEL]);
        let mut discount = empty_discount();
        discount.assign(&host, MODEL, tiers()).unwrap();
        assert_eq!(VolumeDiscount::tiers_for(Some(&host), Some(discount.clone())), tiers());
        assert!(VolumeDiscount::tiers_for(None, Some(discount.clone())).is_empty());

        // unregistered, then registered again
        host.registration_id = 2;
        assert!(VolumeDiscount::tiers_for(Some(&host), Some(discount.clone())).is_empty());

        discount.assign(&host, MODEL, tiers()).unwrap();
        assert_eq!(discount.host_registration_id, 2);
        assert_eq!(VolumeDiscount::tiers_for(Some(&host), Some(discount)), tiers());
    }

    #[test]
    fn another_hosts_schedule_does_not_apply() {
        let owner = test_host(5_000, 50, &[MODEL]);
        let other = test_host(5_000, 50, &[MODEL]);
        let mut discount = empty_discount();
        discount.assign(&owner, MODEL, tiers()).unwrap();
        assert!(VolumeDiscount::tiers_for(Some(&other), Some(discount)).is_empty());
    }

    #[test]
    fn rejected_schedule_keeps_the_previous_one() {
        let host = test_host(5_000, 50, &[MODEL]);
        let mut discount = empty_discount();
        discount.assign(&host, MODEL, tiers()).unwrap();

        assert_eq!(
            discount.assign(&host, [4u8; 32], Vec::new()).unwrap_err(),
            MarketErrorCode::ModelNotSupported.into()
        );
        let descending = vec![
            DiscountTier { threshold: 100_000, discount_bps: 2_000 },
            DiscountTier { threshold: 10_000, discount_bps: 1_000 },
        ];
        assert!(discount.assign(&host, MODEL, descending).is_err());

        assert_eq!(discount.model_id, MODEL);
        assert_eq!(discount.tiers, tiers());
    }
}
