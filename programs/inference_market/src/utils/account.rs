use anchor_lang::prelude::*;

/// Deserializes a program account that may not exist yet.
///
/// Read paths accept PDAs for overrides, discounts and surge state that a
/// host may never have created. An account that is empty or not owned by
/// this program reads as `None` so callers fall back to defaults.
pub fn load_optional<T>(info: &AccountInfo) -> Result<Option<T>>
where
    T: AccountDeserialize + Owner,
{
    if info.owner != &T::owner() || info.data_is_empty() {
        return Ok(None);
    }
    let data = info.try_borrow_data()?;
    let mut slice: &[u8] = &data;
    Ok(Some(T::try_deserialize(&mut slice)?))
}

/// Collects every account in `accounts` that deserializes as `T`.
/// Accounts of any other type are skipped.
pub fn load_all<T>(accounts: &[AccountInfo]) -> Vec<T>
where
    T: AccountDeserialize + Owner,
{
    accounts
        .iter()
        .filter_map(|info| load_optional::<T>(info).ok().flatten())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ModelPriceOverride;

    fn record() -> ModelPriceOverride {
        ModelPriceOverride {
            host: Pubkey::new_unique(),
            model_id: [5u8; 32],
            native_price: 8_000,
            stable_price: 80,
            host_registration_id: 1,
            last_auto_adjustment_at: 0,
            history: Vec::new(),
            bump: 255,
        }
    }

    #[test]
    fn never_created_account_reads_as_none() {
        let key = Pubkey::new_unique();
        let owner = anchor_lang::system_program::ID;
        let mut lamports = 0u64;
        let mut data: Vec<u8> = Vec::new();
        let info = AccountInfo::new(&key, false, true, &mut lamports, &mut data, &owner, false, 0);

        assert!(load_optional::<ModelPriceOverride>(&info).unwrap().is_none());
        assert!(info.data_is_empty());
    }

    #[test]
    fn only_program_owned_records_load() {
        let key = Pubkey::new_unique();
        let mut data = vec![0u8; ModelPriceOverride::SIZE];
        {
            let mut writer: &mut [u8] = &mut data;
            record().try_serialize(&mut writer).unwrap();
        }

        let mut lamports = 1u64;
        let info = AccountInfo::new(&key, false, true, &mut lamports, &mut data, &crate::ID, false, 0);
        let loaded = load_optional::<ModelPriceOverride>(&info).unwrap().unwrap();
        assert_eq!((loaded.native_price, loaded.stable_price), (8_000, 80));

        let foreign = Pubkey::new_unique();
        let mut data = vec![0u8; ModelPriceOverride::SIZE];
        let mut lamports = 1u64;
        let info = AccountInfo::new(&key, false, true, &mut lamports, &mut data, &foreign, false, 0);
        assert!(load_optional::<ModelPriceOverride>(&info).unwrap().is_none());
        assert_eq!(load_all::<ModelPriceOverride>(&[info]).len(), 0);
    }
}
