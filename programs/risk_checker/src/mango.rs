//! Read-only view over a Mango Markets v3 `MangoAccount`.
//!
//! Only the fields the risk check needs are decoded. Offsets follow the
//! on-chain `#[repr(C)]` layout as compiled for the SBF target (8-byte
//! alignment for `I80F48`), which is what every live account uses.

use anchor_lang::prelude::Pubkey;
use bytemuck::{Pod, Zeroable};
use thiserror::Error;

/// Number of markets a Mango v3 group can list.
pub const MAX_PAIRS: usize = 15;

/// `DataType::MangoAccount` discriminant stored in the metadata header.
pub const MANGO_ACCOUNT_DATA_TYPE: u8 = 1;

pub const MANGO_ACCOUNT_LEN: usize = 4296;

pub const DATA_TYPE_OFFSET: usize = 0;
pub const IS_INITIALIZED_OFFSET: usize = 2;
pub const MANGO_GROUP_OFFSET: usize = 8;
pub const OWNER_OFFSET: usize = 40;
pub const PERP_ACCOUNTS_OFFSET: usize = 1080;
pub const DELEGATE_OFFSET: usize = 4259;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MangoLayoutError {
    #[error("account is not owned by the mango program")]
    InvalidOwner,
    #[error("mango account data has length {actual}, expected {expected}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("account data type {0} is not a mango account")]
    WrongDataType(u8),
    #[error("mango account is not initialized")]
    Uninitialized,
    #[error("mango account belongs to a different group")]
    GroupMismatch,
    #[error("market index {0} is out of range")]
    MarketIndexOutOfRange(u8),
}

/// Per-market perp state inside a `MangoAccount`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct PerpAccount {
    pub base_position: i64,
    /// `I80F48` fields are kept as raw little-endian bytes.
    pub quote_position: [u8; 16],
    pub long_settled_funding: [u8; 16],
    pub short_settled_funding: [u8; 16],
    pub bids_quantity: i64,
    pub asks_quantity: i64,
    /// Filled as taker but not yet consumed from the event queue.
    pub taker_base: i64,
    pub taker_quote: i64,
    pub mngo_accrued: u64,
}

impl PerpAccount {
    pub const LEN: usize = 96;
}

pub struct MangoAccountView<'a> {
    data: &'a [u8],
}

impl<'a> MangoAccountView<'a> {
    /// Validates ownership, size, header and group before exposing any field.
    pub fn load_checked(
        data: &'a [u8],
        account_owner: &Pubkey,
        mango_program_id: &Pubkey,
        mango_group_id: &Pubkey,
    ) -> Result<Self, MangoLayoutError> {
        if account_owner != mango_program_id {
            return Err(MangoLayoutError::InvalidOwner);
        }
        if data.len() != MANGO_ACCOUNT_LEN {
            return Err(MangoLayoutError::InvalidLength {
                expected: MANGO_ACCOUNT_LEN,
                actual: data.len(),
            });
        }

        let view = Self { data };
        let data_type = data[DATA_TYPE_OFFSET];
        if data_type != MANGO_ACCOUNT_DATA_TYPE {
            return Err(MangoLayoutError::WrongDataType(data_type));
        }
        if data[IS_INITIALIZED_OFFSET] == 0 {
            return Err(MangoLayoutError::Uninitialized);
        }
        if view.mango_group() != *mango_group_id {
            return Err(MangoLayoutError::GroupMismatch);
        }
        Ok(view)
    }

    pub fn mango_group(&self) -> Pubkey {
        self.read_pubkey(MANGO_GROUP_OFFSET)
    }

    pub fn owner(&self) -> Pubkey {
        self.read_pubkey(OWNER_OFFSET)
    }

    /// `Pubkey::default()` when no delegate is set.
    pub fn delegate(&self) -> Pubkey {
        self.read_pubkey(DELEGATE_OFFSET)
    }

    pub fn is_operated_by(&self, trader: &Pubkey) -> bool {
        self.owner() == *trader
            || (*trader != Pubkey::default() && self.delegate() == *trader)
    }

    pub fn perp_account(&self, market_index: u8) -> Result<PerpAccount, MangoLayoutError> {
        let index = market_index as usize;
        if index >= MAX_PAIRS {
            return Err(MangoLayoutError::MarketIndexOutOfRange(market_index));
        }
        let start = PERP_ACCOUNTS_OFFSET + index * PerpAccount::LEN;
        Ok(bytemuck::pod_read_unaligned(
            &self.data[start..start + PerpAccount::LEN],
        ))
    }

    fn read_pubkey(&self, offset: usize) -> Pubkey {
        let bytes: [u8; 32] = bytemuck::pod_read_unaligned(&self.data[offset..offset + 32]);
        Pubkey::new_from_array(bytes)
    }
}

const _: () = assert!(core::mem::size_of::<PerpAccount>() == PerpAccount::LEN);
const _: () = assert!(PERP_ACCOUNTS_OFFSET + MAX_PAIRS * PerpAccount::LEN <= MANGO_ACCOUNT_LEN);
const _: () = assert!(DELEGATE_OFFSET + 32 <= MANGO_ACCOUNT_LEN);
