use anchor_lang::prelude::*;

pub mod mango;
pub mod risk;

use mango::{MangoAccountView, MangoLayoutError, MAX_PAIRS};
pub use risk::{evaluate_order, MarketInfo};

declare_id!("9PWdBsc63S4PZm5XdezHxz681uweUf94534iKyrXRuy8");

pub const SEED_PHRASE: &[u8; 10] = b"risk-check";

// Risk checker keeps a per-market position limit for a trader and validates
// prospective perp orders against the trader's live Mango v3 account.
#[program]
pub mod risk_checker {
    use super::*;

    pub fn initialize(ctx: Context<Initialize>, market_index: u8, valid_range: u64) -> Result<()> {
        require!(
            (market_index as usize) < MAX_PAIRS,
            RiskCheckError::InvalidMarketIndex
        );

        let risk_checker_account = &mut ctx.accounts.risk_checker_account;
        risk_checker_account.authority = ctx.accounts.authority.key();
        risk_checker_account.bump = ctx.bumps.risk_checker_account;
        risk_checker_account.market_index = market_index;
        risk_checker_account.valid_range = valid_range;
        msg!(
            "✅ Risk checker initialized for market {} with valid range {}",
            market_index,
            valid_range
        );

        let clock = Clock::get()?;
        emit!(RiskCheckerInitialized {
            authority: risk_checker_account.authority,
            market_index,
            valid_range,
            timestamp: clock.unix_timestamp,
        });

        Ok(())
    }

    /// Replace the limit. Only the authority that created the account can call.
    pub fn update_valid_range(ctx: Context<UpdateValidRange>, new_valid_range: u64) -> Result<()> {
        let risk_checker_account = &mut ctx.accounts.risk_checker_account;
        let old_valid_range = risk_checker_account.valid_range;
        risk_checker_account.valid_range = new_valid_range;
        msg!(
            "✅ Valid range updated: {} -> {} (market {})",
            old_valid_range,
            new_valid_range,
            risk_checker_account.market_index
        );

        let clock = Clock::get()?;
        emit!(ValidRangeUpdated {
            authority: risk_checker_account.authority,
            market_index: risk_checker_account.market_index,
            old_valid_range,
            new_valid_range,
            timestamp: clock.unix_timestamp,
        });

        Ok(())
    }

    /// Fails the transaction when the order could push the worst-case perp
    /// position outside `[-valid_range, valid_range]`.
    pub fn check_risk(
        ctx: Context<CheckRisk>,
        market_type: MarketType,
        order_direction: OrderSide,
        order_amount: i64,
    ) -> Result<()> {
        require!(
            market_type == MarketType::Perp,
            RiskCheckError::UnsupportedMarketType
        );
        require!(order_amount > 0, RiskCheckError::InvalidOrderAmount);

        let risk_checker_account = &ctx.accounts.risk_checker_account;
        let market_info = get_mango_account_info(
            ctx.accounts.mango_program.key,
            ctx.accounts.mango_group.key,
            &ctx.accounts.mango_account.to_account_info(),
            ctx.accounts.authority.key,
            risk_checker_account.market_index,
        )?;

        let projected_position = evaluate_order(
            &market_info,
            order_direction,
            order_amount,
            risk_checker_account.valid_range,
        )?;
        msg!(
            "✅ Risk check passed: projected position {} within ±{}",
            projected_position,
            risk_checker_account.valid_range
        );

        let clock = Clock::get()?;
        emit!(RiskChecked {
            authority: risk_checker_account.authority,
            market_index: risk_checker_account.market_index,
            side: order_direction,
            order_amount,
            perp_position: market_info.perp_position,
            projected_position,
            valid_range: risk_checker_account.valid_range,
            timestamp: clock.unix_timestamp,
        });

        Ok(())
    }
}

/// Loads the Mango account and extracts the perp exposure for `market_index`.
/// `trader` must be the account's owner or its delegate.
pub fn get_mango_account_info(
    mango_program_id: &Pubkey,
    mango_group_id: &Pubkey,
    mango_account_info: &AccountInfo,
    trader: &Pubkey,
    market_index: u8,
) -> Result<MarketInfo> {
    let data = mango_account_info.try_borrow_data()?;
    let mango_account = MangoAccountView::load_checked(
        &data,
        mango_account_info.owner,
        mango_program_id,
        mango_group_id,
    )?;
    require!(
        mango_account.is_operated_by(trader),
        RiskCheckError::MangoAccountOwnerMismatch
    );
    let perp_account = mango_account.perp_account(market_index)?;
    Ok(MarketInfo::from(&perp_account))
}

#[derive(Accounts)]
#[instruction(market_index: u8)]
pub struct Initialize<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        init,
        payer = authority,
        space = 8 + RiskCheckerAccount::LEN,
        seeds = [SEED_PHRASE, [market_index].as_ref(), authority.key().as_ref()],
        bump
    )]
    pub risk_checker_account: Account<'info, RiskCheckerAccount>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct UpdateValidRange<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        has_one = authority @ RiskCheckError::Unauthorized,
        seeds = [SEED_PHRASE, [risk_checker_account.market_index].as_ref(), authority.key().as_ref()],
        bump = risk_checker_account.bump
    )]
    pub risk_checker_account: Account<'info, RiskCheckerAccount>,
}

#[derive(Accounts)]
pub struct CheckRisk<'info> {
    pub authority: Signer<'info>,

    #[account(
        has_one = authority @ RiskCheckError::Unauthorized,
        seeds = [SEED_PHRASE, [risk_checker_account.market_index].as_ref(), authority.key().as_ref()],
        bump = risk_checker_account.bump
    )]
    pub risk_checker_account: Account<'info, RiskCheckerAccount>,

    /// CHECK: only used as the expected owner of `mango_account`.
    pub mango_program: UncheckedAccount<'info>,
    /// CHECK: owner, size, header and group are validated by `MangoAccountView::load_checked`.
    pub mango_account: UncheckedAccount<'info>,
    /// CHECK: compared against the group stored in `mango_account`.
    pub mango_group: UncheckedAccount<'info>,

    /// CHECK: perp market state, read-only.
    pub perp_market: UncheckedAccount<'info>,
    /// CHECK: perp market bids, read-only.
    pub perp_market_bids: UncheckedAccount<'info>,
    /// CHECK: perp market asks, read-only.
    pub perp_market_asks: UncheckedAccount<'info>,

    /// CHECK: spot market state, read-only.
    pub spot_market: UncheckedAccount<'info>,
    /// CHECK: spot market bids, read-only.
    pub spot_market_bids: UncheckedAccount<'info>,
    /// CHECK: spot market asks, read-only.
    pub spot_market_asks: UncheckedAccount<'info>,
}

#[account]
#[derive(Default)]
pub struct RiskCheckerAccount {
    pub authority: Pubkey,
    pub bump: u8,
    pub market_index: u8,
    /// Maximum absolute worst-case perp position, in base lots.
    pub valid_range: u64,
}

impl RiskCheckerAccount {
    pub const LEN: usize = 32 + 1 + 1 + 8;
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarketType {
    Perp,
    Spot,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderSide {
    Long,
    Short,
}

#[event]
pub struct RiskCheckerInitialized {
    pub authority: Pubkey,
    pub market_index: u8,
    pub valid_range: u64,
    pub timestamp: i64,
}

#[event]
pub struct ValidRangeUpdated {
    pub authority: Pubkey,
    pub market_index: u8,
    pub old_valid_range: u64,
    pub new_valid_range: u64,
    pub timestamp: i64,
}

#[event]
pub struct RiskChecked {
    pub authority: Pubkey,
    pub market_index: u8,
    pub side: OrderSide,
    pub order_amount: i64,
    pub perp_position: i64,
    pub projected_position: i128,
    pub valid_range: u64,
    pub timestamp: i64,
}

#[error_code]
pub enum RiskCheckError {
    #[msg("Unauthorized risk checker access")]
    Unauthorized,
    #[msg("Market index must be below the Mango pair limit")]
    InvalidMarketIndex,
    #[msg("Only perp markets can be risk checked")]
    UnsupportedMarketType,
    #[msg("Order amount must be positive")]
    InvalidOrderAmount,
    #[msg("Mango account is not owned by the Mango program")]
    InvalidMangoAccountOwner,
    #[msg("Mango account data is malformed")]
    InvalidMangoAccountData,
    #[msg("Mango account belongs to a different group")]
    MangoGroupMismatch,
    #[msg("Resting order quantity is negative")]
    InvalidOrderQuantity,
    #[msg("Order would exceed the valid position range")]
    RiskLimitExceeded,
    #[msg("Math overflow")]
    MathOverflow,
    #[msg("Signer is neither the owner nor the delegate of the Mango account")]
    MangoAccountOwnerMismatch,
}

impl From<MangoLayoutError> for anchor_lang::error::Error {
    fn from(err: MangoLayoutError) -> Self {
        msg!("Mango account rejected: {}", err);
        let code = match err {
            MangoLayoutError::InvalidOwner => RiskCheckError::InvalidMangoAccountOwner,
            MangoLayoutError::InvalidLength { .. }
            | MangoLayoutError::WrongDataType(_)
            | MangoLayoutError::Uninitialized => RiskCheckError::InvalidMangoAccountData,
            MangoLayoutError::GroupMismatch => RiskCheckError::MangoGroupMismatch,
            MangoLayoutError::MarketIndexOutOfRange(_) => RiskCheckError::InvalidMarketIndex,
        };
        code.into()
    }
}
