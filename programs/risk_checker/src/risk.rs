use crate::mango::PerpAccount;
use crate::{OrderSide, RiskCheckError};
use anchor_lang::prelude::*;

/// Perp exposure of a Mango account on a single market, in base lots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MarketInfo {
    pub perp_position: i64,
    /// Position that has not yet been consumed from the event queue.
    pub perp_unconsumed_position: i64,
    pub perp_long_order_quantity: i64,
    pub perp_short_order_quantity: i64,
}

impl From<&PerpAccount> for MarketInfo {
    fn from(perp: &PerpAccount) -> Self {
        Self {
            perp_position: perp.base_position,
            perp_unconsumed_position: perp.taker_base,
            perp_long_order_quantity: perp.bids_quantity,
            perp_short_order_quantity: perp.asks_quantity,
        }
    }
}

impl MarketInfo {
    /// Settled plus unconsumed position.
    pub fn effective_position(&self) -> i128 {
        self.perp_position as i128 + self.perp_unconsumed_position as i128
    }

    /// Position if every resting order on `side` and the new order fill.
    pub fn worst_case_position(&self, side: OrderSide, order_amount: i64) -> Result<i128> {
        require!(
            self.perp_long_order_quantity >= 0 && self.perp_short_order_quantity >= 0,
            RiskCheckError::InvalidOrderQuantity
        );
        let base = self.effective_position();
        let projected = match side {
            OrderSide::Long => base
                .checked_add(self.perp_long_order_quantity as i128)
                .and_then(|v| v.checked_add(order_amount as i128)),
            OrderSide::Short => base
                .checked_sub(self.perp_short_order_quantity as i128)
                .and_then(|v| v.checked_sub(order_amount as i128)),
        };
        projected.ok_or_else(|| error!(RiskCheckError::MathOverflow))
    }
}

/// Returns the projected worst-case position when it stays within
/// `[-valid_range, valid_range]`.
pub fn evaluate_order(
    info: &MarketInfo,
    side: OrderSide,
    order_amount: i64,
    valid_range: u64,
) -> Result<i128> {
    require!(order_amount > 0, RiskCheckError::InvalidOrderAmount);
    let projected = info.worst_case_position(side, order_amount)?;
    let limit = valid_range as i128;
    let within = match side {
        OrderSide::Long => projected <= limit,
        OrderSide::Short => projected >= -limit,
    };
    require!(within, RiskCheckError::RiskLimitExceeded);
    Ok(projected)
}
