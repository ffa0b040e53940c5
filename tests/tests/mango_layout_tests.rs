
use anchor_lang::prelude::Pubkey;
use common::setup::{mango_account_data, perp_account, set_delegate};
use fixed::types::I80F48;
use risk_checker::mango::{
    MangoAccountView, MangoLayoutError, PerpAccount, DATA_TYPE_OFFSET, IS_INITIALIZED_OFFSET,
    MANGO_ACCOUNT_LEN, MAX_PAIRS,
};

struct Keys {
    program: Pubkey,
    group: Pubkey,
    owner: Pubkey,
}

fn keys() -> Keys {
    Keys {
        program: Pubkey::new_unique(),
        group: Pubkey::new_unique(),
        owner: Pubkey::new_unique(),
    }
}

#[test]
fn test_reads_header_and_perp_account() {
    let k = keys();
    let mut perp = perp_account(-12, 3, 8, 20);
    perp.quote_position = I80F48::from_num(-1234.5).to_le_bytes();
    let data = mango_account_data(k.group, k.owner, 7, perp);

    let view = MangoAccountView::load_checked(&data, &k.program, &k.program, &k.group).unwrap();
    assert_eq!(view.mango_group(), k.group);
    assert_eq!(view.owner(), k.owner);
    assert_eq!(view.delegate(), Pubkey::default());

    let read = view.perp_account(7).unwrap();
    assert_eq!(read, perp);
    assert_eq!(I80F48::from_le_bytes(read.quote_position), I80F48::from_num(-1234.5));
    assert_eq!(view.perp_account(6).unwrap(), PerpAccount::default());
}

#[test]
fn test_last_market_slot_is_in_bounds() {
    let k = keys();
    let perp = perp_account(1, 2, 3, 4);
    let data = mango_account_data(k.group, k.owner, (MAX_PAIRS - 1) as u8, perp);
    let view = MangoAccountView::load_checked(&data, &k.program, &k.program, &k.group).unwrap();
    assert_eq!(view.perp_account((MAX_PAIRS - 1) as u8).unwrap(), perp);
    assert_eq!(
        view.perp_account(MAX_PAIRS as u8),
        Err(MangoLayoutError::MarketIndexOutOfRange(MAX_PAIRS as u8))
    );
}

#[test]
fn test_rejects_foreign_owner() {
    let k = keys();
    let data = mango_account_data(k.group, k.owner, 0, PerpAccount::default());
    let result = MangoAccountView::load_checked(&data, &Pubkey::new_unique(), &k.program, &k.group);
    assert_eq!(result.err(), Some(MangoLayoutError::InvalidOwner));
}

#[test]
fn test_rejects_wrong_length() {
    let k = keys();
    let mut data = mango_account_data(k.group, k.owner, 0, PerpAccount::default());
    data.push(0);
    let result = MangoAccountView::load_checked(&data, &k.program, &k.program, &k.group);
    assert_eq!(
        result.err(),
        Some(MangoLayoutError::InvalidLength {
            expected: MANGO_ACCOUNT_LEN,
            actual: MANGO_ACCOUNT_LEN + 1,
        })
    );
}

#[test]
fn test_rejects_other_data_types_and_uninitialized() {
    let k = keys();
    let mut data = mango_account_data(k.group, k.owner, 0, PerpAccount::default());
    data[DATA_TYPE_OFFSET] = 4;
    let result = MangoAccountView::load_checked(&data, &k.program, &k.program, &k.group);
    assert_eq!(result.err(), Some(MangoLayoutError::WrongDataType(4)));

    let mut data = mango_account_data(k.group, k.owner, 0, PerpAccount::default());
    data[IS_INITIALIZED_OFFSET] = 0;
    let result = MangoAccountView::load_checked(&data, &k.program, &k.program, &k.group);
    assert_eq!(result.err(), Some(MangoLayoutError::Uninitialized));
}

#[test]
fn test_rejects_group_mismatch() {
    let k = keys();
    let data = mango_account_data(k.group, k.owner, 0, PerpAccount::default());
    let result = MangoAccountView::load_checked(&data, &k.program, &k.program, &Pubkey::new_unique());
    assert_eq!(result.err(), Some(MangoLayoutError::GroupMismatch));
}

#[test]
fn test_operated_by_owner_or_delegate() {
    let k = keys();
    let delegate = Pubkey::new_unique();
    let mut data = mango_account_data(k.group, k.owner, 0, PerpAccount::default());
    let view = MangoAccountView::load_checked(&data, &k.program, &k.program, &k.group).unwrap();
    assert!(view.is_operated_by(&k.owner));
    assert!(!view.is_operated_by(&delegate));
    // an unset delegate must not authorize the default key
    assert!(!view.is_operated_by(&Pubkey::default()));

    set_delegate(&mut data, delegate);
    let view = MangoAccountView::load_checked(&data, &k.program, &k.program, &k.group).unwrap();
    assert_eq!(view.delegate(), delegate);
    assert!(view.is_operated_by(&delegate));
    assert!(view.is_operated_by(&k.owner));
    assert!(!view.is_operated_by(&Pubkey::new_unique()));
}
