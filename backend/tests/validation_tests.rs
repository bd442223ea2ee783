//! Document number and contact format validation tests

use proptest::prelude::*;

use shared::validation::{
    validate_account_code, validate_email, validate_phone, validate_spk_number,
};

proptest! {
    /// Every generated SPK-YYYY-NNNN string validates.
    #[test]
    fn generated_spk_numbers_validate(year in 2000u32..2100, seq in 1u32..10_000) {
        let spk = format!("SPK-{}-{:04}", year, seq);
        prop_assert!(validate_spk_number(&spk).is_ok());
    }

    /// Indonesian mobile numbers in canonical +62 form validate; the
    /// local 08xx form is normalized before storage, never accepted raw.
    #[test]
    fn indonesian_numbers_validate(digits in "8[0-9]{8,10}") {
        let international = format!("+62{}", digits);
        let local = format!("0{}", digits);
        prop_assert!(validate_phone(&international).is_ok(), "rejected {}", international);
        prop_assert!(validate_phone(&local).is_err(), "accepted {}", local);
    }
}

#[test]
fn spk_number_rejects_wrong_prefix() {
    assert!(validate_spk_number("INV-2026-0001").is_err());
}

#[test]
fn spk_number_rejects_short_sequence() {
    assert!(validate_spk_number("SPK-2026-001").is_err());
}

#[test]
fn spk_number_rejects_two_digit_year() {
    assert!(validate_spk_number("SPK-26-0001").is_err());
}

#[test]
fn spk_number_rejects_garbage() {
    assert!(validate_spk_number("SPK20260001").is_err());
    assert!(validate_spk_number("").is_err());
    assert!(validate_spk_number("SPK-YYYY-NNNN").is_err());
}

#[test]
fn account_code_is_numeric() {
    assert!(validate_account_code("1100").is_ok());
    assert!(validate_account_code("11A0").is_err());
    assert!(validate_account_code("").is_err());
}

#[test]
fn phone_rejects_letters_and_short_numbers() {
    assert!(validate_phone("+62812abc").is_err());
    assert!(validate_phone("+62812").is_err());
    assert!(validate_phone("0812345678").is_err());
}

#[test]
fn email_basic_shape() {
    assert!(validate_email("kasir@tokoprint.co.id").is_ok());
    assert!(validate_email("not-an-email").is_err());
}
