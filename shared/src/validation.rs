//! Validation rules for PrintFlow ERP
//!
//! Centralizes the double-entry balance invariant and the document-number
//! and contact formats used across the backend.

use rust_decimal::Decimal;

use crate::models::JournalLineInput;

/// Tolerance for the debits = credits invariant (rounding slack)
pub fn balance_tolerance() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

/// Validate a set of journal lines forms a balanced double-entry document
///
/// Rules: at least two lines, every line carries debit xor credit > 0, no
/// negative amounts, and |Σdebit − Σcredit| ≤ 0.01.
pub fn validate_balanced(lines: &[JournalLineInput]) -> Result<(), &'static str> {
    if lines.len() < 2 {
        return Err("Journal entry requires at least two lines");
    }
    for line in lines {
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err("Journal amounts cannot be negative");
        }
        let has_debit = line.debit > Decimal::ZERO;
        let has_credit = line.credit > Decimal::ZERO;
        if has_debit == has_credit {
            return Err("Each line must carry either a debit or a credit");
        }
    }
    let debit_total: Decimal = lines.iter().map(|l| l.debit).sum();
    let credit_total: Decimal = lines.iter().map(|l| l.credit).sum();
    if (debit_total - credit_total).abs() > balance_tolerance() {
        return Err("Journal entry is not balanced");
    }
    Ok(())
}

/// Difference between total debits and credits, signed
pub fn balance_difference(lines: &[JournalLineInput]) -> Decimal {
    let debit_total: Decimal = lines.iter().map(|l| l.debit).sum();
    let credit_total: Decimal = lines.iter().map(|l| l.credit).sum();
    debit_total - credit_total
}

/// Validate SPK number format: SPK-YYYY-NNNN
pub fn validate_spk_number(spk: &str) -> Result<(), &'static str> {
    let parts: Vec<&str> = spk.split('-').collect();
    if parts.len() != 3 || parts[0] != "SPK" {
        return Err("SPK number must look like SPK-YYYY-NNNN");
    }
    if parts[1].len() != 4 || parts[1].parse::<u32>().is_err() {
        return Err("SPK number year must be four digits");
    }
    if parts[2].len() != 4 || parts[2].parse::<u32>().is_err() {
        return Err("SPK number sequence must be four digits");
    }
    Ok(())
}

/// Validate account code format (numeric, 3-10 digits, e.g. "1100")
pub fn validate_account_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 3 || code.len() > 10 {
        return Err("Account code must be 3-10 digits");
    }
    if !code.chars().all(|c| c.is_ascii_digit()) {
        return Err("Account code must be numeric");
    }
    Ok(())
}

/// Validate an Indonesian phone number in +62 form
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let Some(rest) = phone.strip_prefix("+62") else {
        return Err("Phone number must start with +62");
    };
    if rest.len() < 8 || rest.len() > 12 {
        return Err("Phone number length out of range");
    }
    if !rest.chars().all(|c| c.is_ascii_digit()) {
        return Err("Phone number must be digits after +62");
    }
    Ok(())
}

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn line(debit: &str, credit: &str) -> JournalLineInput {
        JournalLineInput {
            account_id: Uuid::new_v4(),
            debit: debit.parse().unwrap(),
            credit: credit.parse().unwrap(),
            memo: None,
        }
    }

    #[test]
    fn balanced_entry_passes() {
        let lines = vec![line("150000", "0"), line("0", "150000")];
        assert!(validate_balanced(&lines).is_ok());
    }

    #[test]
    fn tolerance_absorbs_rounding() {
        let lines = vec![line("100.00", "0"), line("0", "100.01")];
        assert!(validate_balanced(&lines).is_ok());
        let lines = vec![line("100.00", "0"), line("0", "100.02")];
        assert!(validate_balanced(&lines).is_err());
    }

    #[test]
    fn line_with_both_sides_rejected() {
        let lines = vec![line("50", "50"), line("0", "0")];
        assert!(validate_balanced(&lines).is_err());
    }

    #[test]
    fn spk_format() {
        assert!(validate_spk_number("SPK-2026-0001").is_ok());
        assert!(validate_spk_number("SPK-26-1").is_err());
        assert!(validate_spk_number("INV-2026-0001").is_err());
    }

    #[test]
    fn phone_format() {
        assert!(validate_phone("+628123456789").is_ok());
        assert!(validate_phone("08123456789").is_err());
    }
}
