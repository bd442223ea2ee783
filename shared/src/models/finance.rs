//! Double-entry accounting models: chart of accounts, journal, AR/AP, assets

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account classification in the chart of accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Revenue => "revenue",
            AccountType::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "asset" => Some(AccountType::Asset),
            "liability" => Some(AccountType::Liability),
            "equity" => Some(AccountType::Equity),
            "revenue" => Some(AccountType::Revenue),
            "expense" => Some(AccountType::Expense),
            _ => None,
        }
    }

    /// Side the account normally carries its balance on
    pub fn normal_balance(&self) -> BalanceSide {
        match self {
            AccountType::Asset | AccountType::Expense => BalanceSide::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
                BalanceSide::Credit
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceSide {
    Debit,
    Credit,
}

/// One account in the chart of accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartOfAccount {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Journal entry lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalStatus {
    Draft,
    Posted,
    Void,
}

impl JournalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalStatus::Draft => "draft",
            JournalStatus::Posted => "posted",
            JournalStatus::Void => "void",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(JournalStatus::Draft),
            "posted" => Some(JournalStatus::Posted),
            "void" => Some(JournalStatus::Void),
            _ => None,
        }
    }
}

/// A journal entry header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    /// Format JE-YYYY-NNNN
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub status: JournalStatus,
    /// Set on the reversing entry created by a void, and on the voided
    /// entry pointing at its reversal
    pub reversal_of: Option<Uuid>,
    pub posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A debit or credit line on a journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntryItem {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub account_id: Uuid,
    pub debit: Decimal,
    pub credit: Decimal,
    pub memo: Option<String>,
}

/// Line input used when creating a journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLineInput {
    pub account_id: Uuid,
    pub debit: Decimal,
    pub credit: Decimal,
    pub memo: Option<String>,
}

/// Monthly accounting period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialPeriod {
    pub id: Uuid,
    pub year: i32,
    pub month: u32,
    pub is_closed: bool,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Invoice settlement state, derived from paid vs total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Unpaid,
    Partial,
    Paid,
    Void,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Unpaid => "unpaid",
            SettlementStatus::Partial => "partial",
            SettlementStatus::Paid => "paid",
            SettlementStatus::Void => "void",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(SettlementStatus::Unpaid),
            "partial" => Some(SettlementStatus::Partial),
            "paid" => Some(SettlementStatus::Paid),
            "void" => Some(SettlementStatus::Void),
            _ => None,
        }
    }

    /// Derive the state from amounts; paid is reached at the exact
    /// outstanding boundary
    pub fn derive(total: Decimal, paid: Decimal) -> Self {
        if paid <= Decimal::ZERO {
            SettlementStatus::Unpaid
        } else if paid >= total {
            SettlementStatus::Paid
        } else {
            SettlementStatus::Partial
        }
    }
}

/// Customer invoice (accounts receivable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    /// Format INV-YYYY-NNNN
    pub invoice_number: String,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub status: SettlementStatus,
    pub created_at: DateTime<Utc>,
}

/// Vendor of materials and services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Vendor bill (accounts payable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: Uuid,
    /// Format BILL-YYYY-NNNN
    pub bill_number: String,
    pub vendor_id: Uuid,
    pub bill_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub status: SettlementStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "transfer" => Some(PaymentMethod::Transfer),
            _ => None,
        }
    }
}

/// A recorded payment, always linked to the journal entry it posted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub invoice_id: Option<Uuid>,
    pub bill_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub journal_entry_id: Uuid,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fixed asset depreciated straight-line over its useful life
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub name: String,
    pub acquisition_cost: Decimal,
    pub acquisition_date: NaiveDate,
    pub useful_life_months: i32,
    pub salvage_value: Decimal,
    pub accumulated_depreciation: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    /// Remaining book value above salvage
    pub fn depreciable_remainder(&self) -> Decimal {
        (self.acquisition_cost - self.salvage_value - self.accumulated_depreciation)
            .max(Decimal::ZERO)
    }

    /// Straight-line monthly charge, capped at the remaining book value
    pub fn monthly_depreciation(&self) -> Decimal {
        if self.useful_life_months <= 0 {
            return Decimal::ZERO;
        }
        let base = (self.acquisition_cost - self.salvage_value).max(Decimal::ZERO);
        let monthly = base / Decimal::from(self.useful_life_months);
        monthly.min(self.depreciable_remainder())
    }
}

/// One line of the trial balance report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceLine {
    pub account_id: Uuid,
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub debit_total: Decimal,
    pub credit_total: Decimal,
}

/// Trial balance over posted entries up to a date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalance {
    pub as_of: NaiveDate,
    pub lines: Vec<TrialBalanceLine>,
    pub debit_total: Decimal,
    pub credit_total: Decimal,
}
