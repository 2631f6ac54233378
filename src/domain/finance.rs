use serde::{Deserialize, Serialize};

use crate::ids::new_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Expense,
    Income,
    Transfer,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
            TransactionType::Transfer => "transfer",
        }
    }

    /// Normalizes a raw magnitude into the stored signed amount: expenses are
    /// stored negative, income positive, transfers as supplied.
    pub fn signed_amount(self, raw: f64) -> f64 {
        match self {
            TransactionType::Expense => -raw.abs(),
            TransactionType::Income => raw.abs(),
            TransactionType::Transfer => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub description: String,
    /// Already signed; see [`TransactionType::signed_amount`].
    pub amount: f64,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    #[serde(default)]
    pub category: String,
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub date: String,
}

impl Transaction {
    pub fn new(
        description: impl Into<String>,
        raw_amount: f64,
        tx_type: TransactionType,
        account_id: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            description: description.into(),
            amount: tx_type.signed_amount(raw_amount),
            tx_type,
            category: String::new(),
            account_id: account_id.into(),
            project_id: None,
            date: date.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Credit,
    Investment,
    Cash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceAccount {
    pub id: String,
    pub name: String,
    pub account_type: AccountType,
    pub balance: f64,
    pub currency: String,
    #[serde(default)]
    pub include_in_net_worth: bool,
}

impl FinanceAccount {
    pub fn new(name: impl Into<String>, account_type: AccountType, currency: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            account_type,
            balance: 0.0,
            currency: currency.into(),
            include_in_net_worth: true,
        }
    }
}
