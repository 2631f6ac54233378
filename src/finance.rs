use std::error::Error;
use std::fmt;

use crate::domain::{FinanceAccount, Transaction, TransactionType};
use crate::gateway::{FinanceGateway, GatewayError};

#[derive(Debug)]
pub enum FinanceError {
    AccountNotFound(String),
    TransactionNotFound(String),
    Gateway(GatewayError),
}

impl fmt::Display for FinanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinanceError::AccountNotFound(id) => write!(f, "account '{}' not found", id),
            FinanceError::TransactionNotFound(id) => write!(f, "transaction '{}' not found", id),
            FinanceError::Gateway(err) => write!(f, "persistence failure: {}", err),
        }
    }
}

impl Error for FinanceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FinanceError::Gateway(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GatewayError> for FinanceError {
    fn from(value: GatewayError) -> Self {
        FinanceError::Gateway(value)
    }
}

/// Satellite store for accounts and transactions. Same optimistic shape as
/// the item store — local first, rollback on gateway rejection — without
/// relationship inference or a realtime merge path.
pub struct FinanceStore {
    gateway: Box<dyn FinanceGateway>,
    accounts: Vec<FinanceAccount>,
    transactions: Vec<Transaction>,
}

impl FinanceStore {
    pub fn new(gateway: Box<dyn FinanceGateway>) -> Self {
        Self {
            gateway,
            accounts: Vec::new(),
            transactions: Vec::new(),
        }
    }

    pub fn accounts(&self) -> &[FinanceAccount] {
        &self.accounts
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn account(&self, id: &str) -> Option<&FinanceAccount> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn load(&mut self) -> Result<(), FinanceError> {
        let accounts = self.gateway.fetch_accounts()?;
        let transactions = self.gateway.fetch_transactions()?;
        self.accounts = accounts;
        self.transactions = transactions;
        Ok(())
    }

    pub fn add_account(&mut self, account: FinanceAccount) -> Result<(), FinanceError> {
        self.accounts.insert(0, account.clone());
        if let Err(err) = self.gateway.upsert_account(&account) {
            self.accounts.retain(|existing| existing.id != account.id);
            return Err(err.into());
        }
        Ok(())
    }

    /// Adds a transaction whose amount is already signed (see
    /// [`TransactionType::signed_amount`]) and applies it to the owning
    /// account's balance. Both the prepend and the balance change roll back
    /// if the gateway rejects either write.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<(), FinanceError> {
        let account_position = self
            .accounts
            .iter()
            .position(|account| account.id == tx.account_id)
            .ok_or_else(|| FinanceError::AccountNotFound(tx.account_id.clone()))?;

        let delta = balance_delta(&tx);
        self.transactions.insert(0, tx.clone());
        self.accounts[account_position].balance += delta;

        if let Err(err) = self.gateway.upsert_transaction(&tx) {
            self.transactions.retain(|existing| existing.id != tx.id);
            self.accounts[account_position].balance -= delta;
            return Err(err.into());
        }
        if let Err(err) = self
            .gateway
            .upsert_account(&self.accounts[account_position])
        {
            // Balance write failed after the transaction landed; unwind the
            // transaction row so the persisted ledger and balance agree.
            if let Err(unwind_err) = self.gateway.delete_transaction(&tx.id) {
                log::error!(
                    "transaction '{}' stuck without its balance update: {}",
                    tx.id,
                    unwind_err
                );
            }
            self.transactions.retain(|existing| existing.id != tx.id);
            self.accounts[account_position].balance -= delta;
            return Err(err.into());
        }
        Ok(())
    }

    pub fn delete_transaction(&mut self, id: &str) -> Result<(), FinanceError> {
        let Some(position) = self.transactions.iter().position(|tx| tx.id == id) else {
            return Err(FinanceError::TransactionNotFound(id.to_string()));
        };
        let removed = self.transactions.remove(position);
        if let Err(err) = self.gateway.delete_transaction(id) {
            self.transactions.insert(position, removed);
            return Err(err.into());
        }
        let Some(account_position) = self
            .accounts
            .iter()
            .position(|account| account.id == removed.account_id)
        else {
            return Ok(());
        };
        self.accounts[account_position].balance -= balance_delta(&removed);
        if let Err(err) = self
            .gateway
            .upsert_account(&self.accounts[account_position])
        {
            // Same compensation in reverse: put the row back rather than
            // leave a balance that no longer matches the ledger.
            if let Err(unwind_err) = self.gateway.upsert_transaction(&removed) {
                log::error!(
                    "transaction '{}' deleted without its balance update: {}",
                    removed.id,
                    unwind_err
                );
            }
            self.accounts[account_position].balance += balance_delta(&removed);
            self.transactions.insert(position, removed);
            return Err(err.into());
        }
        Ok(())
    }

    /// Net worth across accounts opted into the net-worth figure.
    pub fn net_worth(&self) -> f64 {
        self.accounts
            .iter()
            .filter(|account| account.include_in_net_worth)
            .map(|account| account.balance)
            .sum()
    }
}

fn balance_delta(tx: &Transaction) -> f64 {
    // Amounts are stored signed, so the delta is the amount itself; the
    // match stays exhaustive so a new type forces a decision here.
    match tx.tx_type {
        TransactionType::Expense | TransactionType::Income | TransactionType::Transfer => tx.amount,
    }
}
