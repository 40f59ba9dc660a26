// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory ledger store for the guarded capability groups.
//!
//! Every operation is keyed by the caller's subject identifier, taken from
//! the verified identity claim. Data never crosses users.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Utc};
use uuid::Uuid;

use crate::auth::IdentityClaim;
use crate::error::ApiError;
use crate::models::{
    AnalyticsSummary, Balance, Bill, CategoryTotal, ClearDataResponse, CreateBillRequest,
    CreateTransactionRequest, Profile, Transaction, TransactionKind, UpdateProfileRequest,
};

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Default)]
struct UserLedger {
    transactions: HashMap<String, Transaction>,
    bills: HashMap<String, Bill>,
    profile: Option<Profile>,
    balance_cents: i64,
}

#[derive(Default)]
pub struct InMemoryStore {
    ledgers: HashMap<String, UserLedger>,
}

/// A calendar month filter (`YYYY-MM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
            .map(|date| Month {
                year: date.year(),
                month: date.month(),
            })
            .map_err(|_| ApiError::bad_request("month must be formatted as YYYY-MM"))
    }

    fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

fn require_positive(amount_cents: i64) -> Result<(), ApiError> {
    if amount_cents <= 0 {
        Err(ApiError::bad_request("amount_cents must be greater than zero"))
    } else {
        Ok(())
    }
}

fn require_text(value: &str, field: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ApiError::bad_request(format!("{field} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}

fn apply(balance: i64, delta: i64) -> Result<i64, ApiError> {
    balance
        .checked_add(delta)
        .ok_or_else(|| ApiError::bad_request("balance would overflow"))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger(&self, user_id: &str) -> Option<&UserLedger> {
        self.ledgers.get(user_id)
    }

    fn ledger_mut(&mut self, user_id: &str) -> &mut UserLedger {
        self.ledgers.entry(user_id.to_string()).or_default()
    }

    // -------------------------------------------------------------------------
    // Transactions
    // -------------------------------------------------------------------------

    /// Newest first.
    pub fn list_transactions(&self, user_id: &str) -> Vec<Transaction> {
        let mut transactions: Vec<Transaction> = self
            .ledger(user_id)
            .map(|ledger| ledger.transactions.values().cloned().collect())
            .unwrap_or_default();
        transactions.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        transactions
    }

    pub fn create_transaction(
        &mut self,
        user_id: &str,
        request: CreateTransactionRequest,
    ) -> Result<Transaction, ApiError> {
        require_positive(request.amount_cents)?;
        let category = require_text(&request.category, "category")?;
        let now = Utc::now();

        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            kind: request.kind,
            amount_cents: request.amount_cents,
            category,
            description: request.description.unwrap_or_default().trim().to_string(),
            date: request.date.unwrap_or_else(|| now.date_naive()),
            created_at: now,
        };

        let ledger = self.ledger_mut(user_id);
        ledger.balance_cents = apply(ledger.balance_cents, transaction.signed_amount())?;
        ledger
            .transactions
            .insert(transaction.id.clone(), transaction.clone());
        Ok(transaction)
    }

    pub fn delete_transaction(&mut self, user_id: &str, transaction_id: &str) -> Result<(), ApiError> {
        let ledger = self.ledger_mut(user_id);
        let signed = ledger
            .transactions
            .get(transaction_id)
            .map(Transaction::signed_amount)
            .ok_or_else(|| ApiError::not_found("Transaction not found"))?;
        ledger.balance_cents = apply(ledger.balance_cents, -signed)?;
        ledger.transactions.remove(transaction_id);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Bills
    // -------------------------------------------------------------------------

    /// Soonest due first.
    pub fn list_bills(&self, user_id: &str) -> Vec<Bill> {
        let mut bills: Vec<Bill> = self
            .ledger(user_id)
            .map(|ledger| ledger.bills.values().cloned().collect())
            .unwrap_or_default();
        bills.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.name.cmp(&b.name)));
        bills
    }

    pub fn create_bill(&mut self, user_id: &str, request: CreateBillRequest) -> Result<Bill, ApiError> {
        require_positive(request.amount_cents)?;
        let bill = Bill {
            id: Uuid::new_v4().to_string(),
            name: require_text(&request.name, "name")?,
            amount_cents: request.amount_cents,
            due_date: request.due_date,
            category: request
                .category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            paid: false,
        };
        self.ledger_mut(user_id)
            .bills
            .insert(bill.id.clone(), bill.clone());
        Ok(bill)
    }

    pub fn set_bill_paid(&mut self, user_id: &str, bill_id: &str, paid: bool) -> Result<Bill, ApiError> {
        let bill = self
            .ledger_mut(user_id)
            .bills
            .get_mut(bill_id)
            .ok_or_else(|| ApiError::not_found("Bill not found"))?;
        bill.paid = paid;
        Ok(bill.clone())
    }

    pub fn delete_bill(&mut self, user_id: &str, bill_id: &str) -> Result<(), ApiError> {
        if self.ledger_mut(user_id).bills.remove(bill_id).is_some() {
            Ok(())
        } else {
            Err(ApiError::not_found("Bill not found"))
        }
    }

    // -------------------------------------------------------------------------
    // Profile & balance
    // -------------------------------------------------------------------------

    /// Stored profile, or one derived from the identity claim.
    pub fn profile(&self, claim: &IdentityClaim) -> Profile {
        self.ledger(&claim.sub)
            .and_then(|ledger| ledger.profile.clone())
            .unwrap_or_else(|| Profile {
                user_id: claim.sub.clone(),
                name: claim.name.clone(),
                email: claim.email.clone(),
                currency: DEFAULT_CURRENCY.to_string(),
                monthly_budget_cents: None,
            })
    }

    pub fn update_profile(
        &mut self,
        claim: &IdentityClaim,
        request: UpdateProfileRequest,
    ) -> Result<Profile, ApiError> {
        let mut profile = self.profile(claim);

        if let Some(name) = request.name {
            profile.name = require_text(&name, "name")?;
        }
        if let Some(currency) = request.currency {
            let currency = currency.trim().to_ascii_uppercase();
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ApiError::bad_request("currency must be a 3-letter ISO code"));
            }
            profile.currency = currency;
        }
        if let Some(budget) = request.monthly_budget_cents {
            if budget < 0 {
                return Err(ApiError::bad_request("monthly_budget_cents cannot be negative"));
            }
            profile.monthly_budget_cents = Some(budget);
        }

        self.ledger_mut(&claim.sub).profile = Some(profile.clone());
        Ok(profile)
    }

    pub fn balance(&self, user_id: &str) -> Balance {
        Balance {
            balance_cents: self.ledger(user_id).map(|l| l.balance_cents).unwrap_or(0),
        }
    }

    pub fn set_balance(&mut self, user_id: &str, balance_cents: i64) -> Balance {
        self.ledger_mut(user_id).balance_cents = balance_cents;
        Balance { balance_cents }
    }

    // -------------------------------------------------------------------------
    // Analytics & data management
    // -------------------------------------------------------------------------

    pub fn analytics(&self, user_id: &str, month: Option<Month>) -> AnalyticsSummary {
        let mut income_cents = 0i64;
        let mut expense_cents = 0i64;
        let mut by_category: HashMap<String, i64> = HashMap::new();
        let mut unpaid_bills = 0usize;
        let mut unpaid_bills_cents = 0i64;

        if let Some(ledger) = self.ledger(user_id) {
            let in_range = |date: NaiveDate| month.map_or(true, |m| m.contains(date));

            for tx in ledger.transactions.values().filter(|tx| in_range(tx.date)) {
                match tx.kind {
                    TransactionKind::Income => {
                        income_cents = income_cents.saturating_add(tx.amount_cents)
                    }
                    TransactionKind::Expense => {
                        expense_cents = expense_cents.saturating_add(tx.amount_cents);
                        let total = by_category.entry(tx.category.clone()).or_default();
                        *total = total.saturating_add(tx.amount_cents);
                    }
                }
            }

            for bill in ledger
                .bills
                .values()
                .filter(|bill| !bill.paid && in_range(bill.due_date))
            {
                unpaid_bills += 1;
                unpaid_bills_cents = unpaid_bills_cents.saturating_add(bill.amount_cents);
            }
        }

        let mut expense_by_category: Vec<CategoryTotal> = by_category
            .into_iter()
            .map(|(category, amount_cents)| CategoryTotal {
                category,
                amount_cents,
            })
            .collect();
        expense_by_category.sort_by(|a, b| {
            b.amount_cents
                .cmp(&a.amount_cents)
                .then_with(|| a.category.cmp(&b.category))
        });

        AnalyticsSummary {
            month: month.map(|m| m.to_string()),
            income_cents,
            expense_cents,
            net_cents: income_cents.saturating_sub(expense_cents),
            expense_by_category,
            unpaid_bills,
            unpaid_bills_cents,
        }
    }

    /// Remove the caller's transactions and bills and reset the balance.
    /// The profile is kept.
    pub fn clear(&mut self, user_id: &str) -> ClearDataResponse {
        let ledger = self.ledger_mut(user_id);
        let response = ClearDataResponse {
            transactions_removed: ledger.transactions.len(),
            bills_removed: ledger.bills.len(),
        };
        ledger.transactions.clear();
        ledger.bills.clear();
        ledger.balance_cents = 0;
        response
    }
}
