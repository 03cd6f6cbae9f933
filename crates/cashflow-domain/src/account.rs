//! Accounts as consumed by the forecasting engine.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, DomainError};

/// A financial account owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub currency: String,
    /// Signed balance at `initial_balance_date`. Credit accounts are negative.
    pub initial_balance: Decimal,
    pub initial_balance_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_limit: Option<Decimal>,
    #[serde(default = "Account::default_active")]
    pub is_active: bool,
}

impl Account {
    pub fn new(
        user_id: Uuid,
        name: impl Into<String>,
        kind: AccountKind,
        currency: impl Into<String>,
        initial_balance: Decimal,
        initial_balance_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            kind,
            currency: currency.into(),
            initial_balance,
            initial_balance_date,
            credit_limit: None,
            is_active: true,
        }
    }

    pub fn with_credit_limit(mut self, limit: Decimal) -> Self {
        self.credit_limit = Some(limit);
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn bucket(&self) -> AccountBucket {
        self.kind.bucket()
    }

    pub fn is_planning(&self) -> bool {
        self.kind == AccountKind::Planning
    }

    fn default_active() -> bool {
        true
    }
}

impl Owned for Account {
    fn user_id(&self) -> Uuid {
        self.user_id
    }
}

/// Enumerates the supported account classifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Checking,
    Savings,
    Cash,
    Investment,
    Retirement,
    CreditCard,
    Loan,
    LoanGiven,
    /// Placeholder money that is not yet attributed to a real account.
    Planning,
}

impl AccountKind {
    pub fn bucket(self) -> AccountBucket {
        match self {
            AccountKind::Checking | AccountKind::Savings | AccountKind::Cash => {
                AccountBucket::Liquid
            }
            AccountKind::Investment | AccountKind::Retirement => AccountBucket::Investment,
            AccountKind::CreditCard | AccountKind::Loan => AccountBucket::Credit,
            AccountKind::LoanGiven => AccountBucket::Receivable,
            AccountKind::Planning => AccountBucket::Planning,
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AccountKind::Checking => "checking",
            AccountKind::Savings => "savings",
            AccountKind::Cash => "cash",
            AccountKind::Investment => "investment",
            AccountKind::Retirement => "retirement",
            AccountKind::CreditCard => "credit_card",
            AccountKind::Loan => "loan",
            AccountKind::LoanGiven => "loan_given",
            AccountKind::Planning => "planning",
        };
        f.write_str(label)
    }
}

impl FromStr for AccountKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let kind = match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "checking" => AccountKind::Checking,
            "savings" => AccountKind::Savings,
            "cash" => AccountKind::Cash,
            "investment" => AccountKind::Investment,
            "retirement" => AccountKind::Retirement,
            "credit_card" => AccountKind::CreditCard,
            "loan" => AccountKind::Loan,
            "loan_given" => AccountKind::LoanGiven,
            "planning" => AccountKind::Planning,
            _ => {
                return Err(DomainError::UnknownKind {
                    kind: "account kind",
                    value: value.to_string(),
                })
            }
        };
        Ok(kind)
    }
}

/// Summary grouping used by dashboards and trends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountBucket {
    Liquid,
    Investment,
    Credit,
    Receivable,
    Planning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_buckets() {
        assert_eq!(AccountKind::Savings.bucket(), AccountBucket::Liquid);
        assert_eq!(AccountKind::Retirement.bucket(), AccountBucket::Investment);
        assert_eq!(AccountKind::Loan.bucket(), AccountBucket::Credit);
        assert_eq!(AccountKind::LoanGiven.bucket(), AccountBucket::Receivable);
        assert_eq!(AccountKind::Planning.bucket(), AccountBucket::Planning);
    }

    #[test]
    fn kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&AccountKind::CreditCard).unwrap();
        assert_eq!(json, "\"credit_card\"");
    }

    #[test]
    fn kind_parses_from_display_label() {
        assert_eq!("credit-card".parse(), Ok(AccountKind::CreditCard));
        assert_eq!(
            AccountKind::LoanGiven.to_string().parse(),
            Ok(AccountKind::LoanGiven)
        );
        assert!("brokerage".parse::<AccountKind>().is_err());
    }
}
