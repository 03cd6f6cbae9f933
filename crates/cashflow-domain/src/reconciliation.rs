use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::Owned;

/// Comparison of the computed balance with a statement balance on a checkpoint date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reconciliation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub date: NaiveDate,
    pub expected_balance: Decimal,
    pub actual_balance: Decimal,
    /// `actual_balance - expected_balance`.
    pub difference: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjustment_rule_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Reconciliation {
    pub fn is_balanced(&self) -> bool {
        self.difference.is_zero()
    }
}

impl Owned for Reconciliation {
    fn user_id(&self) -> Uuid {
        self.user_id
    }
}
