use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::InstanceStatus;

/// One materialized occurrence of a rule after its exception (if any) was applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionInstance {
    pub date: NaiveDate,
    pub rule_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_id: Option<Uuid>,
    pub name: String,
    pub amount: Decimal,
    pub currency: String,
    pub account_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_account_id: Option<Uuid>,
    pub category_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub is_exception: bool,
    pub is_recurring: bool,
    pub is_deleted: bool,
    pub status: InstanceStatus,
}

impl TransactionInstance {
    pub fn is_transfer(&self) -> bool {
        self.to_account_id.is_some()
    }
}
