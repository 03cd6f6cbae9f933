//! Transaction categories. Their kind decides the sign of a rule's amount.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::DomainError;

/// Name of the system category that holds reconciliation adjustments.
pub const ADJUSTMENT_CATEGORY_NAME: &str = "Reconciliation Adjustment";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    /// `None` for system categories shared by every user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub name: String,
    pub kind: CategoryKind,
    #[serde(default)]
    pub is_system: bool,
}

impl Category {
    pub fn new(user_id: Uuid, name: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: Some(user_id),
            name: name.into(),
            kind,
            is_system: false,
        }
    }

    pub fn system(name: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            name: name.into(),
            kind,
            is_system: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
    Transfer,
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CategoryKind::Income => "income",
            CategoryKind::Expense => "expense",
            CategoryKind::Transfer => "transfer",
        };
        f.write_str(label)
    }
}

impl FromStr for CategoryKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(CategoryKind::Income),
            "expense" => Ok(CategoryKind::Expense),
            "transfer" => Ok(CategoryKind::Transfer),
            _ => Err(DomainError::UnknownKind {
                kind: "category kind",
                value: value.to_string(),
            }),
        }
    }
}
