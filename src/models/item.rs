use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A budget line. `spent` is kept in step with the expense ledger
/// incrementally and is never recomputed from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub code: String,
    pub name: String,
    pub dept_code: String,
    pub budget: Decimal,
    #[serde(default)]
    pub spent: Decimal,
}

impl Item {
    pub fn new(code: &str, name: &str, dept_code: &str, budget: Decimal) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            dept_code: dept_code.to_string(),
            budget,
            spent: Decimal::ZERO,
        }
    }

    pub fn balance(&self) -> Decimal {
        self.budget - self.spent
    }
}
