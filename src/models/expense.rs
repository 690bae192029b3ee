use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MAX_LINE_ITEMS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub amount: Decimal,
}

impl LineItem {
    pub fn new(description: &str, amount: Decimal) -> Self {
        Self {
            description: description.to_string(),
            amount,
        }
    }
}

/// One ledger entry charged against a single item. The three codes are
/// stored as given and are not checked against each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: i64,
    pub date: NaiveDate,
    pub team_code: String,
    pub dept_code: String,
    pub item_code: String,
    #[serde(rename = "items", default)]
    pub line_items: Vec<LineItem>,
    pub total_amount: Decimal,
    pub created_by: String,
}

impl Expense {
    pub fn line_total(line_items: &[LineItem]) -> Decimal {
        line_items
            .iter()
            .fold(Decimal::ZERO, |acc, line| acc + line.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_line_total_sums_amounts() {
        let lines = vec![
            LineItem::new("장비A", Decimal::from(2000)),
            LineItem::new("장비B", Decimal::from_str("3500.25").unwrap()),
        ];
        assert_eq!(
            Expense::line_total(&lines),
            Decimal::from_str("5500.25").unwrap()
        );
    }

    #[test]
    fn test_expense_json_field_names() {
        let expense = Expense {
            id: 7,
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            team_code: "T001".to_string(),
            dept_code: "D001".to_string(),
            item_code: "I001".to_string(),
            line_items: vec![LineItem::new("cable", Decimal::from(10))],
            total_amount: Decimal::from(10),
            created_by: "관리자".to_string(),
        };

        let json = serde_json::to_value(&expense).unwrap();
        assert_eq!(json["teamCode"], "T001");
        assert_eq!(json["itemCode"], "I001");
        assert_eq!(json["date"], "2025-03-01");
        assert_eq!(json["items"][0]["description"], "cable");
        assert_eq!(json["createdBy"], "관리자");
        assert!(json.get("lineItems").is_none());
    }
}
