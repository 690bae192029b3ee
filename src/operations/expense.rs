use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::auth::Scope;
use crate::error::{LedgerError, LedgerResult};
use crate::models::expense::{Expense, LineItem, MAX_LINE_ITEMS};
use crate::models::organization::OrganizationData;
use crate::workspace::{IdGenerator, Workspace};

/// What the user filled into the expense form.
#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    pub team_code: String,
    pub dept_code: String,
    pub item_code: String,
    pub line_items: Vec<LineItem>,
}

impl ExpenseDraft {
    pub fn total(&self) -> Decimal {
        Expense::line_total(&self.line_items)
    }
}

/// Result of comparing a draft against its item's remaining balance.
#[derive(Debug, Clone, PartialEq)]
pub enum BudgetCheck {
    Within { balance: Decimal, total: Decimal },
    Overrun { balance: Decimal, total: Decimal },
    /// The item code resolves to nothing, so no balance applies.
    UnknownItem { total: Decimal },
}

/// Parses one `description, amount` line as typed on the prompt.
pub fn parse_line_item(raw: &str) -> Result<LineItem, String> {
    let (description, amount) = raw
        .rsplit_once(',')
        .ok_or_else(|| "Expected 'description, amount'".to_string())?;
    let description = description.trim();
    if description.is_empty() {
        return Err("Description cannot be empty".to_string());
    }
    let amount = Decimal::from_str(amount.trim()).map_err(|_| {
        format!(
            "Invalid amount format {}. Please provide a valid decimal number.",
            amount.trim()
        )
    })?;
    if amount <= Decimal::ZERO {
        return Err("Amount must be greater than zero".to_string());
    }
    Ok(LineItem::new(description, amount))
}

pub fn validate_draft(draft: &ExpenseDraft) -> LedgerResult<()> {
    if draft.team_code.trim().is_empty()
        || draft.dept_code.trim().is_empty()
        || draft.item_code.trim().is_empty()
    {
        return Err(LedgerError::Validation(
            "Team, department and item must all be selected".to_string(),
        ));
    }
    if draft.line_items.is_empty() {
        return Err(LedgerError::Validation(
            "At least one expense line is required".to_string(),
        ));
    }
    for line in &draft.line_items {
        if line.description.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Expense line description cannot be empty".to_string(),
            ));
        }
        if line.amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "Expense line '{}' must have an amount greater than zero",
                line.description
            )));
        }
    }
    Ok(())
}

pub fn check_balance(data: &OrganizationData, draft: &ExpenseDraft) -> BudgetCheck {
    let total = draft.total();
    match data.item(&draft.item_code) {
        Some(item) => {
            let balance = item.balance();
            if total > balance {
                BudgetCheck::Overrun { balance, total }
            } else {
                BudgetCheck::Within { balance, total }
            }
        }
        None => BudgetCheck::UnknownItem { total },
    }
}

/// Validates a draft and reports whether it would overrun, without writing.
pub fn preview_expense(data: &OrganizationData, draft: &ExpenseDraft) -> LedgerResult<BudgetCheck> {
    validate_draft(draft)?;
    Ok(check_balance(data, draft))
}

/// Appends an expense and charges its total to the item, if the item exists.
pub fn post_expense(
    data: &mut OrganizationData,
    ids: &mut IdGenerator,
    draft: &ExpenseDraft,
    created_by: &str,
    date: NaiveDate,
    confirm_overrun: bool,
) -> LedgerResult<Expense> {
    validate_draft(draft)?;
    if let BudgetCheck::Overrun { balance, total } = check_balance(data, draft) {
        if !confirm_overrun {
            return Err(LedgerError::OverrunNotConfirmed { balance, total });
        }
    }

    let total_amount = draft.total();
    let expense = Expense {
        id: ids.next_id(),
        date,
        team_code: draft.team_code.trim().to_string(),
        dept_code: draft.dept_code.trim().to_string(),
        item_code: draft.item_code.trim().to_string(),
        line_items: draft.line_items.clone(),
        total_amount,
        created_by: created_by.to_string(),
    };

    match data.item_mut(&expense.item_code) {
        Some(item) => item.spent += total_amount,
        None => tracing::warn!(
            item_code = %expense.item_code,
            "expense recorded against unknown item, no spent total updated"
        ),
    }
    data.expenses.push(expense.clone());
    Ok(expense)
}

/// Removes an expense and gives its total back to the item, if the item
/// still exists. `spent` is not clamped.
pub fn unpost_expense(data: &mut OrganizationData, id: i64) -> LedgerResult<Expense> {
    let pos = data
        .expenses
        .iter()
        .position(|e| e.id == id)
        .ok_or_else(|| LedgerError::NotFound(format!("Expense {}", id)))?;
    let expense = data.expenses.remove(pos);
    if let Some(item) = data.item_mut(&expense.item_code) {
        item.spent -= expense.total_amount;
    }
    Ok(expense)
}

pub fn record_expense(
    workspace: &mut Workspace,
    draft: &ExpenseDraft,
    created_by: &str,
    date: NaiveDate,
    confirm_overrun: bool,
) -> LedgerResult<Expense> {
    let expense = workspace.commit(|data, ids| {
        post_expense(data, ids, draft, created_by, date, confirm_overrun)
    })?;
    tracing::info!(
        id = expense.id,
        item_code = %expense.item_code,
        total = %expense.total_amount,
        "expense recorded"
    );
    Ok(expense)
}

pub fn delete_expense(workspace: &mut Workspace, id: i64) -> LedgerResult<Expense> {
    let expense = workspace.commit(|data, _| unpost_expense(data, id))?;
    tracing::info!(id, total = %expense.total_amount, "expense deleted");
    Ok(expense)
}

/// Expenses visible in `scope`, newest first.
pub fn expenses_in_scope<'a>(data: &'a OrganizationData, scope: &Scope) -> Vec<&'a Expense> {
    let mut expenses: Vec<&Expense> = data
        .expenses
        .iter()
        .filter(|e| scope.includes_team(&e.team_code))
        .collect();
    expenses.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    expenses
}

pub fn can_add_line(current: usize) -> bool {
    current < MAX_LINE_ITEMS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::test_workspace;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 4).unwrap()
    }

    fn draft(item_code: &str, amounts: &[(&str, i64)]) -> ExpenseDraft {
        ExpenseDraft {
            team_code: "T001".to_string(),
            dept_code: "D001".to_string(),
            item_code: item_code.to_string(),
            line_items: amounts
                .iter()
                .map(|(d, a)| LineItem::new(d, Decimal::from(*a)))
                .collect(),
        }
    }

    fn spent(workspace: &Workspace, code: &str) -> Decimal {
        workspace.data().item(code).unwrap().spent
    }

    #[test]
    fn test_parse_line_item_success() {
        let line = parse_line_item("Cable, set of 3, 12.50").unwrap();
        assert_eq!(line.description, "Cable, set of 3");
        assert_eq!(line.amount, Decimal::from_str("12.50").unwrap());
    }

    #[test]
    fn test_parse_line_item_rejects_bad_input() {
        assert!(parse_line_item("no amount here").is_err());
        assert!(parse_line_item(", 10").unwrap_err().contains("Description"));
        assert!(parse_line_item("Tape, abc").unwrap_err().contains("Invalid amount"));
        assert!(parse_line_item("Tape, 0").unwrap_err().contains("greater than zero"));
    }

    #[test]
    fn test_validate_draft_requires_codes_and_lines() {
        let mut d = draft("I001", &[("A", 10)]);
        d.team_code = " ".to_string();
        assert!(matches!(validate_draft(&d), Err(LedgerError::Validation(_))));

        let d = draft("I001", &[]);
        assert!(matches!(validate_draft(&d), Err(LedgerError::Validation(_))));

        let d = draft("I001", &[("A", -5)]);
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn test_overrun_scenario_then_delete_restores_spent() {
        let mut ws = test_workspace();
        let d = draft("I001", &[("장비A", 2000), ("장비B", 3500)]);

        let check = preview_expense(ws.data(), &d).unwrap();
        assert_eq!(
            check,
            BudgetCheck::Overrun {
                balance: Decimal::from(5000),
                total: Decimal::from(5500)
            }
        );

        let expense = record_expense(&mut ws, &d, "관리자", today(), true).unwrap();
        assert_eq!(expense.total_amount, Decimal::from(5500));
        assert_eq!(spent(&ws, "I001"), Decimal::from(5500));
        assert_eq!(ws.data().expenses.len(), 1);

        delete_expense(&mut ws, expense.id).unwrap();
        assert_eq!(spent(&ws, "I001"), Decimal::ZERO);
        assert!(ws.data().expenses.is_empty());
    }

    #[test]
    fn test_unconfirmed_overrun_writes_nothing() {
        let mut ws = test_workspace();
        let before = ws.data().clone();
        let d = draft("I002", &[("Paper", 1500)]);

        let result = record_expense(&mut ws, &d, "관리자", today(), false);
        assert!(matches!(result, Err(LedgerError::OverrunNotConfirmed { .. })));
        assert_eq!(ws.data(), &before);
    }

    #[test]
    fn test_within_budget_needs_no_confirmation() {
        let mut ws = test_workspace();
        let d = draft("I002", &[("Paper", 300), ("Ink", 200)]);

        record_expense(&mut ws, &d, "예배팀", today(), false).unwrap();
        assert_eq!(spent(&ws, "I002"), Decimal::from(500));
    }

    #[test]
    fn test_unknown_item_records_without_touching_spent() {
        let mut ws = test_workspace();
        let before_items = ws.data().items.clone();
        let d = draft("I999", &[("Mystery", 40)]);

        assert_eq!(
            preview_expense(ws.data(), &d).unwrap(),
            BudgetCheck::UnknownItem {
                total: Decimal::from(40)
            }
        );
        let expense = record_expense(&mut ws, &d, "관리자", today(), false).unwrap();
        assert_eq!(ws.data().expenses.len(), 1);
        assert_eq!(ws.data().items, before_items);

        delete_expense(&mut ws, expense.id).unwrap();
        assert_eq!(ws.data().items, before_items);
    }

    #[test]
    fn test_spent_tracks_ledger_over_mixed_sequence() {
        let mut ws = test_workspace();
        let mut ids = Vec::new();
        for amount in [100, 250, 75, 4000, 1] {
            let e = record_expense(&mut ws, &draft("I001", &[("x", amount)]), "a", today(), true)
                .unwrap();
            ids.push(e.id);
        }
        delete_expense(&mut ws, ids[1]).unwrap();
        delete_expense(&mut ws, ids[3]).unwrap();

        let ledger_sum = ws
            .data()
            .expenses
            .iter()
            .filter(|e| e.item_code == "I001")
            .fold(Decimal::ZERO, |acc, e| acc + e.total_amount);
        assert_eq!(spent(&ws, "I001"), ledger_sum);
        assert_eq!(ledger_sum, Decimal::from(176));
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut ws = test_workspace();
        let first = record_expense(&mut ws, &draft("I001", &[("a", 1)]), "a", today(), false)
            .unwrap();
        let second = record_expense(&mut ws, &draft("I001", &[("b", 1)]), "a", today(), false)
            .unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_delete_unknown_expense_is_not_found() {
        let mut ws = test_workspace();
        let before = ws.data().clone();
        let result = delete_expense(&mut ws, 42);
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
        assert_eq!(ws.data(), &before);
    }

    #[test]
    fn test_delete_can_drive_spent_negative() {
        let mut ws = test_workspace();
        let e = record_expense(&mut ws, &draft("I003", &[("Lens", 800)]), "a", today(), false)
            .unwrap();
        ws.commit(|data, _| {
            data.item_mut("I003").unwrap().spent = Decimal::from(100);
            Ok(())
        })
        .unwrap();

        delete_expense(&mut ws, e.id).unwrap();
        assert_eq!(spent(&ws, "I003"), Decimal::from(-700));
    }

    #[test]
    fn test_expenses_in_scope_filters_by_team() {
        let mut ws = test_workspace();
        record_expense(&mut ws, &draft("I001", &[("a", 1)]), "a", today(), false).unwrap();
        let mut other = draft("I003", &[("b", 1)]);
        other.team_code = "T002".to_string();
        record_expense(&mut ws, &other, "a", today(), false).unwrap();

        assert_eq!(expenses_in_scope(ws.data(), &Scope::All).len(), 2);
        let team = expenses_in_scope(ws.data(), &Scope::Team("T002".to_string()));
        assert_eq!(team.len(), 1);
        assert_eq!(team[0].item_code, "I003");
    }

    #[test]
    fn test_can_add_line_caps_at_five() {
        assert!(can_add_line(4));
        assert!(!can_add_line(5));
    }
}
