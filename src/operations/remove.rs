//! Structural deletes and what they take with them.
//!
//! - item: its expenses (matched by `itemCode`), then the item.
//! - department: its items, the expenses whose `deptCode` matches, then the
//!   department. Expenses pointing at one of the removed items under a
//!   different `deptCode` survive with a dangling `itemCode`.
//! - team: items of its departments, its departments, expenses whose
//!   `teamCode` matches, its users (never an admin), then the team.
use std::collections::HashSet;

use crate::error::{LedgerError, LedgerResult};
use crate::models::organization::OrganizationData;
use crate::workspace::Workspace;

/// Row counts removed by one structural delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub departments: usize,
    pub items: usize,
    pub expenses: usize,
    pub users: usize,
}

fn retain_counted<T>(rows: &mut Vec<T>, keep: impl FnMut(&T) -> bool) -> usize {
    let before = rows.len();
    rows.retain(keep);
    before - rows.len()
}

pub fn cascade_item(data: &mut OrganizationData, code: &str) -> LedgerResult<CascadeSummary> {
    if data.item(code).is_none() {
        return Err(LedgerError::NotFound(format!("Item {}", code)));
    }
    let expenses = retain_counted(&mut data.expenses, |e| e.item_code != code);
    let items = retain_counted(&mut data.items, |i| i.code != code);
    Ok(CascadeSummary {
        items,
        expenses,
        ..Default::default()
    })
}

pub fn cascade_department(
    data: &mut OrganizationData,
    code: &str,
) -> LedgerResult<CascadeSummary> {
    if data.department(code).is_none() {
        return Err(LedgerError::NotFound(format!("Department {}", code)));
    }
    let items = retain_counted(&mut data.items, |i| i.dept_code != code);
    let expenses = retain_counted(&mut data.expenses, |e| e.dept_code != code);
    let departments = retain_counted(&mut data.departments, |d| d.code != code);
    Ok(CascadeSummary {
        departments,
        items,
        expenses,
        users: 0,
    })
}

pub fn cascade_team(data: &mut OrganizationData, code: &str) -> LedgerResult<CascadeSummary> {
    if data.team(code).is_none() {
        return Err(LedgerError::NotFound(format!("Team {}", code)));
    }
    let dept_codes: HashSet<String> = data
        .departments
        .iter()
        .filter(|d| d.team_code == code)
        .map(|d| d.code.clone())
        .collect();

    let items = retain_counted(&mut data.items, |i| !dept_codes.contains(&i.dept_code));
    let departments = retain_counted(&mut data.departments, |d| d.team_code != code);
    let expenses = retain_counted(&mut data.expenses, |e| e.team_code != code);
    let users = retain_counted(&mut data.users, |u| u.is_admin || !u.belongs_to(code));
    data.teams.retain(|t| t.code != code);

    Ok(CascadeSummary {
        departments,
        items,
        expenses,
        users,
    })
}

pub fn delete_item(workspace: &mut Workspace, code: &str) -> LedgerResult<CascadeSummary> {
    let summary = workspace.commit(|data, _| cascade_item(data, code))?;
    tracing::info!(code, expenses = summary.expenses, "item deleted");
    Ok(summary)
}

pub fn delete_department(workspace: &mut Workspace, code: &str) -> LedgerResult<CascadeSummary> {
    let summary = workspace.commit(|data, _| cascade_department(data, code))?;
    tracing::info!(
        code,
        items = summary.items,
        expenses = summary.expenses,
        "department deleted"
    );
    Ok(summary)
}

pub fn delete_team(workspace: &mut Workspace, code: &str) -> LedgerResult<CascadeSummary> {
    let summary = workspace.commit(|data, _| cascade_team(data, code))?;
    tracing::info!(
        code,
        departments = summary.departments,
        items = summary.items,
        expenses = summary.expenses,
        users = summary.users,
        "team deleted"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::department::Department;
    use crate::models::expense::{Expense, LineItem};
    use crate::models::item::Item;
    use crate::models::team::Team;
    use crate::models::user::User;
    use crate::workspace::test_workspace;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn expense(id: i64, team: &str, dept: &str, item: &str) -> Expense {
        Expense {
            id,
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            team_code: team.to_string(),
            dept_code: dept.to_string(),
            item_code: item.to_string(),
            line_items: vec![LineItem::new("x", Decimal::from(10))],
            total_amount: Decimal::from(10),
            created_by: "tester".to_string(),
        }
    }

    fn populated() -> Workspace {
        let mut ws = test_workspace();
        ws.commit(|data, _| {
            data.insert_item(Item::new("I004", "Books", "D003", Decimal::from(700)))?;
            data.expenses.push(expense(1, "T001", "D001", "I001"));
            data.expenses.push(expense(2, "T001", "D001", "I002"));
            data.expenses.push(expense(3, "T001", "D002", "I003"));
            data.expenses.push(expense(4, "T002", "D003", "I004"));
            // inconsistent row: item of D001 filed under D002
            data.expenses.push(expense(5, "T001", "D002", "I001"));
            Ok(())
        })
        .unwrap();
        ws
    }

    #[test]
    fn test_delete_item_removes_its_expenses() {
        let mut ws = populated();
        let summary = delete_item(&mut ws, "I001").unwrap();

        assert_eq!(summary.items, 1);
        assert_eq!(summary.expenses, 2);
        assert!(ws.data().item("I001").is_none());
        assert!(ws.data().expenses.iter().all(|e| e.item_code != "I001"));
        assert_eq!(ws.data().expenses.len(), 3);
    }

    #[test]
    fn test_delete_department_matches_expenses_by_dept_code_only() {
        let mut ws = populated();
        let summary = delete_department(&mut ws, "D001").unwrap();

        assert_eq!(summary.items, 2);
        assert_eq!(summary.expenses, 2);
        assert!(ws.data().department("D001").is_none());
        assert!(ws.data().item("I001").is_none());
        assert!(ws.data().item("I002").is_none());

        // the D002-filed expense against I001 survives and now dangles
        let survivor = ws.data().expense(5).unwrap();
        assert_eq!(survivor.item_code, "I001");
        assert_eq!(survivor.dept_code, "D002");
        assert!(ws.data().item(&survivor.item_code).is_none());
    }

    #[test]
    fn test_delete_team_cascades_and_spares_others() {
        let mut ws = populated();
        let before = ws.data().clone();

        let summary = delete_team(&mut ws, "T001").unwrap();
        assert_eq!(
            summary,
            CascadeSummary {
                departments: 2,
                items: 3,
                expenses: 4,
                users: 1,
            }
        );

        let data = ws.data();
        assert!(data.team("T001").is_none());
        assert!(data.departments.iter().all(|d| d.team_code != "T001"));
        assert!(data.expenses.iter().all(|e| e.team_code != "T001"));
        assert!(data.user("T001").is_none());
        assert!(data.user("admin").is_some());

        // T002 and T003 rows unchanged
        assert_eq!(data.team("T002"), before.team("T002"));
        assert_eq!(data.team("T003"), before.team("T003"));
        assert_eq!(data.department("D003"), before.department("D003"));
        assert_eq!(data.item("I004"), before.item("I004"));
        assert_eq!(data.expense(4), before.expense(4));
        assert_eq!(data.user("T002"), before.user("T002"));
    }

    #[test]
    fn test_delete_team_never_removes_admin() {
        let mut ws = test_workspace();
        ws.commit(|data, _| {
            let mut admin = User::admin("boss", "pw", "Boss");
            admin.team_code = Some("T003".to_string());
            data.insert_user(admin)
        })
        .unwrap();

        delete_team(&mut ws, "T003").unwrap();
        assert!(ws.data().user("boss").is_some());
        assert!(ws.data().user("admin").is_some());
        assert!(ws.data().user("T003").is_none());
    }

    #[test]
    fn test_delete_team_without_departments_removes_only_team() {
        let mut ws = test_workspace();
        ws.commit(|data, _| {
            data.insert_team(Team::new("T009", "Empty", "Nobody"))?;
            data.insert_department(Department::new("D009", "Lonely", "T404", "Ghost"))?;
            Ok(())
        })
        .unwrap();

        let summary = delete_team(&mut ws, "T009").unwrap();
        assert_eq!(summary, CascadeSummary::default());
        assert!(ws.data().department("D009").is_some());
    }

    #[test]
    fn test_delete_unknown_codes_are_not_found() {
        let mut ws = populated();
        let before = ws.data().clone();

        assert!(matches!(delete_item(&mut ws, "I404"), Err(LedgerError::NotFound(_))));
        assert!(matches!(
            delete_department(&mut ws, "D404"),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(delete_team(&mut ws, "T404"), Err(LedgerError::NotFound(_))));
        assert_eq!(ws.data(), &before);
    }
}
