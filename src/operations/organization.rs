use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{LedgerError, LedgerResult};
use crate::models::department::Department;
use crate::models::item::Item;
use crate::models::team::Team;
use crate::models::user::User;
use crate::workspace::Workspace;

fn required<'a>(value: &'a str, label: &str) -> LedgerResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Validation(format!("{} cannot be empty", label)));
    }
    Ok(trimmed)
}

pub fn parse_budget(raw: &str) -> LedgerResult<Decimal> {
    let budget = Decimal::from_str(raw.trim()).map_err(|_| {
        LedgerError::Validation(format!(
            "Invalid budget amount '{}'. Must be a valid number",
            raw.trim()
        ))
    })?;
    if budget <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "Budget must be greater than zero".to_string(),
        ));
    }
    Ok(budget)
}

/// Creates a team together with its login user (`id` = team code).
pub fn add_team(
    workspace: &mut Workspace,
    code: &str,
    name: &str,
    leader: &str,
    default_password: &str,
) -> LedgerResult<Team> {
    let code = required(code, "Team code")?;
    let name = required(name, "Team name")?;
    let leader = required(leader, "Team leader")?;

    let team = Team::new(code, name, leader);
    let created = team.clone();
    workspace.commit(|data, _| {
        data.insert_team(team)?;
        data.insert_user(User::team_member(code, default_password, name, code))
    })?;
    tracing::info!(code, "team added");
    Ok(created)
}

pub fn add_department(
    workspace: &mut Workspace,
    team_code: &str,
    code: &str,
    name: &str,
    leader: &str,
) -> LedgerResult<Department> {
    let team_code = required(team_code, "Team")?;
    let code = required(code, "Department code")?;
    let name = required(name, "Department name")?;
    let leader = required(leader, "Department leader")?;

    let department = Department::new(code, name, team_code, leader);
    let created = department.clone();
    workspace.commit(|data, _| data.insert_department(department))?;
    tracing::info!(code, team_code, "department added");
    Ok(created)
}

pub fn add_item(
    workspace: &mut Workspace,
    dept_code: &str,
    code: &str,
    name: &str,
    budget: &str,
) -> LedgerResult<Item> {
    let dept_code = required(dept_code, "Department")?;
    let code = required(code, "Item code")?;
    let name = required(name, "Item name")?;
    let budget = parse_budget(budget)?;

    let item = Item::new(code, name, dept_code, budget);
    let created = item.clone();
    workspace.commit(|data, _| data.insert_item(item))?;
    tracing::info!(code, dept_code, %budget, "item added");
    Ok(created)
}

/// Renames a team; the team's user follows the new name.
pub fn edit_team(workspace: &mut Workspace, code: &str, name: &str, leader: &str) -> LedgerResult<()> {
    let name = required(name, "Team name")?;
    let leader = required(leader, "Team leader")?;
    workspace.commit(|data, _| {
        let team = data
            .team_mut(code)
            .ok_or_else(|| LedgerError::NotFound(format!("Team {}", code)))?;
        team.name = name.to_string();
        team.leader = leader.to_string();
        if let Some(user) = data.users.iter_mut().find(|u| u.belongs_to(code)) {
            user.name = name.to_string();
        }
        Ok(())
    })?;
    tracing::info!(code, "team updated");
    Ok(())
}

pub fn edit_department(
    workspace: &mut Workspace,
    code: &str,
    team_code: &str,
    name: &str,
    leader: &str,
) -> LedgerResult<()> {
    let team_code = required(team_code, "Team")?;
    let name = required(name, "Department name")?;
    let leader = required(leader, "Department leader")?;
    workspace.commit(|data, _| {
        let dept = data
            .department_mut(code)
            .ok_or_else(|| LedgerError::NotFound(format!("Department {}", code)))?;
        dept.team_code = team_code.to_string();
        dept.name = name.to_string();
        dept.leader = leader.to_string();
        Ok(())
    })?;
    tracing::info!(code, team_code, "department updated");
    Ok(())
}

/// Updates an item's placement, name and budget. `spent` is left alone.
pub fn edit_item(
    workspace: &mut Workspace,
    code: &str,
    dept_code: &str,
    name: &str,
    budget: &str,
) -> LedgerResult<()> {
    let dept_code = required(dept_code, "Department")?;
    let name = required(name, "Item name")?;
    let budget = parse_budget(budget)?;
    workspace.commit(|data, _| {
        let item = data
            .item_mut(code)
            .ok_or_else(|| LedgerError::NotFound(format!("Item {}", code)))?;
        item.dept_code = dept_code.to_string();
        item.name = name.to_string();
        item.budget = budget;
        Ok(())
    })?;
    tracing::info!(code, %budget, "item updated");
    Ok(())
}

pub fn change_password(workspace: &mut Workspace, user_id: &str, new_password: &str) -> LedgerResult<()> {
    if new_password.is_empty() {
        return Err(LedgerError::Validation(
            "New password cannot be empty".to_string(),
        ));
    }
    workspace.commit(|data, _| {
        let user = data
            .user_mut(user_id)
            .ok_or_else(|| LedgerError::NotFound(format!("User {}", user_id)))?;
        user.password = new_password.to_string();
        Ok(())
    })?;
    tracing::info!(user_id, "password changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::test_workspace;

    #[test]
    fn test_add_team_creates_team_user() {
        let mut ws = test_workspace();
        add_team(&mut ws, " T010 ", "Media", "Jung", "team123").unwrap();

        let team = ws.data().team("T010").unwrap();
        assert_eq!(team.name, "Media");
        let user = ws.data().user("T010").unwrap();
        assert!(!user.is_admin);
        assert_eq!(user.name, "Media");
        assert_eq!(user.password, "team123");
        assert!(user.belongs_to("T010"));
    }

    #[test]
    fn test_add_team_duplicate_code_rejected() {
        let mut ws = test_workspace();
        let before = ws.data().clone();
        let result = add_team(&mut ws, "T001", "Again", "Someone", "team123");
        assert!(matches!(result, Err(LedgerError::DuplicateCode(_))));
        assert_eq!(ws.data(), &before);
    }

    #[test]
    fn test_add_team_clashing_user_id_writes_nothing() {
        let mut ws = test_workspace();
        let before = ws.data().clone();
        let result = add_team(&mut ws, "admin", "Admins", "Root", "team123");
        assert!(result.is_err());
        assert_eq!(ws.data(), &before);
    }

    #[test]
    fn test_add_team_requires_all_fields() {
        let mut ws = test_workspace();
        let result = add_team(&mut ws, "T011", "", "Leader", "team123");
        match result {
            Err(LedgerError::Validation(msg)) => assert_eq!(msg, "Team name cannot be empty"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_add_department_allows_unknown_team() {
        let mut ws = test_workspace();
        add_department(&mut ws, "T404", "D010", "Floating", "Yoon").unwrap();
        assert_eq!(ws.data().department("D010").unwrap().team_code, "T404");
    }

    #[test]
    fn test_add_item_budget_validation() {
        let mut ws = test_workspace();
        assert!(add_item(&mut ws, "D001", "I010", "Mics", "abc").is_err());
        assert!(add_item(&mut ws, "D001", "I010", "Mics", "0").is_err());
        assert!(add_item(&mut ws, "D001", "I010", "Mics", "-3").is_err());

        let item = add_item(&mut ws, "D001", "I010", "Mics", "1250.50").unwrap();
        assert_eq!(item.budget, Decimal::from_str("1250.50").unwrap());
        assert_eq!(item.spent, Decimal::ZERO);
    }

    #[test]
    fn test_add_item_duplicate_rejected() {
        let mut ws = test_workspace();
        let result = add_item(&mut ws, "D002", "I001", "Dup", "10");
        assert!(matches!(result, Err(LedgerError::DuplicateCode(code)) if code == "I001"));
    }

    #[test]
    fn test_edit_team_renames_user() {
        let mut ws = test_workspace();
        edit_team(&mut ws, "T001", "Praise", "Kang").unwrap();
        assert_eq!(ws.data().team("T001").unwrap().leader, "Kang");
        assert_eq!(ws.data().user("T001").unwrap().name, "Praise");
    }

    #[test]
    fn test_edit_item_keeps_spent() {
        let mut ws = test_workspace();
        ws.commit(|data, _| {
            data.item_mut("I001").unwrap().spent = Decimal::from(123);
            Ok(())
        })
        .unwrap();

        edit_item(&mut ws, "I001", "D002", "Gear", "6000").unwrap();
        let item = ws.data().item("I001").unwrap();
        assert_eq!(item.dept_code, "D002");
        assert_eq!(item.budget, Decimal::from(6000));
        assert_eq!(item.spent, Decimal::from(123));
    }

    #[test]
    fn test_edit_department_moves_team() {
        let mut ws = test_workspace();
        edit_department(&mut ws, "D003", "T003", "Sunday School", "Park").unwrap();
        assert_eq!(ws.data().department("D003").unwrap().team_code, "T003");
    }

    #[test]
    fn test_edit_unknown_is_not_found() {
        let mut ws = test_workspace();
        assert!(matches!(
            edit_team(&mut ws, "T404", "x", "y"),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            edit_item(&mut ws, "I404", "D001", "x", "1"),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_change_password() {
        let mut ws = test_workspace();
        change_password(&mut ws, "T002", "newpass").unwrap();
        assert_eq!(ws.data().user("T002").unwrap().password, "newpass");

        assert!(change_password(&mut ws, "T002", "").is_err());
        assert!(matches!(
            change_password(&mut ws, "nobody", "x"),
            Err(LedgerError::NotFound(_))
        ));
    }
}
