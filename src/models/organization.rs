use serde::{Deserialize, Serialize};

use super::backup::Backup;
use super::department::Department;
use super::expense::Expense;
use super::item::Item;
use super::team::Team;
use super::user::User;
use crate::error::{LedgerError, LedgerResult};

/// The whole persisted state. Relationships are plain codes resolved on
/// demand; any of them may dangle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationData {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub departments: Vec<Department>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub backups: Vec<Backup>,
}

impl OrganizationData {
    pub fn team(&self, code: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.code == code)
    }

    pub fn team_mut(&mut self, code: &str) -> Option<&mut Team> {
        self.teams.iter_mut().find(|t| t.code == code)
    }

    pub fn department(&self, code: &str) -> Option<&Department> {
        self.departments.iter().find(|d| d.code == code)
    }

    pub fn department_mut(&mut self, code: &str) -> Option<&mut Department> {
        self.departments.iter_mut().find(|d| d.code == code)
    }

    pub fn item(&self, code: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.code == code)
    }

    pub fn item_mut(&mut self, code: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.code == code)
    }

    pub fn expense(&self, id: i64) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == id)
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn user_mut(&mut self, id: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    pub fn backup(&self, id: i64) -> Option<&Backup> {
        self.backups.iter().find(|b| b.id == id)
    }

    /// Team that owns an item, following item -> department -> team.
    pub fn team_of_item(&self, item: &Item) -> Option<&Team> {
        let dept = self.department(&item.dept_code)?;
        self.team(&dept.team_code)
    }

    pub fn insert_team(&mut self, team: Team) -> LedgerResult<()> {
        if self.team(&team.code).is_some() {
            return Err(LedgerError::DuplicateCode(team.code));
        }
        self.teams.push(team);
        Ok(())
    }

    pub fn insert_department(&mut self, department: Department) -> LedgerResult<()> {
        if self.department(&department.code).is_some() {
            return Err(LedgerError::DuplicateCode(department.code));
        }
        self.departments.push(department);
        Ok(())
    }

    pub fn insert_item(&mut self, item: Item) -> LedgerResult<()> {
        if self.item(&item.code).is_some() {
            return Err(LedgerError::DuplicateCode(item.code));
        }
        self.items.push(item);
        Ok(())
    }

    pub fn insert_user(&mut self, user: User) -> LedgerResult<()> {
        if self.user(&user.id).is_some() {
            return Err(LedgerError::DuplicateCode(user.id));
        }
        self.users.push(user);
        Ok(())
    }

    /// Largest expense or backup id present, used to prime id generation.
    pub fn max_record_id(&self) -> i64 {
        let expenses = self.expenses.iter().map(|e| e.id);
        let backups = self.backups.iter().map(|b| b.id);
        expenses.chain(backups).max().unwrap_or(0)
    }
}
