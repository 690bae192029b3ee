use rust_decimal::Decimal;

use crate::models::department::Department;
use crate::models::item::Item;
use crate::models::organization::OrganizationData;
use crate::models::team::Team;
use crate::models::user::User;

pub const ADMIN_ID: &str = "admin";
const ADMIN_PASSWORD: &str = "admin123";
const TEAM_PASSWORD: &str = "team123";

pub fn seed_teams() -> Vec<Team> {
    vec![
        Team::new("T001", "예배팀", "김목사"),
        Team::new("T002", "교육팀", "이전도사"),
        Team::new("T003", "선교팀", "박장로"),
    ]
}

pub fn seed_departments() -> Vec<Department> {
    vec![
        Department::new("D001", "음향부서", "T001", "김음향"),
        Department::new("D002", "영상부서", "T001", "이영상"),
        Department::new("D003", "주일학교", "T002", "박교사"),
    ]
}

pub fn seed_items() -> Vec<Item> {
    vec![
        Item::new("I001", "장비구입", "D001", Decimal::from(5000)),
        Item::new("I002", "소모품", "D001", Decimal::from(1000)),
        Item::new("I003", "카메라", "D002", Decimal::from(3000)),
    ]
}

pub fn seed_users() -> Vec<User> {
    let mut users = vec![User::admin(ADMIN_ID, ADMIN_PASSWORD, "관리자")];
    users.extend(
        seed_teams()
            .iter()
            .map(|team| User::team_member(&team.code, TEAM_PASSWORD, &team.name, &team.code)),
    );
    users
}

/// Built-in sample organization used when nothing valid is persisted.
pub fn seed_data() -> OrganizationData {
    OrganizationData {
        teams: seed_teams(),
        departments: seed_departments(),
        items: seed_items(),
        expenses: Vec::new(),
        users: seed_users(),
        backups: Vec::new(),
    }
}

/// Installs the sample hierarchy into a store that has no teams, keeping
/// whatever else it carries.
pub fn install_seed_hierarchy(data: &mut OrganizationData) {
    data.teams = seed_teams();
    data.departments = seed_departments();
    data.items = seed_items();
    if data.users.is_empty() {
        data.users = seed_users();
    }
}
