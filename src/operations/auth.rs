use crate::models::organization::OrganizationData;
use crate::models::user::User;

/// Which part of the hierarchy a signed-in user may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Team(String),
}

impl Scope {
    pub fn for_user(user: &User) -> Self {
        match (&user.team_code, user.is_admin) {
            (_, true) => Scope::All,
            (Some(team_code), false) => Scope::Team(team_code.clone()),
            // A non-admin without a team sees a team that cannot exist.
            (None, false) => Scope::Team(String::new()),
        }
    }

    pub fn includes_team(&self, team_code: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::Team(code) => code == team_code,
        }
    }
}

/// Plain equality lookup against the user table.
pub fn authenticate<'a>(data: &'a OrganizationData, id: &str, password: &str) -> Option<&'a User> {
    data.users
        .iter()
        .find(|u| u.id == id.trim() && u.password == password)
}
