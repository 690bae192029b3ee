use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Doubles as the login name.
    pub id: String,
    pub password: String,
    pub is_admin: bool,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_code: Option<String>,
}

impl User {
    pub fn admin(id: &str, password: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            password: password.to_string(),
            is_admin: true,
            name: name.to_string(),
            team_code: None,
        }
    }

    pub fn team_member(id: &str, password: &str, name: &str, team_code: &str) -> Self {
        Self {
            id: id.to_string(),
            password: password.to_string(),
            is_admin: false,
            name: name.to_string(),
            team_code: Some(team_code.to_string()),
        }
    }

    pub fn belongs_to(&self, team_code: &str) -> bool {
        self.team_code.as_deref() == Some(team_code)
    }
}
