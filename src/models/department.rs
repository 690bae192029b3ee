use serde::{Deserialize, Serialize};

/// A department hangs off a team through `team_code`. The team is not
/// guaranteed to exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub code: String,
    pub name: String,
    pub team_code: String,
    pub leader: String,
}

impl Department {
    pub fn new(code: &str, name: &str, team_code: &str, leader: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            team_code: team_code.to_string(),
            leader: leader.to_string(),
        }
    }
}
