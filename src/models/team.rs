use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub code: String,
    pub name: String,
    pub leader: String,
}

impl Team {
    pub fn new(code: &str, name: &str, leader: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            leader: leader.to_string(),
        }
    }
}
