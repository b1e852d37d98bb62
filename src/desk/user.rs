use derive_more::{Display, From};
use enum_utils::FromStr;
use serde::{Deserialize, Serialize};

/// Identity of a person, or of the system itself, acting on the desk.
#[derive(
    Clone,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// Author of log entries the desk writes on its own behalf.
    pub fn system() -> Self {
        Self("SYSTEM".to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, FromStr, Hash, PartialEq, Serialize,
)]
#[enumeration(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Raises tickets.
    User,

    /// Works on the tickets assigned to them.
    Engineer,

    /// Triages, assigns and reassigns tickets.
    Admin,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub role: Role,
}

impl User {
    pub fn new(id: impl Into<Id>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }
}
