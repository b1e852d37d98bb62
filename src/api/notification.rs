use serde::{Deserialize, Serialize};

pub use crate::desk::notification::{Id, Kind, Notification};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct UnreadCount {
    pub count: usize,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Cleared {
    pub removed: usize,
}
