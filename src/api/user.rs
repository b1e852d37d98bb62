pub use crate::desk::user::{Id, Role, User};
