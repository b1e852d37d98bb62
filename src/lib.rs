pub mod api;
pub mod chat;
pub mod config;
pub mod desk;
pub mod server;

pub use self::{config::Config, desk::Desk};
