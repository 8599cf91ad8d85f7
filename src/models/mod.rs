pub mod integration;
pub mod user;
pub mod webhook_log;
