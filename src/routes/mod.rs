pub mod health;
pub mod ingest;
pub mod integration;
pub mod logs;
