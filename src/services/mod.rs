pub mod connectivity_service;
pub mod integration_service;
pub mod webhook_service;
