pub mod integration_dto;
