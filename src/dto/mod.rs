//! DTOs de la API
//!
//! Requests validados con `validator`, queries de listado y filtros
//! compartidos por las implementaciones de repositorio.

pub mod catalog_service_dto;
pub mod client_dto;
pub mod common_dto;
pub mod ledger_dto;
pub mod part_dto;
pub mod vehicle_dto;
pub mod work_order_dto;
