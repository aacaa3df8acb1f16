//! Controllers
//!
//! Reglas de negocio por recurso. Se construyen por request a partir del
//! `AppState` y solo dependen de los traits de repositorio.

pub mod catalog_service_controller;
pub mod client_controller;
pub mod ledger_controller;
pub mod part_controller;
pub mod vehicle_controller;
pub mod work_order_controller;
