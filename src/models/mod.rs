//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean
//! al schema PostgreSQL y las reglas puras de dominio asociadas.

pub mod catalog_service;
pub mod client;
pub mod ledger;
pub mod part;
pub mod user;
pub mod vehicle;
pub mod work_order;
