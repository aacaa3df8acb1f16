//! Backend de gestión para oficinas mecánicas
//!
//! Órdenes de servicio con su ciclo de vida, libro financiero y datos
//! maestros (clientes, vehículos, piezas y servicios).

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod utils;
