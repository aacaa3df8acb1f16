//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle. Mapea al schema PostgreSQL con
//! primary key 'id'; la placa se guarda normalizada (sin separadores, en
//! mayúsculas).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Vehicle principal - mapea a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub client_id: Uuid,
    pub brand: String,
    pub model: String,
    pub year: Option<i32>,
    pub plate: Option<String>,
    pub vin: Option<String>,
    pub color: Option<String>,
    pub mileage: Option<i32>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
