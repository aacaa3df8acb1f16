//! Modelo de Part (peças) y movimientos de stock

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::utils::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Part {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub cost: Option<Decimal>,
    pub stock: i32,
    pub min_stock: i32,
    pub max_stock: Option<i32>,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Part {
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    pub fn stock_deficit(&self) -> i32 {
        self.min_stock - self.stock
    }
}

/// Tipo de movimiento - mapea al ENUM stock_movement_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "stock_movement_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StockMovementType {
    In,
    Out,
    Adjustment,
}

impl StockMovementType {
    /// Nuevo stock tras aplicar el movimiento. `adjustment` fija el valor absoluto.
    pub fn apply(self, current: i32, quantity: i32) -> Result<i32, AppError> {
        match self {
            StockMovementType::In => {
                if quantity <= 0 {
                    return Err(AppError::InvalidInput("quantity must be positive".to_string()));
                }
                current
                    .checked_add(quantity)
                    .ok_or_else(|| AppError::InvalidInput("stock overflow".to_string()))
            }
            StockMovementType::Out => {
                if quantity <= 0 {
                    return Err(AppError::InvalidInput("quantity must be positive".to_string()));
                }
                let next = current - quantity;
                if next < 0 {
                    return Err(AppError::InsufficientStock(format!(
                        "requested {} but only {} in stock",
                        quantity, current
                    )));
                }
                Ok(next)
            }
            StockMovementType::Adjustment => {
                if quantity < 0 {
                    return Err(AppError::InsufficientStock(
                        "stock cannot be adjusted below zero".to_string(),
                    ));
                }
                Ok(quantity)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StockMovement {
    pub id: Uuid,
    pub part_id: Uuid,
    pub movement_type: StockMovementType,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub reason: Option<String>,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    pub fn new(
        part_id: Uuid,
        movement_type: StockMovementType,
        quantity: i32,
        unit_price: Option<Decimal>,
        reason: Option<String>,
        reference: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            part_id,
            movement_type,
            quantity,
            unit_price,
            total_price: unit_price.map(|p| p * Decimal::from(quantity)),
            reason,
            reference,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_stock_in_and_out() {
        assert_eq!(StockMovementType::In.apply(5, 3).unwrap(), 8);
        assert_eq!(StockMovementType::Out.apply(5, 5).unwrap(), 0);
        assert!(matches!(
            StockMovementType::Out.apply(5, 6),
            Err(AppError::InsufficientStock(_))
        ));
        assert!(matches!(
            StockMovementType::In.apply(5, 0),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_stock_adjustment_sets_absolute_value() {
        assert_eq!(StockMovementType::Adjustment.apply(5, 12).unwrap(), 12);
        assert_eq!(StockMovementType::Adjustment.apply(5, 0).unwrap(), 0);
        assert!(StockMovementType::Adjustment.apply(5, -1).is_err());
    }

    #[test]
    fn test_movement_total_price() {
        let m = StockMovement::new(Uuid::new_v4(), StockMovementType::In, 4, Some(dec!(12.5)), None, None);
        assert_eq!(m.total_price, Some(dec!(50.0)));
    }
}
