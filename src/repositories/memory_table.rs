//! Tabla en memoria
//!
//! Almacenamiento genérico usado por las implementaciones en memoria de los
//! repositorios (modo desarrollo sin DATABASE_URL y tests). Cada mutación se
//! hace bajo un único lock de escritura; las claves únicas se verifican dentro
//! del mismo lock, igual que haría una restricción UNIQUE.

use std::cmp::Ordering;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dto::common_dto::Pagination;
use crate::utils::errors::{conflict_error, not_found_error, AppResult};

pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;

    /// Pares (campo, valor) que no pueden repetirse, activos o no
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

pub struct MemoryTable<T> {
    entity: &'static str,
    rows: RwLock<Vec<T>>,
}

impl<T: Record> MemoryTable<T> {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            rows: RwLock::new(Vec::new()),
        }
    }

    fn check_unique(&self, rows: &[T], candidate: &T) -> AppResult<()> {
        let keys = candidate.unique_keys();
        if keys.is_empty() {
            return Ok(());
        }
        for row in rows.iter().filter(|r| r.id() != candidate.id()) {
            let existing = row.unique_keys();
            if let Some((field, value)) = keys.iter().find(|k| existing.contains(k)) {
                return Err(conflict_error(self.entity, field, value));
            }
        }
        Ok(())
    }

    pub async fn insert(&self, row: T) -> AppResult<T> {
        let mut rows = self.rows.write().await;
        self.check_unique(&rows, &row)?;
        rows.push(row.clone());
        Ok(row)
    }

    pub async fn get(&self, id: Uuid) -> Option<T> {
        self.rows.read().await.iter().find(|r| r.id() == id).cloned()
    }

    pub async fn replace(&self, row: T) -> AppResult<T> {
        let mut rows = self.rows.write().await;
        self.check_unique(&rows, &row)?;
        let slot = rows
            .iter_mut()
            .find(|r| r.id() == row.id())
            .ok_or_else(|| not_found_error(self.entity, &row.id().to_string()))?;
        *slot = row.clone();
        Ok(row)
    }

    /// Mutación atómica: `f` corre con el lock de escritura tomado y el
    /// resultado pasa por las mismas claves únicas que `insert`
    pub async fn update_with<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut T) -> AppResult<R>,
    ) -> AppResult<R> {
        let mut rows = self.rows.write().await;
        let index = rows
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| not_found_error(self.entity, &id.to_string()))?;
        // Se muta una copia para no dejar estado parcial si `f` falla
        let mut draft = rows[index].clone();
        let result = f(&mut draft)?;
        self.check_unique(&rows, &draft)?;
        rows[index] = draft;
        Ok(result)
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| r.id() != id);
        rows.len() != before
    }

    pub async fn any(&self, pred: impl Fn(&T) -> bool) -> bool {
        self.rows.read().await.iter().any(pred)
    }

    pub async fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.read().await.iter().filter(|r| pred(*r)).cloned().collect()
    }

    /// Página ordenada + total de filas que cumplen `pred`
    pub async fn page(
        &self,
        pred: impl Fn(&T) -> bool,
        order: impl FnMut(&T, &T) -> Ordering,
        pagination: Pagination,
    ) -> (Vec<T>, i64) {
        let mut matching = self.filter(pred).await;
        matching.sort_by(order);
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit as usize)
            .collect();
        (page, total)
    }
}
