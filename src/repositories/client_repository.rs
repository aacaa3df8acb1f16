use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::client_dto::ClientFilter;
use crate::dto::common_dto::{like_pattern, search_term, Pagination};
use crate::models::client::Client;
use crate::repositories::memory_table::{MemoryTable, Record};
use crate::utils::errors::{not_found_error, AppResult};

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn create(&self, client: &Client) -> AppResult<Client>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Client>>;
    async fn email_exists(&self, email: &str) -> AppResult<bool>;
    async fn cpf_exists(&self, cpf: &str) -> AppResult<bool>;
    async fn cnpj_exists(&self, cnpj: &str) -> AppResult<bool>;
    /// Guarda la fila salvo is_active, que solo cambia vía set_active
    async fn update(&self, client: &Client) -> AppResult<Client>;
    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<Client>;
    async fn list(&self, filter: &ClientFilter, pagination: Pagination) -> AppResult<(Vec<Client>, i64)>;
}

pub struct PgClientRepository {
    pool: PgPool,
}

impl PgClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, sql: &str, value: &str) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(result.0)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ClientFilter) {
    qb.push(" WHERE TRUE");
    if let Some(search) = search_term(&filter.search) {
        let pattern = like_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR phone ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR cpf ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR cnpj ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(active);
    }
}

#[async_trait]
impl ClientRepository for PgClientRepository {
    async fn create(&self, client: &Client) -> AppResult<Client> {
        let result = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (id, name, phone, email, cpf, cnpj, address, notes, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(client.id)
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.cpf)
        .bind(&client.cnpj)
        .bind(&client.address)
        .bind(&client.notes)
        .bind(client.is_active)
        .bind(client.created_at)
        .bind(client.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Client>> {
        let result = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result)
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        self.exists("SELECT EXISTS(SELECT 1 FROM clients WHERE email = $1)", email).await
    }

    async fn cpf_exists(&self, cpf: &str) -> AppResult<bool> {
        self.exists("SELECT EXISTS(SELECT 1 FROM clients WHERE cpf = $1)", cpf).await
    }

    async fn cnpj_exists(&self, cnpj: &str) -> AppResult<bool> {
        self.exists("SELECT EXISTS(SELECT 1 FROM clients WHERE cnpj = $1)", cnpj).await
    }

    async fn update(&self, client: &Client) -> AppResult<Client> {
        let result = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET name = $2, phone = $3, email = $4, cpf = $5, cnpj = $6,
                address = $7, notes = $8, updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(client.id)
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.cpf)
        .bind(&client.cnpj)
        .bind(&client.address)
        .bind(&client.notes)
        .bind(client.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<Client> {
        sqlx::query_as::<_, Client>(
            "UPDATE clients SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_error("Client", &id.to_string()))
    }

    async fn list(&self, filter: &ClientFilter, pagination: Pagination) -> AppResult<(Vec<Client>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM clients");
        push_filters(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::new("SELECT * FROM clients");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(pagination.limit)
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let clients = query.build_query_as::<Client>().fetch_all(&self.pool).await?;

        Ok((clients, total))
    }
}

impl Record for Client {
    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        [("email", &self.email), ("cpf", &self.cpf), ("cnpj", &self.cnpj)]
            .into_iter()
            .filter_map(|(field, value)| value.clone().map(|v| (field, v)))
            .collect()
    }
}

pub struct InMemoryClientRepository {
    table: MemoryTable<Client>,
}

impl InMemoryClientRepository {
    pub fn new() -> Self {
        Self {
            table: MemoryTable::new("Client"),
        }
    }
}

impl Default for InMemoryClientRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn create(&self, client: &Client) -> AppResult<Client> {
        self.table.insert(client.clone()).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Client>> {
        Ok(self.table.get(id).await)
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        Ok(self.table.any(|c| c.email.as_deref() == Some(email)).await)
    }

    async fn cpf_exists(&self, cpf: &str) -> AppResult<bool> {
        Ok(self.table.any(|c| c.cpf.as_deref() == Some(cpf)).await)
    }

    async fn cnpj_exists(&self, cnpj: &str) -> AppResult<bool> {
        Ok(self.table.any(|c| c.cnpj.as_deref() == Some(cnpj)).await)
    }

    async fn update(&self, client: &Client) -> AppResult<Client> {
        self.table
            .update_with(client.id, |stored| {
                let is_active = stored.is_active;
                *stored = client.clone();
                stored.is_active = is_active;
                Ok(stored.clone())
            })
            .await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<Client> {
        self.table
            .update_with(id, |stored| {
                stored.is_active = active;
                stored.updated_at = Utc::now();
                Ok(stored.clone())
            })
            .await
    }

    async fn list(&self, filter: &ClientFilter, pagination: Pagination) -> AppResult<(Vec<Client>, i64)> {
        Ok(self
            .table
            .page(|c| filter.matches(c), |a, b| b.created_at.cmp(&a.created_at), pagination)
            .await)
    }
}
