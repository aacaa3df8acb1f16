use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::client_dto::{CreateClientRequest, ListClientsQuery, UpdateClientRequest};
use crate::dto::common_dto::{ApiResponse, Paginated};
use crate::models::client::Client;
use crate::repositories::client_repository::ClientRepository;
use crate::state::AppState;
use crate::utils::errors::{conflict_error, not_found_error, AppResult};
use crate::utils::validation::normalize_optional;

pub struct ClientController {
    repository: Arc<dyn ClientRepository>,
    default_page_size: i64,
}

impl ClientController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: state.repos.clients.clone(),
            default_page_size: state.config.default_page_size,
        }
    }

    async fn ensure_unique(&self, email: Option<&str>, cpf: Option<&str>, cnpj: Option<&str>) -> AppResult<()> {
        if let Some(email) = email {
            if self.repository.email_exists(email).await? {
                return Err(conflict_error("Client", "email", email));
            }
        }
        if let Some(cpf) = cpf {
            if self.repository.cpf_exists(cpf).await? {
                return Err(conflict_error("Client", "cpf", cpf));
            }
        }
        if let Some(cnpj) = cnpj {
            if self.repository.cnpj_exists(cnpj).await? {
                return Err(conflict_error("Client", "cnpj", cnpj));
            }
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> AppResult<Client> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Client", &id.to_string()))
    }

    pub async fn create(&self, request: CreateClientRequest) -> AppResult<ApiResponse<Client>> {
        request.validate()?;

        let email = normalize_optional(request.email);
        let cpf = normalize_optional(request.cpf);
        let cnpj = normalize_optional(request.cnpj);
        self.ensure_unique(email.as_deref(), cpf.as_deref(), cnpj.as_deref())
            .await?;

        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            phone: request.phone.trim().to_string(),
            email,
            cpf,
            cnpj,
            address: normalize_optional(request.address),
            notes: normalize_optional(request.notes),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let client = self.repository.create(&client).await?;

        info!("✅ Cliente creado: {} ({})", client.name, client.id);
        Ok(ApiResponse::success_with_message(
            client,
            "Cliente creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Client> {
        self.find(id).await
    }

    pub async fn list(&self, query: ListClientsQuery) -> AppResult<Paginated<Client>> {
        let (filter, pagination) = query.into_parts(self.default_page_size);
        let (clients, total) = self.repository.list(&filter, pagination).await?;
        Ok(Paginated::new(clients, pagination, total))
    }

    pub async fn update(&self, id: Uuid, request: UpdateClientRequest) -> AppResult<ApiResponse<Client>> {
        request.validate()?;
        let mut client = self.find(id).await?;

        // Solo se revalida lo que cambia
        let email = normalize_optional(request.email).filter(|e| client.email.as_ref() != Some(e));
        let cpf = normalize_optional(request.cpf).filter(|c| client.cpf.as_ref() != Some(c));
        let cnpj = normalize_optional(request.cnpj).filter(|c| client.cnpj.as_ref() != Some(c));
        self.ensure_unique(email.as_deref(), cpf.as_deref(), cnpj.as_deref())
            .await?;

        if let Some(name) = request.name {
            client.name = name.trim().to_string();
        }
        if let Some(phone) = request.phone {
            client.phone = phone.trim().to_string();
        }
        if email.is_some() {
            client.email = email;
        }
        if cpf.is_some() {
            client.cpf = cpf;
        }
        if cnpj.is_some() {
            client.cnpj = cnpj;
        }
        if request.address.is_some() {
            client.address = normalize_optional(request.address);
        }
        if request.notes.is_some() {
            client.notes = normalize_optional(request.notes);
        }
        client.updated_at = Utc::now();

        let mut client = self.repository.update(&client).await?;
        if let Some(active) = request.is_active.filter(|a| *a != client.is_active) {
            client = self.repository.set_active(id, active).await?;
        }
        Ok(ApiResponse::success_with_message(
            client,
            "Cliente actualizado exitosamente".to_string(),
        ))
    }

    /// Soft delete: la fila queda con is_active = false
    pub async fn delete(&self, id: Uuid) -> AppResult<ApiResponse<Client>> {
        let client = self.repository.set_active(id, false).await?;

        info!("🗑️ Cliente desactivado: {}", client.id);
        Ok(ApiResponse::success_with_message(
            client,
            "Cliente desactivado exitosamente".to_string(),
        ))
    }
}
