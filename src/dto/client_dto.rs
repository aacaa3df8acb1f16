use serde::Deserialize;
use validator::Validate;

use crate::dto::common_dto::{matches_search, search_term, Pagination};
use crate::models::client::Client;

// Request para crear un cliente
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[validate(length(min = 2, max = 255))]
    pub name: String,

    #[validate(custom = "crate::utils::validation::validate_phone")]
    pub phone: String,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(custom = "crate::utils::validation::validate_cpf")]
    pub cpf: Option<String>,

    #[validate(custom = "crate::utils::validation::validate_cnpj")]
    pub cnpj: Option<String>,

    pub address: Option<String>,
    pub notes: Option<String>,
}

// Request para actualizar un cliente (patch parcial)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateClientRequest {
    #[validate(length(min = 2, max = 255))]
    pub name: Option<String>,

    #[validate(custom = "crate::utils::validation::validate_phone")]
    pub phone: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(custom = "crate::utils::validation::validate_cpf")]
    pub cpf: Option<String>,

    #[validate(custom = "crate::utils::validation::validate_cnpj")]
    pub cnpj: Option<String>,

    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

// Query de listado: ?page=1&limit=20&search=silva&is_active=true
#[derive(Debug, Default, Deserialize)]
pub struct ListClientsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

impl ListClientsQuery {
    pub fn into_parts(self, default_limit: i64) -> (ClientFilter, Pagination) {
        (
            ClientFilter {
                search: self.search,
                is_active: self.is_active,
            },
            Pagination::new(self.page, self.limit, default_limit),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

impl ClientFilter {
    /// Búsqueda en name, phone, email, cpf, cnpj
    pub fn matches(&self, client: &Client) -> bool {
        let fields = [
            Some(client.name.as_str()),
            Some(client.phone.as_str()),
            client.email.as_deref(),
            client.cpf.as_deref(),
            client.cnpj.as_deref(),
        ];
        matches_search(&fields, search_term(&self.search))
            && self.is_active.map_or(true, |active| client.is_active == active)
    }
}
