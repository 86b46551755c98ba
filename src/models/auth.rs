// src/models/auth.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Mapeia o CREATE TYPE user_role do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    SalesManager,
    SalesRep,
    LeadAssigner,
    QuoteMaker,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::SalesManager,
        Role::SalesRep,
        Role::LeadAssigner,
        Role::QuoteMaker,
        Role::Viewer,
    ];

    /// Só vendedores podem ser donos de um lead.
    pub fn is_sales(self) -> bool {
        matches!(self, Role::SalesRep | Role::SalesManager)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::SalesManager => "sales_manager",
            Role::SalesRep => "sales_rep",
            Role::LeadAssigner => "lead_assigner",
            Role::QuoteMaker => "quote_maker",
            Role::Viewer => "viewer",
        }
    }
}

// Linha da tabela users. O cargo é atribuído fora da aplicação e pode faltar.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    pub role: Option<Role>,
}

// O principal já resolvido, com cargo garantido. Vive nas extensions da requisição.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: Uuid,
    pub full_name: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn from_user(user: User) -> Option<Self> {
        let role = user.role?;
        Some(Self {
            id: user.id,
            full_name: user.full_name,
            role,
        })
    }
}

// Vendedores disponíveis para atribuição e filtros
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesUser {
    pub id: Uuid,
    #[schema(example = "John Seller")]
    pub full_name: String,
    pub role: Role,
}

// Estrutura de dados ("claims") dentro do JWT emitido pelo provedor de identidade
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time
    #[serde(default)]
    pub iat: usize,
}
