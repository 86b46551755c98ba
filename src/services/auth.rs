// src/services/auth.rs

use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, CurrentUser},
};

// Os tokens são emitidos pelo provedor de identidade; aqui só validamos
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String) -> Self {
        Self { user_repo, jwt_secret }
    }

    /// Confere assinatura (HS256) e expiração; devolve o id do usuário.
    pub fn decode_subject(&self, token: &str) -> Result<Uuid, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims.sub)
    }

    /// Token -> usuário com cargo. Sem linha em users, sem cargo ou com
    /// falha na consulta: NoRole.
    pub async fn resolve(&self, token: &str) -> Result<CurrentUser, AppError> {
        let user_id = self.decode_subject(token)?;

        let user = match self.user_repo.find_by_id(user_id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Falha ao buscar o cargo do usuário {}: {}", user_id, e);
                return Err(AppError::NoRole);
            }
        };

        user.and_then(CurrentUser::from_user).ok_or_else(|| {
            tracing::warn!("Usuário {} sem cargo atribuído", user_id);
            AppError::NoRole
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    const SECRET: &str = "test-secret";

    fn token(sub: Uuid, secret: &str, ttl: Duration) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub,
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref())).unwrap()
    }

    fn service() -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/leadink_test")
            .unwrap();
        AuthService::new(UserRepository::new(pool), SECRET.to_string())
    }

    #[tokio::test]
    async fn valid_token_yields_the_subject() {
        let id = Uuid::new_v4();
        let sub = service().decode_subject(&token(id, SECRET, Duration::hours(1))).unwrap();
        assert_eq!(sub, id);
    }

    #[tokio::test]
    async fn wrong_signature_is_rejected() {
        let err = service()
            .decode_subject(&token(Uuid::new_v4(), "other", Duration::hours(1)))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let err = service()
            .decode_subject(&token(Uuid::new_v4(), SECRET, Duration::hours(-2)))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn garbage_is_rejected() {
        assert!(matches!(
            service().decode_subject("not-a-jwt"),
            Err(AppError::InvalidToken)
        ));
    }
}
