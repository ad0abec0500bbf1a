//! Authentication service for user registration, login, and token management

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::AppRole;
use shared::types::Language;
use shared::validation::{validate_email, validate_entity_code};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::accounting::AccountingService;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// Input for registering a new branch with its owner account
#[derive(Debug, Deserialize)]
pub struct RegisterBranchInput {
    pub branch_name: String,
    /// Short branch code used in logins and reports (e.g. "PST")
    pub branch_code: String,
    pub owner_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub preferred_language: Option<Language>,
}

/// Response after successful registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub branch_id: Uuid,
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub branch_id: String,
    pub roles: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub branch_id: Option<Uuid>,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub is_active: bool,
}

/// Locations created for every new branch
const DEFAULT_LOCATIONS: &[(&str, &str)] = &[("ETL", "Etalase"), ("GDG", "Gudang")];

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Register a new branch with its owner account.
    ///
    /// Seeds the branch's default inventory locations and chart of
    /// accounts so the POS is usable immediately.
    pub async fn register_branch(&self, input: RegisterBranchInput) -> AppResult<RegisterResponse> {
        validate_entity_code(&input.branch_code).map_err(|msg| {
            AppError::validation(
                "branch_code",
                msg,
                "Kode cabang harus 2-10 huruf kapital/angka",
            )
        })?;
        validate_email(&input.email)
            .map_err(|msg| AppError::validation("email", msg, "Format email tidak valid"))?;
        if input.password.len() < 8 {
            return Err(AppError::validation(
                "password",
                "Password must be at least 8 characters",
                "Kata sandi minimal 8 karakter",
            ));
        }

        let code_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM branches WHERE code = $1)")
                .bind(&input.branch_code)
                .fetch_one(&self.db)
                .await?;
        if code_taken {
            return Err(AppError::DuplicateEntry("branch code".to_string()));
        }

        let email_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(&input.email)
                .fetch_one(&self.db)
                .await?;
        if email_taken {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let mut tx = self.db.begin().await?;

        let branch_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO branches (code, name, address, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&input.branch_code)
        .bind(&input.branch_name)
        .bind(&input.address)
        .bind(&input.phone)
        .fetch_one(&mut *tx)
        .await?;

        let language = input.preferred_language.unwrap_or_default();
        let user_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO users (branch_id, email, password_hash, full_name, phone, preferred_language)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(branch_id)
        .bind(&input.email)
        .bind(&password_hash)
        .bind(&input.owner_name)
        .bind(&input.phone)
        .bind(language.code())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
            .bind(user_id)
            .bind(AppRole::Owner.as_str())
            .execute(&mut *tx)
            .await?;

        for (code, name) in DEFAULT_LOCATIONS {
            sqlx::query(
                "INSERT INTO inventory_locations (branch_id, code, name) VALUES ($1, $2, $3)",
            )
            .bind(branch_id)
            .bind(code)
            .bind(name)
            .execute(&mut *tx)
            .await?;
        }

        AccountingService::seed_default_accounts(&mut tx, branch_id).await?;

        tx.commit().await?;

        let tokens = self.generate_tokens(user_id, branch_id, &[AppRole::Owner])?;
        self.store_refresh_token(user_id, &tokens.refresh_token)
            .await?;

        tracing::info!(branch_code = %input.branch_code, "branch registered");

        Ok(RegisterResponse {
            branch_id,
            user_id,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
        })
    }

    /// Authenticate with email and password
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthTokens> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, branch_id, email, password_hash, full_name, is_active
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::InvalidCredentials);
        }

        let valid = verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let branch_id = user.branch_id.ok_or_else(|| AppError::Unauthorized {
            message: "User has no branch assignment".to_string(),
            message_id: "Pengguna belum terdaftar di cabang".to_string(),
        })?;

        let roles = self.get_user_roles(user.id).await?;
        if roles.is_empty() {
            return Err(AppError::Unauthorized {
                message: "User has no role assignment".to_string(),
                message_id: "Pengguna belum punya peran".to_string(),
            });
        }

        let tokens = self.generate_tokens(user.id, branch_id, &roles)?;
        self.store_refresh_token(user.id, &tokens.refresh_token)
            .await?;

        Ok(tokens)
    }

    /// Refresh access token using refresh token
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        // Hash the refresh token to look up
        let token_hash = Self::hash_token(refresh_token);

        let token_record = sqlx::query_as::<_, (Uuid, Uuid)>(
            r#"
            SELECT rt.user_id, u.branch_id
            FROM refresh_tokens rt
            JOIN users u ON u.id = rt.user_id
            WHERE rt.token_hash = $1
              AND rt.expires_at > NOW()
              AND rt.revoked_at IS NULL
              AND u.is_active = true
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized {
            message: "Invalid or expired refresh token".to_string(),
            message_id: "Token refresh tidak valid atau kedaluwarsa".to_string(),
        })?;

        let (user_id, branch_id) = token_record;

        // Revoke old refresh token
        sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE token_hash = $1")
            .bind(&token_hash)
            .execute(&self.db)
            .await?;

        let roles = self.get_user_roles(user_id).await?;

        let tokens = self.generate_tokens(user_id, branch_id, &roles)?;
        self.store_refresh_token(user_id, &tokens.refresh_token)
            .await?;

        Ok(tokens)
    }

    /// Validate access token and return claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AppError::Unauthorized {
            message: format!("Invalid token: {}", e),
            message_id: "Token tidak valid".to_string(),
        })?;

        Ok(token_data.claims)
    }

    /// Get user roles from database
    async fn get_user_roles(&self, user_id: Uuid) -> AppResult<Vec<AppRole>> {
        let roles: Vec<String> =
            sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.db)
                .await?;

        Ok(roles.iter().filter_map(|r| AppRole::from_str(r)).collect())
    }

    /// Generate access and refresh tokens
    fn generate_tokens(
        &self,
        user_id: Uuid,
        branch_id: Uuid,
        roles: &[AppRole],
    ) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let access_exp = now + Duration::seconds(self.access_token_expiry);
        let refresh_exp = now + Duration::seconds(self.refresh_token_expiry);
        let role_names: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();

        let access_claims = Claims {
            sub: user_id.to_string(),
            branch_id: branch_id.to_string(),
            roles: role_names.clone(),
            exp: access_exp.timestamp(),
            iat: now.timestamp(),
        };

        let refresh_claims = Claims {
            sub: user_id.to_string(),
            branch_id: branch_id.to_string(),
            roles: role_names,
            exp: refresh_exp.timestamp(),
            iat: now.timestamp(),
        };

        let key = EncodingKey::from_secret(self.jwt_secret.as_bytes());
        let access_token = encode(&Header::default(), &access_claims, &key)
            .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))?;
        let refresh_token = encode(&Header::default(), &refresh_claims, &key)
            .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    /// Store refresh token in database
    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        let token_hash = Self::hash_token(token);
        let expires_at = Utc::now() + Duration::seconds(self.refresh_token_expiry);

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(&token_hash)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Hash a token for storage
    fn hash_token(token: &str) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_token_is_stable() {
        let a = AuthService::hash_token("some-refresh-token");
        let b = AuthService::hash_token("some-refresh-token");
        assert_eq!(a, b);
    }

    #[test]
    fn hash_token_differs_per_token() {
        let a = AuthService::hash_token("token-a");
        let b = AuthService::hash_token("token-b");
        assert_ne!(a, b);
    }
}
