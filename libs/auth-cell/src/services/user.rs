use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{QueryBuilder, SupabaseClient};
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_utils::jwt::{decode_claims, issue_token};
use shared_utils::validation::{is_blank, is_valid_email};

use crate::models::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
    UserAccount, UserProfile,
};
use crate::services::password::{PasswordService, MIN_PASSWORD_LENGTH};

const USERS: &str = "users";

pub struct UserService {
    supabase: SupabaseClient,
    config: AppConfig,
}

impl UserService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            config: config.clone(),
        }
    }

    #[instrument(skip(self, request), fields(email = ?request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        let mut errors = Vec::new();
        if is_blank(request.username.as_deref()) {
            errors.push("Username is required".to_string());
        }
        if is_blank(request.email.as_deref()) {
            errors.push("Email is required".to_string());
        }
        if is_blank(request.password.as_deref()) {
            errors.push("Password is required".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::ValidationFailed(errors));
        }

        let username = request.username.unwrap_or_default().trim().to_string();
        let email = request.email.unwrap_or_default().trim().to_lowercase();
        let password = request.password.unwrap_or_default();

        if !is_valid_email(&email) {
            return Err(AppError::ValidationError("Please enter a valid email address".to_string()));
        }
        if !PasswordService::is_long_enough(&password) {
            return Err(AppError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        if self.find_by_username(&username).await?.is_some() {
            return Err(AppError::ValidationError("Username already exists".to_string()));
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::ValidationError("Email is already registered".to_string()));
        }

        let password_hash = PasswordService::hash_password(&password)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let role = if self.config.admin_emails.iter().any(|a| a.eq_ignore_ascii_case(&email)) {
            Role::Admin
        } else {
            Role::User
        };

        let now = Utc::now();
        let account = UserAccount {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            phone: request.phone.filter(|p| !p.trim().is_empty()),
            address: request.address.filter(|a| !a.trim().is_empty()),
            avatar: None,
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let created: UserAccount = self.supabase.insert(USERS, &account).await?;
        info!("Registered user {}", created.id);

        self.auth_response(created)
    }

    #[instrument(skip(self, request), fields(email = ?request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let mut errors = Vec::new();
        if is_blank(request.email.as_deref()) {
            errors.push("Email is required".to_string());
        }
        if is_blank(request.password.as_deref()) {
            errors.push("Password is required".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::ValidationFailed(errors));
        }

        let email = request.email.unwrap_or_default().trim().to_lowercase();
        let password = request.password.unwrap_or_default();

        let account = self
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !account.is_active {
            return Err(AppError::Auth("Account disabled".to_string()));
        }

        let matches = PasswordService::verify_password(&password, &account.password_hash)
            .map_err(|e| {
                warn!("Stored password hash for {} is unreadable: {}", account.id, e);
                invalid_credentials()
            })?;
        if !matches {
            return Err(invalid_credentials());
        }

        debug!("User {} logged in", account.id);
        self.auth_response(account)
    }

    pub fn refresh(&self, token: &str) -> Result<String, AppError> {
        let claims = decode_claims(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Auth(e.to_string()))?;

        issue_token(&claims.sub, &claims.email, claims.role, &self.config)
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    pub async fn current_profile(&self, user_id: &str) -> Result<UserProfile, AppError> {
        let account = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Auth("User no longer exists".to_string()))?;

        if !account.is_active {
            return Err(AppError::Forbidden("Your account has been disabled".to_string()));
        }

        Ok(account.into())
    }

    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile, AppError> {
        let account = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let mut changes = serde_json::Map::new();

        if let Some(username) = request.username.map(|u| u.trim().to_string()) {
            if username.is_empty() {
                return Err(AppError::ValidationError("Username cannot be empty".to_string()));
            }
            if username != account.username {
                if let Some(existing) = self.find_by_username(&username).await? {
                    if existing.id != account.id {
                        return Err(AppError::ValidationError("Username already exists".to_string()));
                    }
                }
            }
            changes.insert("username".into(), json!(username));
        }
        if let Some(phone) = request.phone {
            changes.insert("phone".into(), json!(phone));
        }
        if let Some(address) = request.address {
            changes.insert("address".into(), json!(address));
        }
        if let Some(avatar) = request.avatar {
            changes.insert("avatar".into(), json!(avatar));
        }
        changes.insert("updatedAt".into(), json!(Utc::now()));

        let query = QueryBuilder::new().eq("id", user_id).build();
        let updated: Vec<UserAccount> = self.supabase.update(USERS, &query, &changes).await?;

        updated
            .into_iter()
            .next()
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    #[instrument(skip(self, request))]
    pub async fn change_password(
        &self,
        user_id: &str,
        request: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let mut errors = Vec::new();
        if is_blank(request.current_password.as_deref()) {
            errors.push("Current password is required".to_string());
        }
        if is_blank(request.new_password.as_deref()) {
            errors.push("New password is required".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::ValidationFailed(errors));
        }

        let current = request.current_password.unwrap_or_default();
        let new_password = request.new_password.unwrap_or_default();

        if !PasswordService::is_long_enough(&new_password) {
            return Err(AppError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let account = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let matches = PasswordService::verify_password(&current, &account.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !matches {
            return Err(AppError::ValidationError("Current password is incorrect".to_string()));
        }

        let password_hash = PasswordService::hash_password(&new_password)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let query = QueryBuilder::new().eq("id", user_id).build();
        let _: Vec<UserAccount> = self
            .supabase
            .update(
                USERS,
                &query,
                &json!({ "passwordHash": password_hash, "updatedAt": Utc::now() }),
            )
            .await?;

        info!("Password changed for user {}", user_id);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserAccount>, AppError> {
        let query = QueryBuilder::new().eq("id", id).build();
        Ok(self.supabase.select_one(USERS, &query).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AppError> {
        let query = QueryBuilder::new().eq("email", email).build();
        Ok(self.supabase.select_one(USERS, &query).await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, AppError> {
        let query = QueryBuilder::new().eq("username", username).build();
        Ok(self.supabase.select_one(USERS, &query).await?)
    }

    fn auth_response(&self, account: UserAccount) -> Result<AuthResponse, AppError> {
        let token = issue_token(&account.id, &account.email, account.role, &self.config)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(AuthResponse {
            user: account.into(),
            token,
        })
    }
}

fn invalid_credentials() -> AppError {
    AppError::Auth("Invalid email or password".to_string())
}
