use async_trait::async_trait;

use super::{CreateUserDto, User};
use crate::domain::DomainResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; duplicate username or email yields `DomainError::Conflict`.
    async fn create_user(&self, dto: CreateUserDto) -> DomainResult<User>;

    async fn get_user_by_username(&self, username: &str) -> DomainResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>>;

    async fn record_login(&self, id: &str) -> DomainResult<()>;
    async fn update_password(&self, id: &str, password_hash: &str) -> DomainResult<()>;
    async fn count_users(&self) -> DomainResult<u64>;
}
