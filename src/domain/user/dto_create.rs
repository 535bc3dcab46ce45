use super::UserRole;

/// Data for inserting a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct CreateUserDto {
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub password_hash: String,
}
