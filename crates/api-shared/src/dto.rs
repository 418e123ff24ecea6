//! Wire DTOs for the documented endpoints.

use serde::{Deserialize, Serialize};
use simward_core::model::User;
use utoipa::ToSchema;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginReq {
    pub username: String,
    pub password: String,
}

/// A user as exposed on the wire. Never carries the password.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        let role = match user.role {
            simward_core::model::Role::Student => "student",
            simward_core::model::Role::Instructor => "instructor",
            simward_core::model::Role::Admin => "admin",
            simward_core::model::Role::Coordinator => "coordinator",
        };
        Self {
            id: user.id.to_string(),
            username: user.username,
            role: role.into(),
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRes {
    pub user: UserDto,
}

/// Uniform error body for every non-2xx JSON response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use simward_core::model::{NewUser, Role};
    use simward_core::{EntityStore, MemoryStore};

    #[test]
    fn user_dto_strips_the_password() {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                username: "jsmith".into(),
                password: "hunter2".into(),
                role: Role::Coordinator,
                first_name: "Jo".into(),
                last_name: "Smith".into(),
            })
            .unwrap();

        let dto = UserDto::from(user);
        let json = serde_json::to_string(&dto).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("\"role\":\"coordinator\""));
    }
}
