use crate::error::ApiResult;
use async_trait::async_trait;
use roster_model::{User, UserId};

/// Record source and delete endpoint.
///
/// `fetch_users` maps to `GET /users`, `delete_user` to `DELETE /users/{id}`.
/// Implementations report non-2xx responses as [`crate::ApiError::Status`].
#[async_trait]
pub trait UserApi: Send + Sync {
    async fn fetch_users(&self) -> ApiResult<Vec<User>>;

    async fn delete_user(&self, id: UserId) -> ApiResult<()>;
}
