use crate::user::{User, UserId};
use serde::Serialize;

/// Display shape of a [`User`]: the subset of fields a table row renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub company_name: String,
    pub city: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            company_name: user.company.name.clone(),
            city: user.address.city.clone(),
        }
    }
}
