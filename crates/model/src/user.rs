use serde::{Deserialize, Serialize};

/// Stable identifier assigned by the record source.
pub type UserId = u64;

/// A user record as served by `GET /users`.
///
/// Only `id`, `name` and `email` are required on the wire; every other field
/// falls back to its default so partial fixtures still decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub company: Company,
}

impl User {
    /// Minimal record with empty nested data.
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            username: String::new(),
            email: email.into(),
            address: Address::default(),
            phone: String::new(),
            website: String::new(),
            company: Company::default(),
        }
    }

    #[must_use]
    pub fn with_company(mut self, name: impl Into<String>) -> Self {
        self.company.name = name.into();
        self
    }

    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.address.city = city.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub suite: String,
    pub city: String,
    pub zipcode: String,
    pub geo: Geo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geo {
    pub lat: String,
    pub lng: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Company {
    pub name: String,
    pub catch_phrase: String,
    pub bs: String,
}
