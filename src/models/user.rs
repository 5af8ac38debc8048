use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog-facing view of a user record
///
/// The record itself is owned by the authentication collaborator; this core
/// only reads the declared age and the accumulated genre interests, and
/// appends to `viewed_genres` through the user store's merge operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    /// Declared age; drives content-rating filtering when present
    pub age: Option<i32>,
    /// Genre tags observed from viewing history, first-seen order, no duplicates
    pub viewed_genres: Vec<String>,
}
