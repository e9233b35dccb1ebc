use serde::{Deserialize, Serialize};

/// Account role of a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    Jobseeker,
    Recruiter,
    Admin,
}

/// Identity record passed as explicit context to components that need it.
/// Persisted under a single key by a `ProfileStore`; there is no
/// authentication logic behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl UserProfile {
    /// The demo profile every sign-in resolves to.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            id: "1".to_string(),
            name: "John Doe".to_string(),
            email: "john.doe@example.com".to_string(),
            role: UserRole::Jobseeker,
        }
    }
}
