use crate::domain::{DomainError, UserProfile};

/// Key-value persistence for the signed-in profile.
///
/// Sign-in is `save`, sign-out is `clear`; there are no credentials and no
/// sessions behind this port.
pub trait ProfileStore: Send + Sync {
    /// Load the stored profile, if any.
    fn load(&self) -> Result<Option<UserProfile>, DomainError>;

    /// Persist the profile.
    fn save(&self, profile: &UserProfile) -> Result<(), DomainError>;

    /// Remove the stored profile.
    fn clear(&self) -> Result<(), DomainError>;
}
