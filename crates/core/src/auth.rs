//! Login verification.

use crate::error::CoreResult;
use crate::model::User;
use crate::store::EntityStore;
use crate::CoreError;

/// Verifies a username/password pair against the store.
///
/// Passwords are compared as plaintext strings, which is how the modelled
/// system behaves. A deliberate consequence is that an unknown username and a
/// wrong password are indistinguishable: both paths return the same
/// `Unauthenticated("Invalid credentials")` error, so the login endpoint
/// cannot leak which usernames exist.
pub fn authenticate(
    store: &dyn EntityStore,
    username: &str,
    password: &str,
) -> CoreResult<User> {
    let user = store.get_user_by_username(username)?;

    match user {
        Some(user) if user.password == password => Ok(user),
        _ => Err(CoreError::Unauthenticated("Invalid credentials".into())),
    }
}
