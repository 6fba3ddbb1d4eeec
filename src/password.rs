//! Secret handling for encrypted zip entries.

use std::fmt;

use zeroize::Zeroizing;

/// The secret used to encrypt and decrypt archive entries.
///
/// The backing buffer is zeroed on drop. `Debug` prints a placeholder, so a
/// password can sit inside logged structs without leaking.
///
/// ```
/// use uniarch::Password;
///
/// let password = Password::from("hunter2");
/// assert_eq!(format!("{:?}", password), "Password(***)");
/// assert_eq!(password.expose(), "hunter2");
/// ```
#[derive(Clone)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Wraps `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Returns the secret text.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the secret as UTF-8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Returns true for the empty password.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

impl From<&str> for Password {
    fn from(secret: &str) -> Self {
        Self::new(secret)
    }
}

impl From<String> for Password {
    fn from(secret: String) -> Self {
        Self::new(secret)
    }
}

impl From<&String> for Password {
    fn from(secret: &String) -> Self {
        Self::new(secret.as_str())
    }
}
