//! Database and collection name validation.

/// Returns true if `name` is an acceptable database or collection name.
///
/// A valid name is non-empty, starts with an ASCII letter, `_` or `$`, and
/// continues with ASCII letters, digits, `_` or `$`. This is the same
/// shape as `^[A-Za-z_$][A-Za-z0-9_$]*$`.
///
/// ```rust
/// use yudb_core::validate_name;
///
/// assert!(validate_name("users"));
/// assert!(validate_name("$meta_2"));
/// assert!(!validate_name("2fast"));
/// assert!(!validate_name("user-sessions"));
/// assert!(!validate_name(""));
/// ```
#[must_use]
pub fn validate_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
        return false;
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
