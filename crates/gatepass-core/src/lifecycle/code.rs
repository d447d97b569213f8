// ── Access code generation ──
//
// Short codes a visitor can read off a phone and a watchman can type.
// The alphabet leaves out glyphs that are easy to confuse on a screen or
// on paper (0/O, 1/I/L).

use rand::Rng;

use crate::error::CoreError;

/// Symbols a pass code may contain.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Length of a generated code unless configured otherwise.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Upper bound accepted for a configured code length.
pub const MAX_CODE_LENGTH: usize = 32;

/// Generate a fresh code of [`DEFAULT_CODE_LENGTH`] using the thread RNG.
pub fn generate_code() -> String {
    generate_code_with(&mut rand::thread_rng(), DEFAULT_CODE_LENGTH)
}

/// Generate a code of `len` symbols drawn uniformly from [`CODE_ALPHABET`].
///
/// `len` is clamped to `1..=MAX_CODE_LENGTH`. Uniqueness is not checked;
/// the backend owns collision handling.
pub fn generate_code_with<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    let len = len.clamp(1, MAX_CODE_LENGTH);
    (0..len)
        .map(|_| char::from(CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())]))
        .collect()
}

/// Returns `true` if `c` may appear in a generated code.
pub fn is_code_symbol(c: char) -> bool {
    u8::try_from(c).is_ok_and(|b| CODE_ALPHABET.contains(&b))
}

/// Clean up a code typed at the gate.
///
/// Trims, drops inner spaces and dashes, and upper-cases. Anything left
/// outside the alphabet is a validation error rather than a silent miss
/// on the backend.
pub fn normalize_code(input: &str) -> Result<String, CoreError> {
    let code: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if code.is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "pass code is required".into(),
        });
    }

    if let Some(bad) = code.chars().find(|c| !is_code_symbol(*c)) {
        return Err(CoreError::ValidationFailed {
            message: format!("'{bad}' is not a valid pass code character"),
        });
    }

    Ok(code)
}
