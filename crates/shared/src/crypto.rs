//! Random exit code generation.

use rand::rngs::OsRng;
use rand::Rng;

/// Characters used for exit codes. Excludes `0`, `O`, `1` and `I`, which are
/// easily confused when read aloud or copied from a projector.
pub const EXIT_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Code length used when the caller does not ask for one.
pub const DEFAULT_EXIT_CODE_LENGTH: usize = 6;

/// Upper bound accepted for a requested code length.
pub const MAX_EXIT_CODE_LENGTH: usize = 32;

/// Normalizes a requested length: absent, zero or negative becomes the default.
pub fn effective_code_length(requested: Option<i32>) -> usize {
    match requested {
        Some(n) if n > 0 => n as usize,
        _ => DEFAULT_EXIT_CODE_LENGTH,
    }
}

/// Generates a random exit code of `length` characters.
///
/// Each character is drawn uniformly from [`EXIT_CODE_ALPHABET`] using the
/// operating system's CSPRNG.
pub fn generate_exit_code(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..EXIT_CODE_ALPHABET.len());
            EXIT_CODE_ALPHABET[idx] as char
        })
        .collect()
}
