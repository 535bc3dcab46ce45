//! Application secret key generation
//!
//! Keys are drawn from letters, digits and ASCII punctuation, minus the
//! characters that need quoting in a `.env` file: `"`, `'`, `\` and `$`.

use rand::rngs::OsRng;
use rand::seq::SliceRandom;

/// Length of a generated secret key
pub const SECRET_KEY_LENGTH: usize = 50;

const EXCLUDED: &[u8] = b"\"'\\$";

/// Characters a secret key may contain
pub fn secret_key_charset() -> Vec<u8> {
    (b'a'..=b'z')
        .chain(b'A'..=b'Z')
        .chain(b'0'..=b'9')
        .chain((0x21u8..=0x7e).filter(|c| c.is_ascii_punctuation()))
        .filter(|c| !EXCLUDED.contains(c))
        .collect()
}

/// Generate a random secret key using the OS entropy source
pub fn generate_secret_key() -> String {
    let charset = secret_key_charset();
    let mut rng = OsRng;
    (0..SECRET_KEY_LENGTH)
        .filter_map(|_| charset.choose(&mut rng).map(|&c| c as char))
        .collect()
}
