//! Random password generation.

use rand::seq::SliceRandom;
use rand::Rng;
use zeroize::Zeroizing;

use crate::errors::{Result, VaultError};

const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Which characters a generated password may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub length: usize,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub symbols: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            length: 16,
            uppercase: true,
            lowercase: true,
            digits: true,
            symbols: true,
        }
    }
}

impl GeneratorOptions {
    fn classes(&self) -> Vec<&'static str> {
        [
            (self.uppercase, UPPERCASE),
            (self.lowercase, LOWERCASE),
            (self.digits, DIGITS),
            (self.symbols, SYMBOLS),
        ]
        .into_iter()
        .filter_map(|(enabled, set)| enabled.then_some(set))
        .collect()
    }
}

/// Generate a password.
///
/// Each enabled class contributes at least one character while the length
/// allows it; the rest is drawn from all enabled classes, then shuffled.
pub fn generate(options: &GeneratorOptions) -> Result<Zeroizing<String>> {
    if options.length == 0 {
        return Err(VaultError::Generator("length must be at least 1".into()));
    }
    let classes = options.classes();
    if classes.is_empty() {
        return Err(VaultError::Generator(
            "at least one character class must be enabled".into(),
        ));
    }

    let mut rng = rand::rng();
    let mut chars: Zeroizing<Vec<char>> = Zeroizing::new(Vec::with_capacity(options.length));
    for &set in classes.iter().take(options.length) {
        chars.push(pick(&mut rng, set));
    }

    let charset: String = classes.concat();
    while chars.len() < options.length {
        chars.push(pick(&mut rng, charset.as_str()));
    }

    chars.shuffle(&mut rng);
    Ok(Zeroizing::new(chars.iter().collect()))
}

/// One random character from an ASCII set.
fn pick<R: Rng>(rng: &mut R, set: &str) -> char {
    let bytes = set.as_bytes();
    char::from(bytes[rng.random_range(0..bytes.len())])
}
