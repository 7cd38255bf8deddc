//! Constrained random password generation.
//!
//! Random bytes are drawn from the OS CSPRNG in fixed-size chunks.  Every
//! byte in the printable ASCII range (33..=126) is appended to the
//! candidate; once the candidate reaches the requested length it is kept
//! only if it contains at least one character of every required class,
//! otherwise it is wiped and generation starts over.

use rand::TryRngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{PassVaultError, Result};

/// Length used when the caller asks for zero or a negative length.
pub const DEFAULT_PASSWORD_LENGTH: usize = 24;

/// Largest password the generator will produce.
pub const MAX_PASSWORD_LENGTH: usize = 1024;

/// Random bytes drawn per refill.
const CHUNK_LEN: usize = 256;

/// A character class a generated password can be required to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Upper,
    Lower,
    Digit,
    Symbol,
}

impl CharClass {
    /// Every class, in a fixed order.
    pub const ALL: [CharClass; 4] = [
        CharClass::Upper,
        CharClass::Lower,
        CharClass::Digit,
        CharClass::Symbol,
    ];

    /// Classify a printable ASCII byte.
    pub fn of(byte: u8) -> Option<Self> {
        match byte {
            b'A'..=b'Z' => Some(CharClass::Upper),
            b'a'..=b'z' => Some(CharClass::Lower),
            b'0'..=b'9' => Some(CharClass::Digit),
            33..=47 | 58..=64 | 91..=96 | 123..=126 => Some(CharClass::Symbol),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        match self {
            CharClass::Upper => 0b0001,
            CharClass::Lower => 0b0010,
            CharClass::Digit => 0b0100,
            CharClass::Symbol => 0b1000,
        }
    }
}

/// Turn a caller-supplied length into the effective one.
///
/// Zero or negative falls back to the default; anything above the maximum
/// is refused.
pub fn effective_length(length: i64) -> Result<usize> {
    if length <= 0 {
        return Ok(DEFAULT_PASSWORD_LENGTH);
    }
    let length = usize::try_from(length).unwrap_or(usize::MAX);
    if length > MAX_PASSWORD_LENGTH {
        return Err(PassVaultError::LengthTooLarge {
            length,
            max: MAX_PASSWORD_LENGTH,
        });
    }
    Ok(length)
}

/// Generate a password of `length` characters containing every class in
/// `required`.
///
/// Two calls with the same arguments are not expected to agree.
pub fn generate(length: i64, required: &[CharClass]) -> Result<String> {
    generate_with(&mut rand::rngs::OsRng, length, required)
}

/// Same as [`generate`], drawing from a caller-supplied random source.
pub fn generate_with<R: TryRngCore>(
    rng: &mut R,
    length: i64,
    required: &[CharClass],
) -> Result<String> {
    let length = effective_length(length)?;

    let wanted = required.iter().fold(0u8, |mask, class| mask | class.bit());
    let required_count = wanted.count_ones() as usize;
    if length < required_count {
        return Err(PassVaultError::InfeasibleRequest {
            length,
            required: required_count,
        });
    }

    let mut chunk = Zeroizing::new([0u8; CHUNK_LEN]);
    let mut candidate = Zeroizing::new(Vec::with_capacity(length));
    let mut seen = 0u8;

    loop {
        rng.try_fill_bytes(&mut chunk[..])
            .map_err(|e| PassVaultError::RandomnessUnavailable(e.to_string()))?;

        for &byte in chunk.iter() {
            let Some(class) = CharClass::of(byte) else {
                continue;
            };
            candidate.push(byte);
            seen |= class.bit();

            if candidate.len() == length {
                if seen & wanted == wanted {
                    return Ok(candidate.iter().map(|&b| char::from(b)).collect());
                }
                // Wipes and clears; capacity is kept for the next attempt.
                candidate.zeroize();
                seen = 0;
            }
        }
    }
}
