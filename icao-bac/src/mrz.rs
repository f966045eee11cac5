//! MRZ keys and the key seed derived from them.
//!
//! The MRZ key is the part of the machine-readable zone that is fed into Basic Access Control:
//! ```plain
//! NNNNNNNNNCBBBBBBDEEEEEEF
//! ```
//! with
//! * `NNNNNNNNN`: document number (right-padded with `<` to at least 9 characters)
//! * `C`: check digit of the document number
//! * `BBBBBB`: date of birth as YYMMDD
//! * `D`: check digit of date of birth
//! * `EEEEEE`: date of expiry as YYMMDD
//! * `F`: check digit of date of expiry


use std::fmt;

use digest::Digest;
use sha1::Sha1;
use tracing::instrument;
use zeroize::{Zeroize, Zeroizing};

use crate::bac::InputError;


/// Length of the key seed in bytes.
pub const KEY_SEED_LEN: usize = 16;

/// Minimum length of the MRZ key string.
const MIN_MRZ_KEY_LEN: usize = 9 + 1 + 6 + 1 + 6 + 1;


/// The MRZ field that failed to validate.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum MrzField {
    DocumentNumber,
    DateOfBirth,
    DateOfExpiry,
    KeyString,
}
impl fmt::Display for MrzField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DocumentNumber => write!(f, "document number"),
            Self::DateOfBirth => write!(f, "date of birth"),
            Self::DateOfExpiry => write!(f, "date of expiry"),
            Self::KeyString => write!(f, "MRZ key"),
        }
    }
}


/// The MRZ key of a document.
///
/// Contains personal data; the contents are wiped on drop and never shown by [`fmt::Debug`].
#[derive(Clone, Eq, PartialEq)]
pub struct MrzKey {
    key: Zeroizing<String>,
}
impl MrzKey {
    /// Assembles the MRZ key from the printed document number, date of birth and date of expiry,
    /// calculating the check digits.
    ///
    /// Dates are given as `YYMMDD`. Lowercase letters in the document number are accepted and
    /// converted to uppercase; spaces are replaced by `<`.
    pub fn new(document_number: &str, date_of_birth: &str, date_of_expiry: &str) -> Result<Self, InputError> {
        let mut document_number: Zeroizing<String> = Zeroizing::new(
            document_number
                .trim()
                .chars()
                .map(|c| if c == ' ' { '<' } else { c.to_ascii_uppercase() })
                .collect()
        );
        if document_number.is_empty() || !document_number.bytes().all(is_mrz_byte) {
            return Err(InputError::MalformedMrz { field: MrzField::DocumentNumber });
        }
        while document_number.len() < 9 {
            document_number.push('<');
        }
        ensure_date(date_of_birth, MrzField::DateOfBirth)?;
        ensure_date(date_of_expiry, MrzField::DateOfExpiry)?;

        let mut key = Zeroizing::new(String::with_capacity(document_number.len() + 1 + 6 + 1 + 6 + 1));
        for field in [document_number.as_str(), date_of_birth, date_of_expiry] {
            key.push_str(field);
            key.push(char::from(b'0' + check_digit(field.as_bytes())));
        }
        Ok(Self { key })
    }

    /// Wraps an already-assembled MRZ key string.
    ///
    /// Only the alphabet and the minimum length are checked; check digits are taken as given.
    pub fn from_key_string(key: &str) -> Result<Self, InputError> {
        if key.len() < MIN_MRZ_KEY_LEN || !key.bytes().all(is_mrz_byte) {
            return Err(InputError::MalformedMrz { field: MrzField::KeyString });
        }
        Ok(Self { key: Zeroizing::new(key.to_owned()) })
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Derives the key seed from this MRZ key.
    pub fn derive_seed(&self) -> Result<Zeroizing<[u8; KEY_SEED_LEN]>, InputError> {
        derive_seed(&self.key)
    }
}
impl fmt::Debug for MrzKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MrzKey")
            .field("key", &"<redacted>")
            .finish()
    }
}


/// Derives the 16-byte key seed from an MRZ key string.
///
/// The seed is the most significant 16 bytes of the SHA-1 hash of the key string.
#[instrument(skip_all)]
pub fn derive_seed(mrz_key: &str) -> Result<Zeroizing<[u8; KEY_SEED_LEN]>, InputError> {
    // the MRZ alphabet is pure ASCII
    if mrz_key.is_empty() || !mrz_key.is_ascii() {
        return Err(InputError::MalformedMrz { field: MrzField::KeyString });
    }

    let mut hash = Sha1::digest(mrz_key.as_bytes());
    let mut seed = Zeroizing::new([0u8; KEY_SEED_LEN]);
    seed.copy_from_slice(&hash[0..KEY_SEED_LEN]);
    hash.as_mut_slice().zeroize();
    Ok(seed)
}


fn is_mrz_byte(b: u8) -> bool {
    b.is_ascii_digit() || b.is_ascii_uppercase() || b == b'<'
}

fn ensure_date(date: &str, field: MrzField) -> Result<(), InputError> {
    if date.len() == 6 && date.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(InputError::MalformedMrz { field })
    }
}

/// Calculates the ICAO 9303 check digit of an MRZ field.
pub fn check_digit(data: &[u8]) -> u8 {
    const WEIGHTS: [u32; 3] = [7, 3, 1];

    let mut sum: u32 = 0;
    for (b, weight) in data.iter().zip(WEIGHTS.iter().cycle()) {
        let value = match b {
            b'0'..=b'9' => b - b'0',
            b'A'..=b'Z' => b - b'A' + 10,
            // '<' and anything unexpected count as zero but still consume a weight
            _ => 0,
        };
        sum += u32::from(value) * weight;
    }

    // always < 10
    (sum % 10) as u8
}


#[cfg(test)]
mod tests {
    use super::{check_digit, derive_seed, MrzKey};
    use hex_literal::hex;

    #[test]
    fn test_check_digits_p11_appd() {
        assert_eq!(check_digit(b"L898902C<"), 3);
        assert_eq!(check_digit(b"690806"), 1);
        assert_eq!(check_digit(b"940623"), 6);
    }

    #[test]
    fn test_mrz_key_assembly_p11_appd() {
        let key = MrzKey::new("L898902C", "690806", "940623").unwrap();
        assert_eq!(key.as_str(), "L898902C<369080619406236");
    }

    #[test]
    fn test_mrz_key_long_document_number() {
        let key = MrzKey::new("D23145890734", "340712", "950712").unwrap();
        assert_eq!(key.as_str(), "D23145890734934071279507122");
    }

    #[test]
    fn test_mrz_key_rejects_bad_fields() {
        assert!(MrzKey::new("", "690806", "940623").is_err());
        assert!(MrzKey::new("L8989-02C", "690806", "940623").is_err());
        assert!(MrzKey::new("L898902C", "69086", "940623").is_err());
        assert!(MrzKey::new("L898902C", "690806", "94O623").is_err());
        assert!(MrzKey::from_key_string("L898902C<3690806").is_err());
        assert!(MrzKey::from_key_string("l898902c<369080619406236").is_err());
    }

    #[test]
    fn test_mrz_key_debug_is_redacted() {
        let key = MrzKey::new("L898902C", "690806", "940623").unwrap();
        assert!(!format!("{:?}", key).contains("L898902C"));
    }

    #[test]
    fn test_derive_seed_p11_appd() {
        let seed = derive_seed("L898902C<369080619406236").unwrap();
        assert_eq!(*seed, hex!("239AB9CB282DAF66231DC5A4DF6BFBAE"));

        let key = MrzKey::from_key_string("L898902C<369080619406236").unwrap();
        assert_eq!(*key.derive_seed().unwrap(), *seed);
    }

    #[test]
    fn test_derive_seed_rejects_unencodable() {
        assert!(derive_seed("").is_err());
        assert!(derive_seed("L898902C<36908061940623\u{00E9}").is_err());
    }
}
