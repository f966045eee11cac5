//! Key derivation.
//!
//! ICAO Doc 9303 Part 11 § 9.7.1 derives every symmetric key from a key seed and a 32-bit
//! counter that selects the purpose of the key:
//! ```plain
//! keydata = H(key_seed || counter)
//! ```
//! The concrete hash function and truncation depend on the cipher; see
//! [`Cam3Des`](crate::crypt::cipher_mac::Cam3Des) for the 3DES variant used by BAC.


use std::fmt;

use tracing::instrument;
use zeroize::Zeroizing;
use zeroize_derive::ZeroizeOnDrop;

use crate::mrz::KEY_SEED_LEN;


/// Length of a derived BAC key (two-key 3DES) in bytes.
pub const KEY_LEN: usize = 16;


#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key seed has length {obtained}, expected {expected}")]
    SeedLength { obtained: usize, expected: usize },

    #[error("key has length {obtained}, expected {expected}")]
    KeyLength { obtained: usize, expected: usize },

    #[error("IV has length {obtained}, expected {expected}")]
    IvLength { obtained: usize, expected: usize },

    #[error("data has length {obtained}, which is not a multiple of the block size {block_size}")]
    Unaligned { obtained: usize, block_size: usize },
}


/// The purpose for which a key is derived.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum KdfMode {
    /// Key for encryption.
    Enc,

    /// Key for message authentication.
    Mac,
}
impl KdfMode {
    /// The counter value appended to the key seed.
    pub const fn counter(&self) -> u32 {
        match self {
            Self::Enc => 1,
            Self::Mac => 2,
        }
    }
}
impl fmt::Display for KdfMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enc => write!(f, "ENC"),
            Self::Mac => write!(f, "MAC"),
        }
    }
}


/// A key derivation function turning a key seed into a usable cipher key.
///
/// Implementations must be deterministic in `(key_seed, mode)` and must return keys that are
/// directly usable by the matching cipher (e.g. with DES parity already adjusted).
pub trait KeyDerivation {
    /// Derives the key for the given purpose.
    ///
    /// Fails with [`CryptoError::SeedLength`] if `key_seed` is not exactly [`KEY_SEED_LEN`] bytes
    /// long.
    fn derive_key(&self, key_seed: &[u8], mode: KdfMode) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError>;

    /// The key derivation function for encryption purposes.
    fn derive_encryption_key(&self, key_seed: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
        self.derive_key(key_seed, KdfMode::Enc)
    }

    /// The key derivation function for message authentication purposes.
    fn derive_mac_key(&self, key_seed: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
        self.derive_key(key_seed, KdfMode::Mac)
    }
}

pub(crate) fn ensure_seed_len(key_seed: &[u8]) -> Result<(), CryptoError> {
    if key_seed.len() != KEY_SEED_LEN {
        return Err(CryptoError::SeedLength { obtained: key_seed.len(), expected: KEY_SEED_LEN });
    }
    Ok(())
}


/// The keys with which the document's chip is accessed before Secure Messaging is established
/// (`K_enc` and `K_mac` in ICAO terminology).
///
/// Derived once per handshake attempt from the MRZ key seed.
#[derive(Clone, Eq, PartialEq, ZeroizeOnDrop)]
pub struct DocumentAccessKeys {
    enc_key: [u8; KEY_LEN],
    mac_key: [u8; KEY_LEN],
}
impl DocumentAccessKeys {
    pub fn new(enc_key: [u8; KEY_LEN], mac_key: [u8; KEY_LEN]) -> Self {
        Self {
            enc_key,
            mac_key,
        }
    }

    pub fn enc_key(&self) -> &[u8; KEY_LEN] {
        &self.enc_key
    }

    pub fn mac_key(&self) -> &[u8; KEY_LEN] {
        &self.mac_key
    }
}
impl fmt::Debug for DocumentAccessKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentAccessKeys")
            .field("enc_key", &"<redacted>")
            .field("mac_key", &"<redacted>")
            .finish()
    }
}


/// Derives the document access keys from the MRZ key seed, calling the KDF once per mode.
#[instrument(skip_all)]
pub fn derive_document_keys<K: KeyDerivation + ?Sized>(kdf: &K, key_seed: &[u8]) -> Result<DocumentAccessKeys, CryptoError> {
    let enc_key = kdf.derive_encryption_key(key_seed)?;
    let mac_key = kdf.derive_mac_key(key_seed)?;
    Ok(DocumentAccessKeys::new(*enc_key, *mac_key))
}


#[cfg(test)]
mod tests {
    use super::{derive_document_keys, CryptoError, KdfMode, KeyDerivation};
    use crate::crypt::cipher_mac::Cam3Des;
    use hex_literal::hex;

    #[test]
    fn test_document_keys_p11_appd() {
        let k_seed = hex!("239AB9CB282DAF66231DC5A4DF6BFBAE");
        let keys = derive_document_keys(&Cam3Des, &k_seed).unwrap();
        assert_eq!(keys.enc_key(), &hex!("AB94FDECF2674FDFB9B391F85D7F76F2"));
        assert_eq!(keys.mac_key(), &hex!("7962D9ECE03D1ACD4C76089DCE131543"));
    }

    #[test]
    fn test_modes_are_deterministic_and_distinct() {
        let k_seed = hex!("0036D272F5C350ACAC50C3F572D23600");
        let enc_1 = Cam3Des.derive_key(&k_seed, KdfMode::Enc).unwrap();
        let enc_2 = Cam3Des.derive_key(&k_seed, KdfMode::Enc).unwrap();
        let mac_1 = Cam3Des.derive_key(&k_seed, KdfMode::Mac).unwrap();
        let mac_2 = Cam3Des.derive_key(&k_seed, KdfMode::Mac).unwrap();
        assert_eq!(enc_1, enc_2);
        assert_eq!(mac_1, mac_2);
        assert_ne!(enc_1, mac_1);
    }

    #[test]
    fn test_wrong_seed_length() {
        let short_seed = [0u8; 15];
        let err = derive_document_keys(&Cam3Des, &short_seed).unwrap_err();
        assert!(matches!(err, CryptoError::SeedLength { obtained: 15, expected: 16 }));

        let long_seed = [0u8; 20];
        assert!(Cam3Des.derive_mac_key(&long_seed).is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let keys = derive_document_keys(&Cam3Des, &hex!("239AB9CB282DAF66231DC5A4DF6BFBAE")).unwrap();
        assert_eq!(
            format!("{:?}", keys),
            r#"DocumentAccessKeys { enc_key: "<redacted>", mac_key: "<redacted>" }"#,
        );
    }
}
