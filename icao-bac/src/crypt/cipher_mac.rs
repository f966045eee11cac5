//! Cipher and MAC (message authentication code) combinations.


use block_padding::NoPadding;
use cipher::{BlockModeDecrypt, BlockModeEncrypt, KeyIvInit};
use des::{Des, TdesEde2};
use digest::{Digest, KeyInit, Mac};
use retail_mac::RetailMac;
use sha1::Sha1;
use zeroize::{Zeroize, Zeroizing};

use crate::crypt::adjust_des_parity;
use crate::kdf::{ensure_seed_len, CryptoError, KdfMode, KeyDerivation, KEY_LEN};


/// Length of a MAC in bytes.
pub const MAC_LEN: usize = 8;


type RetailMacDes = RetailMac<Des>;


/// A combination of cipher and MAC usable during authentication.
///
/// All operations work on data that is already padded to the respective block size; nothing is
/// padded or unpadded implicitly.
pub trait CipherAndMac {
    /// Size of the cipher key in bytes.
    fn cipher_key_size(&self) -> usize;

    /// Block size of the cipher in bytes.
    fn cipher_block_size(&self) -> usize;

    /// Block size of the MAC in bytes.
    fn mac_block_size(&self) -> usize;

    /// Decrypts data in-place using the given key and CBC IV.
    ///
    /// Does not strip padding.
    fn decrypt_padded_data(&self, data: &mut [u8], key: &[u8], iv: &[u8]) -> Result<(), CryptoError>;

    /// Encrypts pre-padded data in-place using the given key and CBC IV.
    fn encrypt_padded_data(&self, data: &mut [u8], key: &[u8], iv: &[u8]) -> Result<(), CryptoError>;

    /// Generates a MAC for the given pre-padded data and key.
    fn mac_padded_data(&self, data: &[u8], key: &[u8]) -> Result<[u8; MAC_LEN], CryptoError>;

    /// Verifies in constant time whether the given data fits the given MAC.
    fn verify_mac_padded_data(&self, data: &[u8], key: &[u8], expected_mac: &[u8]) -> Result<bool, CryptoError>;
}


/// 3DES-based cipher and MAC as used by Basic Access Control.
///
/// 3DES is used in EDE two-key mode:
/// ```plain
/// encrypt((K1, K2), D) = encrypt(K1, decrypt(K2, encrypt(K1, D)))
/// ```
/// The block mode of operation is Cipher Block Chaining (CBC).
///
/// The KDF is equivalent to:
/// ```plain
/// keydata = sha1(key_seed || counter)[0..16]
/// ```
/// after which every byte of `keydata` is adjusted to odd parity, whereupon
/// ```plain
/// K1 = keydata[0..8]
/// K2 = keydata[8..16]
/// ```
///
/// The MAC is Retail MAC (ISO/IEC 9797-1 MAC algorithm 3) with DES.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Cam3Des;
impl Cam3Des {
    const BLOCK_SIZE: usize = 8;

    fn ensure_key(&self, key: &[u8]) -> Result<(), CryptoError> {
        if key.len() != self.cipher_key_size() {
            return Err(CryptoError::KeyLength { obtained: key.len(), expected: self.cipher_key_size() });
        }
        Ok(())
    }

    fn ensure_iv(&self, iv: &[u8]) -> Result<(), CryptoError> {
        if iv.len() != self.cipher_block_size() {
            return Err(CryptoError::IvLength { obtained: iv.len(), expected: self.cipher_block_size() });
        }
        Ok(())
    }

    fn ensure_aligned(data: &[u8]) -> Result<(), CryptoError> {
        if data.is_empty() || data.len() % Self::BLOCK_SIZE != 0 {
            return Err(CryptoError::Unaligned { obtained: data.len(), block_size: Self::BLOCK_SIZE });
        }
        Ok(())
    }

    fn retail_mac(&self, data: &[u8], key: &[u8]) -> Result<RetailMacDes, CryptoError> {
        self.ensure_key(key)?;
        Self::ensure_aligned(data)?;

        let mut retail_mac = RetailMacDes::new_from_slice(key)
            .map_err(|_| CryptoError::KeyLength { obtained: key.len(), expected: self.cipher_key_size() })?;
        Mac::update(&mut retail_mac, data);
        Ok(retail_mac)
    }
}
impl CipherAndMac for Cam3Des {
    fn cipher_key_size(&self) -> usize { KEY_LEN }
    fn cipher_block_size(&self) -> usize { Self::BLOCK_SIZE }
    fn mac_block_size(&self) -> usize { Self::BLOCK_SIZE }

    fn decrypt_padded_data(&self, data: &mut [u8], key: &[u8], iv: &[u8]) -> Result<(), CryptoError> {
        self.ensure_key(key)?;
        self.ensure_iv(iv)?;
        Self::ensure_aligned(data)?;

        let obtained = data.len();
        let decryptor = cbc::Decryptor::<TdesEde2>::new_from_slices(key, iv)
            .map_err(|_| CryptoError::KeyLength { obtained: key.len(), expected: self.cipher_key_size() })?;
        decryptor.decrypt_padded::<NoPadding>(data)
            .map_err(|_| CryptoError::Unaligned { obtained, block_size: Self::BLOCK_SIZE })?;
        Ok(())
    }

    fn encrypt_padded_data(&self, data: &mut [u8], key: &[u8], iv: &[u8]) -> Result<(), CryptoError> {
        self.ensure_key(key)?;
        self.ensure_iv(iv)?;
        Self::ensure_aligned(data)?;

        let obtained = data.len();
        let encryptor = cbc::Encryptor::<TdesEde2>::new_from_slices(key, iv)
            .map_err(|_| CryptoError::KeyLength { obtained: key.len(), expected: self.cipher_key_size() })?;
        encryptor.encrypt_padded::<NoPadding>(data, obtained)
            .map_err(|_| CryptoError::Unaligned { obtained, block_size: Self::BLOCK_SIZE })?;
        Ok(())
    }

    fn mac_padded_data(&self, data: &[u8], key: &[u8]) -> Result<[u8; MAC_LEN], CryptoError> {
        let retail_mac = self.retail_mac(data, key)?;
        let mut tag = retail_mac.finalize().into_bytes();

        let mut mac = [0u8; MAC_LEN];
        mac.copy_from_slice(tag.as_slice());
        tag.as_mut_slice().zeroize();
        Ok(mac)
    }

    fn verify_mac_padded_data(&self, data: &[u8], key: &[u8], expected_mac: &[u8]) -> Result<bool, CryptoError> {
        let retail_mac = self.retail_mac(data, key)?;
        Ok(retail_mac.verify_slice(expected_mac).is_ok())
    }
}
impl KeyDerivation for Cam3Des {
    fn derive_key(&self, key_seed: &[u8], mode: KdfMode) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
        ensure_seed_len(key_seed)?;

        let mut hasher = Sha1::new();
        Digest::update(&mut hasher, key_seed);
        Digest::update(&mut hasher, mode.counter().to_be_bytes());
        let mut hash = hasher.finalize();

        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        key.copy_from_slice(&hash[0..KEY_LEN]);
        hash.as_mut_slice().zeroize();

        adjust_des_parity(key.as_mut_slice());
        Ok(key)
    }
}
