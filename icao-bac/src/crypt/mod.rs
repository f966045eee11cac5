//! Cryptographic helpers shared by the handshake.


pub mod cipher_mac;


use block_padding::{Iso7816, Padding};
use zeroize::Zeroizing;


/// Pads data according to ISO/IEC 9797-1 padding method 2: a single `0x80` byte, then as many
/// `0x00` bytes as necessary to reach a multiple of the block size.
///
/// Block-aligned input gains a whole block of padding.
pub fn pad_iso7816(data: &[u8], block_size: usize) -> Zeroizing<Vec<u8>> {
    let padded_len = (data.len() / block_size + 1) * block_size;
    let mut padded = Zeroizing::new(vec![0u8; padded_len]);
    padded[..data.len()].copy_from_slice(data);
    Iso7816::raw_pad(padded.as_mut_slice(), data.len());
    padded
}

/// XORs two equally long byte strings.
pub fn xor<const N: usize>(a: &[u8; N], b: &[u8; N]) -> [u8; N] {
    let mut ret = [0u8; N];
    for ((r, x), y) in ret.iter_mut().zip(a.iter()).zip(b.iter()) {
        *r = *x ^ *y;
    }
    ret
}

/// Sets the least significant bit of each byte so that every byte has odd parity, as DES expects
/// of its keys.
pub fn adjust_des_parity(key: &mut [u8]) {
    for b in key.iter_mut() {
        let upper = *b & 0xFE;
        *b = upper | u8::from(upper.count_ones() % 2 == 0);
    }
}
