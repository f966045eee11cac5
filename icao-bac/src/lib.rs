//! Basic Access Control (BAC) for machine-readable travel documents as specified in ICAO Doc 9303
//! Part 11.
//!
//! The usual flow is:
//! 1. assemble the MRZ key ([`mrz::MrzKey`]) and derive the key seed ([`mrz::derive_seed`])
//! 2. derive the document access keys ([`kdf::derive_document_keys`])
//! 3. run a [`bac::MutualAuthenticator`] over a [`transport::ChipTransport`]
//! 4. hand the resulting [`session::SessionKeys`] to a [`session::SecureMessagingSink`]
//!
//! [`bac::establish`] performs all of the above in one go.


pub mod bac;
pub mod crypt;
pub mod iso7816;
pub mod kdf;
pub mod mrz;
pub mod session;
pub mod transport;


/// Formats bytes as uppercase hexadecimal without separators.
pub fn hex_string(buf: &[u8]) -> String {
    buf.iter()
        .map(|b| format!("{:02X}", b))
        .collect()
}


#[cfg(test)]
mod tests {
    use super::hex_string;

    #[test]
    fn test_hex_string() {
        assert_eq!(hex_string(&[]), "");
        assert_eq!(hex_string(&[0x88, 0x70, 0x22, 0x12, 0x0C, 0x06, 0xC2, 0x26]), "887022120C06C226");
    }
}
