//! The outcome of a successful handshake and its hand-off to Secure Messaging.


use std::fmt;

use zeroize_derive::ZeroizeOnDrop;

use crate::kdf::KEY_LEN;


/// Length of the send sequence counter in bytes.
pub const SSC_LEN: usize = 8;


/// Session keys and the initial send sequence counter established by Basic Access Control.
#[derive(Clone, Eq, PartialEq, ZeroizeOnDrop)]
pub struct SessionKeys {
    enc_key: [u8; KEY_LEN],
    mac_key: [u8; KEY_LEN],
    send_sequence_counter: [u8; SSC_LEN],
}
impl SessionKeys {
    pub fn new(enc_key: [u8; KEY_LEN], mac_key: [u8; KEY_LEN], send_sequence_counter: [u8; SSC_LEN]) -> Self {
        Self {
            enc_key,
            mac_key,
            send_sequence_counter,
        }
    }

    /// `KS_enc`
    pub fn enc_key(&self) -> &[u8; KEY_LEN] {
        &self.enc_key
    }

    /// `KS_mac`
    pub fn mac_key(&self) -> &[u8; KEY_LEN] {
        &self.mac_key
    }

    /// `SSC`
    pub fn send_sequence_counter(&self) -> &[u8; SSC_LEN] {
        &self.send_sequence_counter
    }
}
impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("enc_key", &"<redacted>")
            .field("mac_key", &"<redacted>")
            .field("send_sequence_counter", &"<redacted>")
            .finish()
    }
}


/// Consumer of the session keys, usually the Secure Messaging layer.
///
/// Each successful handshake installs exactly one set of keys, replacing whatever session was
/// active before. A failed handshake discards the previous session instead; it must not be
/// reused.
pub trait SecureMessagingSink {
    /// Installs a new session, replacing any previous one.
    fn install(&mut self, keys: SessionKeys);

    /// Tears down any previous session.
    fn discard(&mut self);
}

impl SecureMessagingSink for Option<SessionKeys> {
    fn install(&mut self, keys: SessionKeys) {
        *self = Some(keys);
    }

    fn discard(&mut self) {
        *self = None;
    }
}


#[cfg(test)]
mod tests {
    use super::{SecureMessagingSink, SessionKeys};

    #[test]
    fn test_option_sink_replaces_and_discards() {
        let mut sink: Option<SessionKeys> = None;
        sink.install(SessionKeys::new([1; 16], [2; 16], [3; 8]));
        sink.install(SessionKeys::new([4; 16], [5; 16], [6; 8]));
        assert_eq!(sink.as_ref().map(|k| *k.send_sequence_counter()), Some([6; 8]));

        sink.discard();
        assert!(sink.is_none());
    }

    #[test]
    fn test_debug_is_redacted() {
        let keys = SessionKeys::new([0xAB; 16], [0xCD; 16], [0xEF; 8]);
        let debugged = format!("{:?}", keys);
        assert!(!debugged.contains("171"));
        assert!(!debugged.contains("239"));
    }
}
