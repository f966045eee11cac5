//! Basic Access Control.
//!
//! The handshake as seen from the reader (ICAO Doc 9303 Part 11 § 4.3):
//! 1. obtain `RND.IC` from the chip (GET CHALLENGE)
//! 2. generate `RND.IFD` and `K.IFD`
//! 3. `S = RND.IFD || RND.IC || K.IFD`
//! 4. `E.IFD = 3DES-CBC(K_enc, S)` with a zero IV
//! 5. `M.IFD = MAC(K_mac, pad(E.IFD))`
//! 6. send `E.IFD || M.IFD` (EXTERNAL AUTHENTICATE) and receive `E.IC || M.IC`
//! 7. verify `M.IC`, decrypt `E.IC` to `RND.IC || RND.IFD || K.IC` and check both nonces
//! 8. `KS_seed = K.IFD xor K.IC`, from which `KS_enc` and `KS_mac` are derived
//! 9. `SSC = RND.IC[4..8] || RND.IFD[4..8]`


use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;
use zeroize_derive::ZeroizeOnDrop;

use crate::crypt::cipher_mac::{Cam3Des, CipherAndMac, MAC_LEN};
use crate::crypt::{pad_iso7816, xor};
use crate::kdf::{derive_document_keys, CryptoError, DocumentAccessKeys, KeyDerivation, KEY_LEN};
use crate::mrz::{MrzField, MrzKey};
use crate::session::{SecureMessagingSink, SessionKeys, SSC_LEN};
use crate::transport::{ChipTransport, TransportError, AUTH_DATA_LEN, CHALLENGE_LEN};


/// Length of the encrypted part of the authentication command and response.
const CIPHERTEXT_LEN: usize = 32;


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Operation {
    GetChallenge,
    MutualAuthenticate,
}
impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetChallenge => write!(f, "GET CHALLENGE"),
            Self::MutualAuthenticate => write!(f, "EXTERNAL AUTHENTICATE"),
        }
    }
}

/// The part of the chip's response that failed verification.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum MismatchedValue {
    /// `M.IC`, the MAC over the encrypted response.
    ResponseMac,

    /// `RND.IC` as echoed by the chip.
    RndIc,

    /// `RND.IFD` as echoed by the chip. A mismatch means wrong keys, a relay or a spoofed chip.
    RndIfd,
}
impl fmt::Display for MismatchedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResponseMac => write!(f, "response MAC"),
            Self::RndIc => write!(f, "RND.IC"),
            Self::RndIfd => write!(f, "RND.IFD"),
        }
    }
}


#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("no chip transport has been bound")]
    TransportNotBound,

    #[error("malformed {field}")]
    MalformedMrz { field: MrzField },

    #[error("authenticator has already been used; every attempt needs a new one")]
    AttemptAlreadyUsed,
}


/// Coarse classification of [`Error`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ErrorKind {
    Input,
    Transport,
    Crypto,
    ResponseValidation,
    AuthenticationFailed,
}


#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    #[error("{operation} failed: {source}")]
    ChipCommunication { operation: Operation, #[source] source: TransportError },

    #[error("{operation} timed out after {timeout:?}")]
    TransportTimeout { operation: Operation, timeout: Duration },

    #[error("{operation} response has length {obtained}, expected {expected}")]
    LengthMismatch { operation: Operation, obtained: usize, expected: usize },

    #[error("chip rejected mutual authentication: {source}")]
    AuthenticationFailed { #[source] source: TransportError },

    #[error("cryptographic failure: {0}")]
    Crypto(#[from] CryptoError),

    #[error("{value} mismatched")]
    ResponseValidation { value: MismatchedValue },
}
impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) => ErrorKind::Input,
            Self::ChipCommunication { .. } => ErrorKind::Transport,
            Self::TransportTimeout { .. } => ErrorKind::Transport,
            Self::LengthMismatch { .. } => ErrorKind::Transport,
            Self::AuthenticationFailed { .. } => ErrorKind::AuthenticationFailed,
            Self::Crypto(_) => ErrorKind::Crypto,
            Self::ResponseValidation { .. } => ErrorKind::ResponseValidation,
        }
    }
}


/// Progress of a [`MutualAuthenticator`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum HandshakeState {
    Idle,
    ChallengeRequested,
    CommandBuilt,
    ResponseAwaited,
    Verified,
    Failed,
}


/// Tunables of a [`MutualAuthenticator`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AuthenticatorConfig {
    /// Upper bound for each of the two chip round trips.
    ///
    /// `None` leaves timing entirely to the transport. Setting a timeout requires a Tokio runtime
    /// with the time driver enabled.
    pub round_trip_timeout: Option<Duration>,
}


/// The reader's contribution to one handshake attempt: `RND.IFD` and `K.IFD`.
#[derive(Clone, Eq, PartialEq, ZeroizeOnDrop)]
pub struct ReaderMaterial {
    reader_challenge: [u8; CHALLENGE_LEN],
    reader_key_material: [u8; KEY_LEN],
}
impl ReaderMaterial {
    /// Uses the given values. Only meant for reproducing known test vectors; real handshakes
    /// must use [`ReaderMaterial::generate`].
    pub fn new(reader_challenge: [u8; CHALLENGE_LEN], reader_key_material: [u8; KEY_LEN]) -> Self {
        Self {
            reader_challenge,
            reader_key_material,
        }
    }

    /// Draws fresh values from a cryptographically secure random number generator.
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        let mut reader_challenge = [0u8; CHALLENGE_LEN];
        let mut reader_key_material = [0u8; KEY_LEN];
        rng.fill_bytes(&mut reader_challenge);
        rng.fill_bytes(&mut reader_key_material);
        Self::new(reader_challenge, reader_key_material)
    }
}
impl fmt::Debug for ReaderMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderMaterial").finish_non_exhaustive()
    }
}


/// Everything one handshake attempt has to remember between its two round trips.
///
/// Created after the chip's challenge has been received and dropped (and wiped) once the attempt
/// is over.
#[derive(Clone, Eq, PartialEq, ZeroizeOnDrop)]
pub struct ChallengeMaterial {
    chip_challenge: [u8; CHALLENGE_LEN],
    reader_challenge: [u8; CHALLENGE_LEN],
    reader_key_material: [u8; KEY_LEN],
}
impl ChallengeMaterial {
    pub fn new(chip_challenge: [u8; CHALLENGE_LEN], reader: &ReaderMaterial) -> Self {
        Self {
            chip_challenge,
            reader_challenge: reader.reader_challenge,
            reader_key_material: reader.reader_key_material,
        }
    }

    /// `RND.IC`
    pub fn chip_challenge(&self) -> &[u8; CHALLENGE_LEN] {
        &self.chip_challenge
    }

    /// `RND.IFD`
    pub fn reader_challenge(&self) -> &[u8; CHALLENGE_LEN] {
        &self.reader_challenge
    }

    /// `K.IFD`
    pub fn reader_key_material(&self) -> &[u8; KEY_LEN] {
        &self.reader_key_material
    }
}
impl fmt::Debug for ChallengeMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChallengeMaterial").finish_non_exhaustive()
    }
}


/// The EXTERNAL AUTHENTICATE payload `E.IFD || M.IFD`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AuthCommand([u8; AUTH_DATA_LEN]);
impl AuthCommand {
    pub fn as_bytes(&self) -> &[u8; AUTH_DATA_LEN] {
        &self.0
    }

    /// `E.IFD`
    pub fn ciphertext(&self) -> &[u8] {
        &self.0[0..CIPHERTEXT_LEN]
    }

    /// `M.IFD`
    pub fn mac(&self) -> &[u8] {
        &self.0[CIPHERTEXT_LEN..AUTH_DATA_LEN]
    }
}


/// Builds the EXTERNAL AUTHENTICATE payload for the given challenge material.
pub fn build_command<P: CipherAndMac + ?Sized>(
    primitives: &P,
    access_keys: &DocumentAccessKeys,
    material: &ChallengeMaterial,
) -> Result<AuthCommand, CryptoError> {
    // concatenate the three values
    let mut ext_auth_data = Zeroizing::new([0u8; AUTH_DATA_LEN]);
    ext_auth_data[0..8].copy_from_slice(&material.reader_challenge);
    ext_auth_data[8..16].copy_from_slice(&material.chip_challenge);
    ext_auth_data[16..CIPHERTEXT_LEN].copy_from_slice(&material.reader_key_material);

    // encrypt with an all-zeroes IV and no padding
    let iv = vec![0u8; primitives.cipher_block_size()];
    primitives.encrypt_padded_data(&mut ext_auth_data[0..CIPHERTEXT_LEN], access_keys.enc_key(), &iv)?;

    // pad according to ISO 7816, then generate MAC
    let padded = pad_iso7816(&ext_auth_data[0..CIPHERTEXT_LEN], primitives.mac_block_size());
    let mac = primitives.mac_padded_data(&padded, access_keys.mac_key())?;
    ext_auth_data[CIPHERTEXT_LEN..CIPHERTEXT_LEN+MAC_LEN].copy_from_slice(&mac);

    Ok(AuthCommand(*ext_auth_data))
}

/// Verifies the chip's EXTERNAL AUTHENTICATE response and derives the session keys from it.
pub fn verify_response<P: CipherAndMac + KeyDerivation + ?Sized>(
    primitives: &P,
    access_keys: &DocumentAccessKeys,
    material: &ChallengeMaterial,
    response: &[u8; AUTH_DATA_LEN],
) -> Result<SessionKeys, Error> {
    // verify MAC of what we obtained
    let padded = pad_iso7816(&response[0..CIPHERTEXT_LEN], primitives.mac_block_size());
    if !primitives.verify_mac_padded_data(&padded, access_keys.mac_key(), &response[CIPHERTEXT_LEN..])? {
        return Err(Error::ResponseValidation { value: MismatchedValue::ResponseMac });
    }

    // decrypt
    let mut decrypted = Zeroizing::new([0u8; CIPHERTEXT_LEN]);
    decrypted.copy_from_slice(&response[0..CIPHERTEXT_LEN]);
    let iv = vec![0u8; primitives.cipher_block_size()];
    primitives.decrypt_padded_data(decrypted.as_mut_slice(), access_keys.enc_key(), &iv)?;

    if !bool::from(decrypted[0..8].ct_eq(&material.chip_challenge)) {
        return Err(Error::ResponseValidation { value: MismatchedValue::RndIc });
    }
    if !bool::from(decrypted[8..16].ct_eq(&material.reader_challenge)) {
        return Err(Error::ResponseValidation { value: MismatchedValue::RndIfd });
    }

    let mut k_ic = Zeroizing::new([0u8; KEY_LEN]);
    k_ic.copy_from_slice(&decrypted[16..CIPHERTEXT_LEN]);
    let k_session_seed = Zeroizing::new(xor(&material.reader_key_material, &k_ic));

    let k_session_enc = primitives.derive_encryption_key(k_session_seed.as_slice())?;
    let k_session_mac = primitives.derive_mac_key(k_session_seed.as_slice())?;
    let ssc = send_sequence_counter(&material.chip_challenge, &material.reader_challenge);

    Ok(SessionKeys::new(*k_session_enc, *k_session_mac, ssc))
}

/// The initial send sequence counter: the least significant four bytes of `RND.IC` followed by
/// the least significant four bytes of `RND.IFD`.
pub fn send_sequence_counter(chip_challenge: &[u8; CHALLENGE_LEN], reader_challenge: &[u8; CHALLENGE_LEN]) -> [u8; SSC_LEN] {
    let mut ssc = [0u8; SSC_LEN];
    ssc[0..4].copy_from_slice(&chip_challenge[4..8]);
    ssc[4..8].copy_from_slice(&reader_challenge[4..8]);
    ssc
}


/// Performs one Basic Access Control handshake.
///
/// An authenticator is good for exactly one attempt, successful or not. To retry, create a new
/// one; it will draw new randomness.
pub struct MutualAuthenticator<T: ChipTransport, P = Cam3Des> {
    transport: Option<T>,
    primitives: P,
    access_keys: DocumentAccessKeys,
    config: AuthenticatorConfig,
    state: HandshakeState,
}
impl<T: ChipTransport> MutualAuthenticator<T, Cam3Des> {
    /// Creates an authenticator using 3DES with the given document access keys.
    pub fn new(access_keys: DocumentAccessKeys) -> Self {
        Self::with_primitives(access_keys, Cam3Des)
    }

    /// Creates an authenticator using 3DES, deriving the document access keys from the MRZ key.
    pub fn from_mrz_key(mrz_key: &MrzKey) -> Result<Self, Error> {
        let k_seed = mrz_key.derive_seed()?;
        let access_keys = derive_document_keys(&Cam3Des, k_seed.as_slice())?;
        Ok(Self::new(access_keys))
    }
}
impl<T: ChipTransport, P: CipherAndMac + KeyDerivation> MutualAuthenticator<T, P> {
    pub fn with_primitives(access_keys: DocumentAccessKeys, primitives: P) -> Self {
        Self {
            transport: None,
            primitives,
            access_keys,
            config: AuthenticatorConfig::default(),
            state: HandshakeState::Idle,
        }
    }

    pub fn bind_transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_config(mut self, config: AuthenticatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn into_transport(self) -> Option<T> {
        self.transport
    }

    /// Runs the handshake with freshly generated `RND.IFD` and `K.IFD`.
    #[instrument(skip_all)]
    pub async fn authenticate(&mut self) -> Result<SessionKeys, Error> {
        self.attempt(None).await
    }

    /// Runs the handshake with the given `RND.IFD` and `K.IFD`.
    ///
    /// Reusing reader material across attempts defeats the purpose of the challenge; this is only
    /// meant for reproducing known test vectors.
    #[instrument(skip_all)]
    pub async fn authenticate_with_material(&mut self, reader: ReaderMaterial) -> Result<SessionKeys, Error> {
        self.attempt(Some(reader)).await
    }

    async fn attempt(&mut self, reader: Option<ReaderMaterial>) -> Result<SessionKeys, Error> {
        if self.state != HandshakeState::Idle {
            return Err(InputError::AttemptAlreadyUsed.into());
        }
        if self.transport.is_none() {
            return Err(InputError::TransportNotBound.into());
        }

        let result = self.run(reader).await;
        match &result {
            Ok(_) => self.transition(HandshakeState::Verified),
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "BAC failed");
                self.transition(HandshakeState::Failed);
            },
        }
        result
    }

    async fn run(&mut self, reader: Option<ReaderMaterial>) -> Result<SessionKeys, Error> {
        let timeout = self.config.round_trip_timeout;

        // obtain the challenge
        self.transition(HandshakeState::ChallengeRequested);
        let challenge_future = self.transport_mut()?.get_challenge();
        let challenge_response = match round_trip(Operation::GetChallenge, timeout, challenge_future).await? {
            Ok(cr) => cr,
            Err(source) => return Err(Error::ChipCommunication { operation: Operation::GetChallenge, source }),
        };
        let chip_challenge: [u8; CHALLENGE_LEN] = challenge_response.as_slice().try_into()
            .map_err(|_| Error::LengthMismatch {
                operation: Operation::GetChallenge,
                obtained: challenge_response.len(),
                expected: CHALLENGE_LEN,
            })?;

        // only now generate our own random bytes
        let reader = reader.unwrap_or_else(|| ReaderMaterial::generate(&mut OsRng));
        let material = ChallengeMaterial::new(chip_challenge, &reader);
        drop(reader);

        let command = build_command(&self.primitives, &self.access_keys, &material)?;
        self.transition(HandshakeState::CommandBuilt);

        // send EXTERNAL AUTHENTICATE
        self.transition(HandshakeState::ResponseAwaited);
        let auth_future = self.transport_mut()?.mutual_authenticate(command.as_bytes());
        let auth_response = match round_trip(Operation::MutualAuthenticate, timeout, auth_future).await? {
            Ok(ar) => Zeroizing::new(ar),
            Err(source) => return Err(Error::AuthenticationFailed { source }),
        };
        let auth_response: &[u8; AUTH_DATA_LEN] = auth_response.as_slice().try_into()
            .map_err(|_| Error::LengthMismatch {
                operation: Operation::MutualAuthenticate,
                obtained: auth_response.len(),
                expected: AUTH_DATA_LEN,
            })?;

        verify_response(&self.primitives, &self.access_keys, &material, auth_response)
    }

    fn transport_mut(&mut self) -> Result<&mut T, Error> {
        self.transport.as_mut()
            .ok_or(Error::Input(InputError::TransportNotBound))
    }

    fn transition(&mut self, new_state: HandshakeState) {
        debug!(from = ?self.state, to = ?new_state, "BAC state transition");
        self.state = new_state;
    }
}

/// Awaits one chip round trip, bounded by the timeout if there is one.
async fn round_trip<O, F>(operation: Operation, timeout: Option<Duration>, future: F) -> Result<Result<O, TransportError>, Error>
where
    F: Future<Output = Result<O, TransportError>>,
{
    match timeout {
        Some(duration) => tokio::time::timeout(duration, future).await
            .map_err(|_| Error::TransportTimeout { operation, timeout: duration }),
        None => Ok(future.await),
    }
}


/// Establishes Basic Access Control over the given transport and installs the resulting session
/// keys into the sink.
///
/// If anything fails, the sink's previous session is discarded.
#[instrument(skip_all)]
pub async fn establish<T, S>(
    transport: T,
    mrz_key: &MrzKey,
    config: AuthenticatorConfig,
    sink: &mut S,
) -> Result<(), Error>
where
    T: ChipTransport,
    S: SecureMessagingSink + ?Sized,
{
    let result = match MutualAuthenticator::from_mrz_key(mrz_key) {
        Ok(authenticator) => {
            let mut authenticator = authenticator
                .bind_transport(transport)
                .with_config(config);
            authenticator.authenticate().await
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(session_keys) => {
            sink.install(session_keys);
            Ok(())
        },
        Err(e) => {
            sink.discard();
            Err(e)
        },
    }
}


#[cfg(test)]
mod tests {
    use super::{
        build_command, send_sequence_counter, verify_response, ChallengeMaterial, Error, ErrorKind,
        MismatchedValue, ReaderMaterial,
    };
    use crate::crypt::cipher_mac::{Cam3Des, CipherAndMac};
    use crate::crypt::pad_iso7816;
    use crate::kdf::DocumentAccessKeys;
    use hex_literal::hex;

    const K_ENC: [u8; 16] = hex!("AB94FDECF2674FDFB9B391F85D7F76F2");
    const K_MAC: [u8; 16] = hex!("7962D9ECE03D1ACD4C76089DCE131543");
    const RND_IC: [u8; 8] = hex!("4608F91988702212");
    const RND_IFD: [u8; 8] = hex!("781723860C06C226");
    const K_IFD: [u8; 16] = hex!("0B795240CB7049B01C19B33E32804F0B");
    const K_IC: [u8; 16] = hex!("0B4F80323EB3191CB04970CB4052790B");
    const RESPONSE: [u8; 40] = hex!("
        46B9342A41396CD7 386BF5803104D7CE
        DC122B9132139BAF 2EEDC94EE178534F
        2F2D235D074D7449
    ");

    fn appendix_d_material() -> (DocumentAccessKeys, ChallengeMaterial) {
        let keys = DocumentAccessKeys::new(K_ENC, K_MAC);
        let material = ChallengeMaterial::new(RND_IC, &ReaderMaterial::new(RND_IFD, K_IFD));
        (keys, material)
    }

    /// Encrypts and MACs a chip response the way a genuine chip would.
    fn forge_response(keys: &DocumentAccessKeys, plaintext: &[u8; 32]) -> [u8; 40] {
        let mut response = [0u8; 40];
        response[0..32].copy_from_slice(plaintext);
        Cam3Des.encrypt_padded_data(&mut response[0..32], keys.enc_key(), &[0u8; 8]).unwrap();
        let padded = pad_iso7816(&response[0..32], 8);
        let mac = Cam3Des.mac_padded_data(&padded, keys.mac_key()).unwrap();
        response[32..40].copy_from_slice(&mac);
        response
    }

    fn genuine_plaintext() -> [u8; 32] {
        let mut plaintext = [0u8; 32];
        plaintext[0..8].copy_from_slice(&RND_IC);
        plaintext[8..16].copy_from_slice(&RND_IFD);
        plaintext[16..32].copy_from_slice(&K_IC);
        plaintext
    }

    #[test]
    fn test_build_command_p11_appd() {
        let (keys, material) = appendix_d_material();
        let command = build_command(&Cam3Des, &keys, &material).unwrap();
        assert_eq!(command.ciphertext(), &hex!("
            72C29C2371CC9BDB 65B779B8E8D37B29
            ECC154AA56A8799F AE2F498F76ED92F2
        "));
        assert_eq!(command.mac(), &hex!("5F1448EEA8AD90A7"));
    }

    #[test]
    fn test_verify_response_p11_appd() {
        let (keys, material) = appendix_d_material();
        let session_keys = verify_response(&Cam3Des, &keys, &material, &RESPONSE).unwrap();
        assert_eq!(session_keys.enc_key(), &hex!("979EC13B1CBFE9DCD01AB0FED307EAE5"));
        assert_eq!(session_keys.mac_key(), &hex!("F1CB1F1FB5ADF208806B89DC579DC1F8"));
        assert_eq!(session_keys.send_sequence_counter(), &hex!("887022120C06C226"));
    }

    #[test]
    fn test_forged_response_matches_appendix_d() {
        let (keys, _) = appendix_d_material();
        assert_eq!(forge_response(&keys, &genuine_plaintext()), RESPONSE);
    }

    #[test]
    fn test_any_flipped_rnd_ifd_bit_is_rejected() {
        let (keys, material) = appendix_d_material();
        for bit in 0..64 {
            let mut plaintext = genuine_plaintext();
            plaintext[8 + bit / 8] ^= 1 << (bit % 8);
            let response = forge_response(&keys, &plaintext);

            let err = verify_response(&Cam3Des, &keys, &material, &response).unwrap_err();
            assert!(matches!(err, Error::ResponseValidation { value: MismatchedValue::RndIfd }));
            assert_eq!(err.kind(), ErrorKind::ResponseValidation);
        }
    }

    #[test]
    fn test_flipped_rnd_ic_is_rejected() {
        let (keys, material) = appendix_d_material();
        let mut plaintext = genuine_plaintext();
        plaintext[3] ^= 0x40;
        let response = forge_response(&keys, &plaintext);
        let err = verify_response(&Cam3Des, &keys, &material, &response).unwrap_err();
        assert!(matches!(err, Error::ResponseValidation { value: MismatchedValue::RndIc }));
    }

    #[test]
    fn test_tampered_ciphertext_fails_mac() {
        let (keys, material) = appendix_d_material();
        for index in [0, 12, 31, 32, 39] {
            let mut response = RESPONSE;
            response[index] ^= 0x01;
            let err = verify_response(&Cam3Des, &keys, &material, &response).unwrap_err();
            assert!(matches!(err, Error::ResponseValidation { value: MismatchedValue::ResponseMac }));
        }
    }

    #[test]
    fn test_wrong_document_keys_are_rejected() {
        let (_, material) = appendix_d_material();
        let wrong_keys = DocumentAccessKeys::new(K_MAC, K_ENC);
        let err = verify_response(&Cam3Des, &wrong_keys, &material, &RESPONSE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResponseValidation);
    }

    #[test]
    fn test_send_sequence_counter_layout() {
        assert_eq!(send_sequence_counter(&RND_IC, &RND_IFD), hex!("887022120C06C226"));

        // only the lower halves matter
        let mut other_ic = RND_IC;
        let mut other_ifd = RND_IFD;
        other_ic[0..4].copy_from_slice(&hex!("DEADBEEF"));
        other_ifd[0..4].copy_from_slice(&hex!("01234567"));
        assert_eq!(send_sequence_counter(&other_ic, &other_ifd), hex!("887022120C06C226"));
    }

    #[test]
    fn test_generated_reader_material_differs() {
        let first = ReaderMaterial::generate(&mut rand::rngs::OsRng);
        let second = ReaderMaterial::generate(&mut rand::rngs::OsRng);
        assert_ne!(first, second);
    }
}
