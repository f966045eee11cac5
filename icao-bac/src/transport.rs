//! Transport of the two BAC commands to the document chip.


use async_trait::async_trait;
use tracing::instrument;

use crate::iso7816::apdu::{Apdu, CommandHeader, Data, WriteError};
use crate::iso7816::card::SmartCard;


/// Length of the chip challenge (`RND.IC`) in bytes.
pub const CHALLENGE_LEN: usize = 8;

/// Length of the mutual authentication command and response in bytes.
pub const AUTH_DATA_LEN: usize = 32 + 8;


#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("APDU write error: {0}")]
    Write(#[from] WriteError),

    #[error("response too short")]
    ShortResponse,

    #[error("chip responded with status 0x{status:04X}")]
    Status { status: u16 },

    #[error("reader error: {0}")]
    Reader(#[source] Box<dyn std::error::Error + Send + Sync>),
}


/// The chip-facing side of Basic Access Control.
///
/// Implementations only move bytes; they do not validate lengths or contents. That is left to
/// [`MutualAuthenticator`](crate::bac::MutualAuthenticator).
#[async_trait]
pub trait ChipTransport: Send {
    /// Requests a random challenge (`RND.IC`) from the chip.
    async fn get_challenge(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Sends the mutual authentication command and returns the chip's response.
    async fn mutual_authenticate(&mut self, command: &[u8; AUTH_DATA_LEN]) -> Result<Vec<u8>, TransportError>;
}

#[async_trait]
impl<'a, T: ChipTransport + ?Sized> ChipTransport for &'a mut T {
    async fn get_challenge(&mut self) -> Result<Vec<u8>, TransportError> {
        (**self).get_challenge().await
    }

    async fn mutual_authenticate(&mut self, command: &[u8; AUTH_DATA_LEN]) -> Result<Vec<u8>, TransportError> {
        (**self).mutual_authenticate(command).await
    }
}

#[async_trait]
impl<T: ChipTransport + ?Sized> ChipTransport for Box<T> {
    async fn get_challenge(&mut self) -> Result<Vec<u8>, TransportError> {
        (**self).get_challenge().await
    }

    async fn mutual_authenticate(&mut self, command: &[u8; AUTH_DATA_LEN]) -> Result<Vec<u8>, TransportError> {
        (**self).mutual_authenticate(command).await
    }
}


/// A [`ChipTransport`] that talks ISO/IEC 7816 APDUs to a smart card.
///
/// `get_challenge` is sent as GET CHALLENGE and `mutual_authenticate` as EXTERNAL AUTHENTICATE,
/// both in the interindustry class without Secure Messaging.
pub struct ApduChip<SC: SmartCard> {
    card: SC,
}
impl<SC: SmartCard> ApduChip<SC> {
    pub fn new(card: SC) -> Self {
        Self {
            card,
        }
    }

    pub fn card_mut(&mut self) -> &mut SC {
        &mut self.card
    }

    pub fn into_inner(self) -> SC {
        self.card
    }

    async fn exchange(&mut self, request: &Apdu) -> Result<Vec<u8>, TransportError> {
        let response = self.card.communicate(request).await?;
        if !response.is_success() {
            return Err(TransportError::Status { status: response.trailer.to_word() });
        }
        Ok(response.data)
    }
}
#[async_trait]
impl<SC: SmartCard> ChipTransport for ApduChip<SC> {
    #[instrument(skip_all)]
    async fn get_challenge(&mut self) -> Result<Vec<u8>, TransportError> {
        let get_challenge_apdu = Apdu {
            header: CommandHeader {
                cla: 0x00,
                ins: 0x84, // GET CHALLENGE
                p1: 0x00,
                p2: 0x00,
            },
            data: Data::ResponseDataShort {
                response_data_length: CHALLENGE_LEN as u8,
            },
        };
        self.exchange(&get_challenge_apdu).await
    }

    #[instrument(skip_all)]
    async fn mutual_authenticate(&mut self, command: &[u8; AUTH_DATA_LEN]) -> Result<Vec<u8>, TransportError> {
        let ext_auth_apdu = Apdu {
            header: CommandHeader {
                cla: 0x00,
                ins: 0x82, // EXTERNAL AUTHENTICATE
                p1: 0x00,
                p2: 0x00,
            },
            data: Data::BothDataShort {
                request_data: command.to_vec(),
                response_data_length: AUTH_DATA_LEN as u8,
            },
        };
        self.exchange(&ext_auth_apdu).await
    }
}
