use async_trait::async_trait;

use crate::iso7816::apdu;
use crate::transport::TransportError;


/// A smart card compatible with ISO/IEC 7816.
#[async_trait]
pub trait SmartCard: Send {
    /// Send a request APDU to the smart card and receive a response APDU.
    async fn communicate(&mut self, request: &apdu::Apdu) -> Result<apdu::Response, TransportError>;
}

#[async_trait]
impl<SC: SmartCard + ?Sized> SmartCard for Box<SC> {
    async fn communicate(&mut self, request: &apdu::Apdu) -> Result<apdu::Response, TransportError> {
        (**self).communicate(request).await
    }
}
