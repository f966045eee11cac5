//! Structures related to application protocol data units (APDUs).


use std::fmt;


#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("data is, but must not be, empty")]
    EmptyData,

    #[error("too much data: obtained {obtained} bytes, expected maximum {maximum} bytes")]
    DataTooLong { maximum: usize, obtained: usize },
}


/// The status word signalling success.
pub const STATUS_SUCCESS: u16 = 0x9000;


#[derive(Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CommandHeader {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
}
impl CommandHeader {
    pub const fn to_bytes(&self) -> [u8; 4] {
        [self.cla, self.ins, self.p1, self.p2]
    }

    pub const fn to_be_u32(&self) -> u32 {
        u32::from_be_bytes(self.to_bytes())
    }
}
impl fmt::Debug for CommandHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CommandHeader {} cla: 0x{:02X}, ins: 0x{:02X}, p1: 0x{:02X}, p2: 0x{:02X} {}",
            '{', self.cla, self.ins, self.p1, self.p2, '}',
        )
    }
}

#[derive(Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ResponseTrailer {
    pub sw1: u8,
    pub sw2: u8,
}
impl ResponseTrailer {
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self {
            sw1,
            sw2,
        }
    }

    pub const fn to_word(&self) -> u16 {
        u16::from_be_bytes([self.sw1, self.sw2])
    }
}
impl fmt::Debug for ResponseTrailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResponseTrailer {} sw1: 0x{:02X}, sw2: 0x{:02X} {}", '{', self.sw1, self.sw2, '}')
    }
}


/// The body of a command APDU.
///
/// Only short encodings are supported; the commands needed here never exceed 256 bytes in either
/// direction.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Data {
    NoData,
    RequestDataShort {
        request_data: Vec<u8>,
    },
    ResponseDataShort {
        response_data_length: u8,
    },
    BothDataShort {
        request_data: Vec<u8>,
        response_data_length: u8,
    },
}
impl Data {
    /// The expected response length. An encoded `Le` of 0 means 256 bytes.
    pub fn response_data_length(&self) -> Option<usize> {
        match self {
            Self::NoData => None,
            Self::RequestDataShort { .. } => None,
            Self::ResponseDataShort { response_data_length }
                | Self::BothDataShort { response_data_length, .. }
                => Some(if *response_data_length == 0 { 256 } else { (*response_data_length).into() }),
        }
    }

    pub fn request_data(&self) -> Option<&[u8]> {
        match self {
            Self::NoData => None,
            Self::RequestDataShort { request_data } => Some(request_data.as_slice()),
            Self::ResponseDataShort { .. } => None,
            Self::BothDataShort { request_data, .. } => Some(request_data.as_slice()),
        }
    }

    pub fn write_bytes(&self, output: &mut Vec<u8>) -> Result<(), WriteError> {
        fn length_byte(request_data: &[u8]) -> Result<u8, WriteError> {
            match request_data.len() {
                0 => Err(WriteError::EmptyData),
                // 256 is encoded as 0x00
                256 => Ok(0x00),
                len => u8::try_from(len)
                    .map_err(|_| WriteError::DataTooLong { maximum: 256, obtained: len }),
            }
        }

        match self {
            // "case" refers to the cases in ISO/IEC 7816-3:2006 § 12.1.3
            Data::NoData => {
                // case 1
            },
            Data::RequestDataShort { request_data } => {
                // case 3S: [Lc] [Data]
                output.push(length_byte(request_data)?);
                output.extend_from_slice(request_data);
            },
            Data::ResponseDataShort { response_data_length } => {
                // case 2S: [Le]
                output.push(*response_data_length);
            },
            Data::BothDataShort { request_data, response_data_length } => {
                // case 4S: [Lc] [Data] [Le]
                output.push(length_byte(request_data)?);
                output.extend_from_slice(request_data);
                output.push(*response_data_length);
            },
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Apdu {
    pub header: CommandHeader,
    pub data: Data,
}
impl Apdu {
    pub fn write_bytes(&self, output: &mut Vec<u8>) -> Result<(), WriteError> {
        output.extend_from_slice(&self.header.to_bytes());
        self.data.write_bytes(output)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WriteError> {
        let mut ret = Vec::with_capacity(4 + 1 + self.data.request_data().map_or(0, |d| d.len()) + 1);
        self.write_bytes(&mut ret)?;
        Ok(ret)
    }
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Response {
    pub data: Vec<u8>,
    pub trailer: ResponseTrailer,
}
impl Response {
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 2 {
            return None;
        }

        let (data, trailer) = bytes.split_at(bytes.len() - 2);
        Some(Self {
            data: data.to_vec(),
            trailer: ResponseTrailer::new(trailer[0], trailer[1]),
        })
    }

    pub fn is_success(&self) -> bool {
        self.trailer.to_word() == STATUS_SUCCESS
    }
}


#[cfg(test)]
mod tests {
    use super::{Apdu, CommandHeader, Data, Response, WriteError};
    use hex_literal::hex;

    fn header(ins: u8) -> CommandHeader {
        CommandHeader { cla: 0x00, ins, p1: 0x00, p2: 0x00 }
    }

    #[test]
    fn test_encode_get_challenge() {
        let apdu = Apdu { header: header(0x84), data: Data::ResponseDataShort { response_data_length: 8 } };
        assert_eq!(apdu.to_bytes().unwrap(), hex!("0084000008"));
        assert_eq!(apdu.header.to_be_u32(), 0x00_84_00_00);
    }

    #[test]
    fn test_encode_cases() {
        let case_1 = Apdu { header: header(0x44), data: Data::NoData };
        assert_eq!(case_1.to_bytes().unwrap(), hex!("00440000"));

        let case_3 = Apdu {
            header: CommandHeader { cla: 0x00, ins: 0xA4, p1: 0x04, p2: 0x0C },
            data: Data::RequestDataShort { request_data: hex!("A0000002471001").to_vec() },
        };
        assert_eq!(case_3.to_bytes().unwrap(), hex!("00A4040C07A0000002471001"));

        let case_4 = Apdu {
            header: header(0x82),
            data: Data::BothDataShort { request_data: vec![0xAA; 256], response_data_length: 0 },
        };
        let bytes = case_4.to_bytes().unwrap();
        assert_eq!(bytes.len(), 4 + 1 + 256 + 1);
        assert_eq!(bytes[4], 0x00);
        assert_eq!(case_4.data.response_data_length(), Some(256));
    }

    #[test]
    fn test_encode_errors() {
        let empty = Apdu { header: header(0x82), data: Data::RequestDataShort { request_data: Vec::new() } };
        assert!(matches!(empty.to_bytes(), Err(WriteError::EmptyData)));

        let too_long = Apdu {
            header: header(0x82),
            data: Data::BothDataShort { request_data: vec![0x00; 257], response_data_length: 0 },
        };
        assert!(matches!(too_long.to_bytes(), Err(WriteError::DataTooLong { maximum: 256, obtained: 257 })));
    }

    #[test]
    fn test_decode_response() {
        let response = Response::from_slice(&hex!("4608F91988702212 9000")).unwrap();
        assert_eq!(response.data, hex!("4608F91988702212"));
        assert!(response.is_success());

        let failure = Response::from_slice(&hex!("6988")).unwrap();
        assert!(failure.data.is_empty());
        assert_eq!(failure.trailer.to_word(), 0x6988);

        assert!(Response::from_slice(&[0x90]).is_none());
    }
}
