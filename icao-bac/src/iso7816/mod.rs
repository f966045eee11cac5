//! ISO/IEC 7816 smart card plumbing.


pub mod apdu;
pub mod card;
