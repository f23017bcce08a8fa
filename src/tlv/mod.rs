//! Binary TLV exchange of clock quality snapshots

pub mod clock_quality;
pub mod codec;

#[cfg(test)]
mod tests;

pub use clock_quality::{ClockQualityTlv, FORMAT_VERSION, decode_clock_quality, encode_clock_quality};
pub use codec::{TlvDecoder, TlvEncoder, TlvError, TlvType};
