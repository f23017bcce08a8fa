//! 16-bit type / 16-bit length TLV encoding

use std::collections::HashMap;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Size of a record header: 2-byte type plus 2-byte length
pub const HEADER_LEN: usize = 4;

/// Largest value a single record can carry
pub const MAX_VALUE_LEN: usize = u16::MAX as usize;

/// TLV type codes used in clock quality exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TlvType {
    /// Encoding format version
    FormatVersion = 0x0000,
    /// Name of the compliance profile that produced the snapshot
    ProfileName = 0x0001,
    /// Measurement method
    MeasurementMethod = 0x0002,
    /// Valid measurements in the window
    TotalMeasurements = 0x0003,
    /// Mean time error
    MeanTimeError = 0x0004,
    /// Maximum time error
    MaxTimeError = 0x0005,
    /// Minimum time error
    MinTimeError = 0x0006,
    /// Standard deviation of time error
    StdDev = 0x0007,
    /// RMS time error
    RmsError = 0x0008,
    /// Frequency stability
    FrequencyStability = 0x0009,
    /// Lock flag and lock time
    LockState = 0x000A,
    /// Observation window
    ObservationWindow = 0x000B,
    /// Current run of in-bound measurements
    ConsecutiveGood = 0x000C,
    /// Requirement flags bitfield
    ComplianceFlags = 0x000D,
    /// Invalid measurements in the window
    InvalidMeasurements = 0x000E,
    /// Outer container for a clock quality snapshot
    ClockQualityContainer = 0x8001,
}

impl TlvType {
    /// Create from a wire value
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0000 => Some(Self::FormatVersion),
            0x0001 => Some(Self::ProfileName),
            0x0002 => Some(Self::MeasurementMethod),
            0x0003 => Some(Self::TotalMeasurements),
            0x0004 => Some(Self::MeanTimeError),
            0x0005 => Some(Self::MaxTimeError),
            0x0006 => Some(Self::MinTimeError),
            0x0007 => Some(Self::StdDev),
            0x0008 => Some(Self::RmsError),
            0x0009 => Some(Self::FrequencyStability),
            0x000A => Some(Self::LockState),
            0x000B => Some(Self::ObservationWindow),
            0x000C => Some(Self::ConsecutiveGood),
            0x000D => Some(Self::ComplianceFlags),
            0x000E => Some(Self::InvalidMeasurements),
            0x8001 => Some(Self::ClockQualityContainer),
            _ => None,
        }
    }

    /// Wire value
    #[must_use]
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// TLV decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TlvError {
    /// A record header or value runs past the end of the buffer
    #[error("buffer too small: needed {needed} bytes, have {have}")]
    BufferTooSmall {
        /// Bytes required from the current position
        needed: usize,
        /// Bytes remaining
        have: usize,
    },

    /// The outer record is not the expected type
    #[error("unexpected TLV type: 0x{0:04x}")]
    UnexpectedType(u16),

    /// A fixed-size field has the wrong length
    #[error("invalid length for {tlv_type:?}: expected {expected}, got {actual}")]
    InvalidLength {
        /// The offending field
        tlv_type: TlvType,
        /// Required length
        expected: usize,
        /// Length found
        actual: usize,
    },

    /// A required field is absent
    #[error("missing required field: {0:?}")]
    MissingField(TlvType),

    /// A field is present but its value is out of range
    #[error("invalid value for {0:?}")]
    InvalidValue(TlvType),
}

/// TLV encoder
pub struct TlvEncoder {
    buffer: BytesMut,
}

impl TlvEncoder {
    /// Create a new encoder
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// Add a TLV item
    ///
    /// Values longer than [`MAX_VALUE_LEN`] are split across consecutive
    /// records of the same type; the decoder joins them again.
    #[must_use]
    pub fn add(mut self, tlv_type: TlvType, value: &[u8]) -> Self {
        self.put_record(tlv_type.as_u16(), value);
        self
    }

    fn put_record(&mut self, tlv_type: u16, value: &[u8]) {
        if value.is_empty() {
            self.buffer.put_u16(tlv_type);
            self.buffer.put_u16(0);
            return;
        }
        for chunk in value.chunks(MAX_VALUE_LEN) {
            self.buffer.reserve(HEADER_LEN + chunk.len());
            self.buffer.put_u16(tlv_type);
            #[allow(clippy::cast_possible_truncation)]
            self.buffer.put_u16(chunk.len() as u16);
            self.buffer.put_slice(chunk);
        }
    }

    /// Add a single byte value
    #[must_use]
    pub fn add_u8(self, tlv_type: TlvType, value: u8) -> Self {
        self.add(tlv_type, &[value])
    }

    /// Add a big-endian `u32`
    #[must_use]
    pub fn add_u32(self, tlv_type: TlvType, value: u32) -> Self {
        self.add(tlv_type, &value.to_be_bytes())
    }

    /// Add a big-endian `i64`
    #[must_use]
    pub fn add_i64(self, tlv_type: TlvType, value: i64) -> Self {
        self.add(tlv_type, &value.to_be_bytes())
    }

    /// Add an `f64` as its big-endian IEEE-754 bit pattern
    #[must_use]
    pub fn add_f64(self, tlv_type: TlvType, value: f64) -> Self {
        self.add(tlv_type, &value.to_bits().to_be_bytes())
    }

    /// Add a UTF-8 string
    #[must_use]
    pub fn add_str(self, tlv_type: TlvType, value: &str) -> Self {
        self.add(tlv_type, value.as_bytes())
    }

    /// Wrap everything encoded so far in a single outer record
    #[must_use]
    pub fn wrap(self, container: TlvType) -> Self {
        let inner = self.buffer.freeze();
        let mut outer = Self::new();
        outer.put_record(container.as_u16(), &inner);
        outer
    }

    /// Build the encoded TLV data
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    /// Build the encoded TLV data without copying
    #[must_use]
    pub fn freeze(self) -> Bytes {
        self.buffer.freeze()
    }
}

impl Default for TlvEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// TLV decoder
///
/// Records of types this crate does not know are kept but never read, so
/// newer encoders can add fields without breaking older decoders.
pub struct TlvDecoder {
    items: HashMap<u16, Vec<u8>>,
}

impl TlvDecoder {
    /// Decode TLV data
    ///
    /// # Errors
    ///
    /// Returns error if a record header or value is truncated
    pub fn decode(data: &[u8]) -> Result<Self, TlvError> {
        let mut items: HashMap<u16, Vec<u8>> = HashMap::new();
        let mut buf = data;

        while buf.has_remaining() {
            let (tlv_type, value) = read_record(&mut buf)?;
            // Concatenate fragmented values
            items.entry(tlv_type).or_default().extend_from_slice(value);
        }

        Ok(Self { items })
    }

    /// Decode a buffer that must start with a single `container` record
    /// and return the decoded contents of that record.
    ///
    /// Bytes after the container are ignored.
    ///
    /// # Errors
    ///
    /// Returns error if the outer record is truncated, of the wrong type,
    /// or its contents are malformed
    pub fn decode_container(data: &[u8], container: TlvType) -> Result<Self, TlvError> {
        let mut buf = data;
        let (tlv_type, value) = read_record(&mut buf)?;
        if tlv_type != container.as_u16() {
            return Err(TlvError::UnexpectedType(tlv_type));
        }
        Self::decode(value)
    }

    /// Get a value by type
    #[must_use]
    pub fn get(&self, tlv_type: TlvType) -> Option<&[u8]> {
        self.items
            .get(&tlv_type.as_u16())
            .map(std::vec::Vec::as_slice)
    }

    /// Whether a record of the given type was present
    #[must_use]
    pub fn contains(&self, tlv_type: TlvType) -> bool {
        self.items.contains_key(&tlv_type.as_u16())
    }

    /// Number of distinct record types decoded
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no records were decoded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get a required value
    ///
    /// # Errors
    ///
    /// Returns error if field is missing
    pub fn get_required(&self, tlv_type: TlvType) -> Result<&[u8], TlvError> {
        self.get(tlv_type).ok_or(TlvError::MissingField(tlv_type))
    }

    /// Get a required value of exactly `N` bytes
    ///
    /// # Errors
    ///
    /// Returns error if field is missing or has the wrong length
    pub fn get_fixed<const N: usize>(&self, tlv_type: TlvType) -> Result<[u8; N], TlvError> {
        let value = self.get_required(tlv_type)?;
        value.try_into().map_err(|_| TlvError::InvalidLength {
            tlv_type,
            expected: N,
            actual: value.len(),
        })
    }

    /// Get a single byte value
    ///
    /// # Errors
    ///
    /// Returns error if field is missing or not one byte
    pub fn get_u8(&self, tlv_type: TlvType) -> Result<u8, TlvError> {
        self.get_fixed::<1>(tlv_type).map(|[b]| b)
    }

    /// Get a big-endian `u32`
    ///
    /// # Errors
    ///
    /// Returns error if field is missing or not four bytes
    pub fn get_u32(&self, tlv_type: TlvType) -> Result<u32, TlvError> {
        self.get_fixed(tlv_type).map(u32::from_be_bytes)
    }

    /// Get a big-endian `i64`
    ///
    /// # Errors
    ///
    /// Returns error if field is missing or not eight bytes
    pub fn get_i64(&self, tlv_type: TlvType) -> Result<i64, TlvError> {
        self.get_fixed(tlv_type).map(i64::from_be_bytes)
    }

    /// Get an `f64` stored as its IEEE-754 bit pattern
    ///
    /// # Errors
    ///
    /// Returns error if field is missing or not eight bytes
    pub fn get_f64(&self, tlv_type: TlvType) -> Result<f64, TlvError> {
        self.get_fixed(tlv_type)
            .map(|b| f64::from_bits(u64::from_be_bytes(b)))
    }

    /// Get a UTF-8 string
    ///
    /// # Errors
    ///
    /// Returns error if field is missing or not valid UTF-8
    pub fn get_str(&self, tlv_type: TlvType) -> Result<&str, TlvError> {
        let value = self.get_required(tlv_type)?;
        std::str::from_utf8(value).map_err(|_| TlvError::InvalidValue(tlv_type))
    }
}

/// Read one record from the front of `buf`, advancing past it.
fn read_record<'a>(buf: &mut &'a [u8]) -> Result<(u16, &'a [u8]), TlvError> {
    if buf.remaining() < HEADER_LEN {
        return Err(TlvError::BufferTooSmall {
            needed: HEADER_LEN,
            have: buf.remaining(),
        });
    }
    let tlv_type = buf.get_u16();
    let length = usize::from(buf.get_u16());
    if buf.remaining() < length {
        return Err(TlvError::BufferTooSmall {
            needed: length,
            have: buf.remaining(),
        });
    }
    let remaining: &'a [u8] = *buf;
    let (value, rest) = remaining.split_at(length);
    *buf = rest;
    Ok((tlv_type, value))
}
