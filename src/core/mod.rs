use crate::sections::{EncodeError, IdSet};
use base64::Engine;
use bitstream_io::{BigEndian, BitWrite, BitWriter};
use chrono::{DateTime, Utc};
use num_traits::ToPrimitive;
use tracing::trace;

pub mod vendors;

pub trait EncodeExt {
    fn encode_base64_url(&self) -> String;
}

impl EncodeExt for [u8] {
    fn encode_base64_url(&self) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(self)
    }
}

pub trait ToDataWriter {
    type Err;

    fn to_data_writer(&self, w: &mut DataWriter) -> Result<(), Self::Err>;
}

/// Bit-level writer producing the packed payload of a consent string segment.
///
/// Bits are written most significant first. The payload is padded with zero bits
/// to the next byte boundary when it is finalized.
pub struct DataWriter {
    bit_writer: BitWriter<Vec<u8>, BigEndian>,
    bits_written: u64,
}

impl Default for DataWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DataWriter {
    pub fn new() -> Self {
        Self {
            bit_writer: BitWriter::endian(Vec::new(), BigEndian),
            bits_written: 0,
        }
    }

    pub fn write<T>(&mut self, value: &T) -> Result<(), <T as ToDataWriter>::Err>
    where
        T: ToDataWriter + ?Sized,
    {
        value.to_data_writer(self)
    }

    /// Number of bits written so far, padding excluded.
    #[cfg(test)]
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), EncodeError> {
        self.bit_writer.write_bit(value)?;
        self.bits_written += 1;
        Ok(())
    }

    /// Writes `value` on exactly `bits` bits, left padded with zeroes.
    ///
    /// Values which do not fit are rejected rather than truncated.
    pub fn write_fixed_integer<N>(
        &mut self,
        field: &'static str,
        value: N,
        bits: u32,
    ) -> Result<(), EncodeError>
    where
        N: ToPrimitive,
    {
        let n = value
            .to_u64()
            .filter(|n| bits >= u64::BITS || n >> bits == 0)
            .ok_or_else(|| EncodeError::FieldOverflow {
                field,
                value: value.to_i128().unwrap_or_default(),
                bits,
            })?;

        if bits > 0 {
            self.bit_writer.write(bits, n)?;
            self.bits_written += u64::from(bits);
        }

        Ok(())
    }

    /// Writes a timestamp as the number of deciseconds since the Unix epoch, on 36 bits.
    pub fn write_datetime_as_deciseconds(
        &mut self,
        field: &'static str,
        datetime: &DateTime<Utc>,
    ) -> Result<(), EncodeError> {
        let deciseconds = datetime.timestamp_millis().div_euclid(100);
        self.write_fixed_integer(field, deciseconds, 36)
    }

    /// Writes an uppercase ASCII string using 6 bits per letter, `A` being 0.
    pub fn write_string(&mut self, s: &str) -> Result<(), EncodeError> {
        for b in s.bytes() {
            if !b.is_ascii_uppercase() {
                return Err(EncodeError::InvalidLanguageCode(s.to_string()));
            }
            self.write_fixed_integer("string", b - b'A', 6)?;
        }

        Ok(())
    }

    /// Writes `bits` bits where bit `i` (starting at 1) is set if `i` is part of `ids`.
    ///
    /// Ids outside of `1..=bits` are ignored.
    pub fn write_fixed_bitfield(&mut self, ids: &IdSet, bits: u16) -> Result<(), EncodeError> {
        for i in 1..=bits {
            self.write_bool(ids.contains(&i))?;
        }

        Ok(())
    }

    /// Pads to the next byte boundary and returns the written bytes.
    pub fn into_bytes(mut self) -> Result<Vec<u8>, EncodeError> {
        trace!(bits = self.bits_written, "padding segment payload");
        self.bit_writer.byte_align()?;
        Ok(self.bit_writer.into_writer())
    }

    pub fn into_base64_url(self) -> Result<String, EncodeError> {
        Ok(self.into_bytes()?.encode_base64_url())
    }
}
