// src/codec.rs
//
// Binary preset and bank layout.
//
// All integers and floats are little-endian, strings are a u32 byte length
// followed by UTF-8 bytes:
//
//   "plum" u32:1 u32:0  <unit id> u32:1 u32:0  "preset" <name> f32 * params
//   "plum" u32:1 u32:0  <unit id> u32:1 u32:0  "bank" u32:count (<name> f32 * params) * count
//
// Decoding checks every header field and every length before returning, and
// returns plain records; callers apply them only after decoding succeeded.

use crate::error::{Error, Result};
use crate::preset::{Bank, Preset};

const MAGIC: &str = "plum";
const VERSION: (u32, u32) = (1, 0);
const KIND_PRESET: &str = "preset";
const KIND_BANK: &str = "bank";

/// One decoded preset: name plus raw values in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetRecord {
    pub name: String,
    pub values: Vec<f32>,
}

impl From<&Preset> for PresetRecord {
    fn from(preset: &Preset) -> Self {
        Self {
            name: preset.name().to_string(),
            values: preset.values(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Writing
// ═══════════════════════════════════════════════════════════════════

#[derive(Default)]
struct ByteWriter {
    data: Vec<u8>,
}

impl ByteWriter {
    fn u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn f32(&mut self, value: f32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn string(&mut self, value: &str) {
        self.u32(value.len() as u32);
        self.data.extend_from_slice(value.as_bytes());
    }

    fn header(&mut self, unit_id: &str, kind: &str) {
        self.string(MAGIC);
        self.u32(VERSION.0);
        self.u32(VERSION.1);
        self.string(unit_id);
        self.u32(VERSION.0);
        self.u32(VERSION.1);
        self.string(kind);
    }

    fn record(&mut self, preset: &Preset) {
        self.string(preset.name());
        for value in preset.values() {
            self.f32(value);
        }
    }
}

/// Encode a single preset.
pub fn encode_preset(unit_id: &str, preset: &Preset) -> Vec<u8> {
    let mut w = ByteWriter::default();
    w.header(unit_id, KIND_PRESET);
    w.record(preset);
    w.data
}

/// Encode every preset of a bank.
pub fn encode_bank(unit_id: &str, bank: &Bank) -> Vec<u8> {
    let mut w = ByteWriter::default();
    w.header(unit_id, KIND_BANK);
    w.u32(bank.len() as u32);
    for preset in bank.iter() {
        w.record(preset);
    }
    w.data
}

// ═══════════════════════════════════════════════════════════════════
// Reading
// ═══════════════════════════════════════════════════════════════════

struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8]> {
        let available = self.data.len() - self.pos;
        if needed > available {
            return Err(Error::Truncated {
                offset: self.pos,
                needed,
                available,
            });
        }
        let bytes = &self.data[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(bytes)
    }

    fn array4(&mut self) -> Result<[u8; 4]> {
        let mut out = [0u8; 4];
        out.copy_from_slice(self.take(4)?);
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array4()?))
    }

    fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.array4()?))
    }

    fn string(&mut self) -> Result<String> {
        let len = self.u32()? as usize;
        let start = self.pos;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| Error::InvalidUtf8(start))
    }

    fn version(&mut self, what: &'static str) -> Result<()> {
        let major = self.u32()?;
        let minor = self.u32()?;
        if (major, minor) == VERSION {
            Ok(())
        } else {
            Err(Error::UnsupportedVersion { what, major, minor })
        }
    }

    fn header(&mut self, unit_id: &str, kind: &'static str) -> Result<()> {
        let magic = self.string()?;
        if magic != MAGIC {
            return Err(Error::BadMagic(magic));
        }
        self.version("format")?;

        let found = self.string()?;
        if found != unit_id {
            return Err(Error::UnitMismatch {
                expected: unit_id.to_string(),
                found,
            });
        }
        self.version("unit")?;

        let found = self.string()?;
        if found != kind {
            return Err(Error::UnexpectedKind {
                expected: kind,
                found,
            });
        }
        Ok(())
    }

    fn record(&mut self, param_count: usize) -> Result<PresetRecord> {
        let name = self.string()?;
        let values = (0..param_count)
            .map(|index| -> Result<f32> {
                let value = self.f32()?;
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(Error::NonFiniteValue { index, value })
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PresetRecord { name, values })
    }

    fn finish(&self) -> Result<()> {
        match self.data.len() - self.pos {
            0 => Ok(()),
            extra => Err(Error::TrailingBytes(extra)),
        }
    }
}

/// Decode a single preset for `unit_id` with `param_count` parameters.
pub fn decode_preset(unit_id: &str, data: &[u8], param_count: usize) -> Result<PresetRecord> {
    let mut r = ByteReader::new(data);
    r.header(unit_id, KIND_PRESET)?;
    let record = r.record(param_count)?;
    r.finish()?;
    Ok(record)
}

/// Decode a bank for `unit_id`.
///
/// A bank may hold fewer presets than `capacity` (only the leading presets
/// are replaced) but never more.
pub fn decode_bank(
    unit_id: &str,
    data: &[u8],
    param_count: usize,
    capacity: usize,
) -> Result<Vec<PresetRecord>> {
    let mut r = ByteReader::new(data);
    r.header(unit_id, KIND_BANK)?;

    let count = r.u32()? as usize;
    if count > capacity {
        return Err(Error::BankTooLarge {
            found: count,
            capacity,
        });
    }

    let records = (0..count)
        .map(|_| r.record(param_count))
        .collect::<Result<Vec<_>>>()?;
    r.finish()?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParamDef;

    static DEFS: [ParamDef; 6] = [
        ParamDef::new("osctype").range(0.0, 1.0).choices(&["SQU", "SAW"]),
        ParamDef::new("pwm").range(0.01, 0.99),
        ParamDef::new("attack").range(0.01, 2.0),
        ParamDef::new("decay").range(0.01, 2.0),
        ParamDef::new("sustain").range(0.01, 1.0),
        ParamDef::new("release").range(0.01, 2.0),
    ];

    fn square1() -> Preset {
        Preset::define(&DEFS, &[0.0, 0.10, 0.25, 0.25, 0.5, 2.0], "Square 1")
    }

    fn header(unit: &str, kind: &str) -> Vec<u8> {
        let mut w = ByteWriter::default();
        w.header(unit, kind);
        w.data
    }

    #[test]
    fn preset_layout_is_bit_exact() {
        let data = encode_preset("dsynth", &square1());

        let mut expected = Vec::new();
        expected.extend_from_slice(&4u32.to_le_bytes());
        expected.extend_from_slice(b"plum");
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(&0u32.to_le_bytes());
        expected.extend_from_slice(&6u32.to_le_bytes());
        expected.extend_from_slice(b"dsynth");
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(&0u32.to_le_bytes());
        expected.extend_from_slice(&6u32.to_le_bytes());
        expected.extend_from_slice(b"preset");
        expected.extend_from_slice(&8u32.to_le_bytes());
        expected.extend_from_slice(b"Square 1");
        for v in [0.0f32, 0.10, 0.25, 0.25, 0.5, 2.0] {
            expected.extend_from_slice(&v.to_le_bytes());
        }

        assert_eq!(data, expected);
    }

    #[test]
    fn preset_decodes_exact_values() {
        let preset = square1();
        let data = encode_preset("dsynth", &preset);
        let record = decode_preset("dsynth", &data, 6).unwrap();
        assert_eq!(record, PresetRecord::from(&preset));
    }

    #[test]
    fn bank_with_fewer_presets_is_accepted() {
        let bank = Bank::new(vec![square1(), square1()]);
        let data = encode_bank("dsynth", &bank);
        assert_eq!(decode_bank("dsynth", &data, 6, 6).unwrap().len(), 2);
        assert_eq!(
            decode_bank("dsynth", &data, 6, 1).unwrap_err(),
            Error::BankTooLarge {
                found: 2,
                capacity: 1
            }
        );
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let mut data = encode_preset("dsynth", &square1());
        // Unit minor version sits right after "plum" 1 0 and "dsynth" 1.
        let minor_at = 8 + 8 + 10 + 4;
        data[minor_at] = 1;
        assert_eq!(
            decode_preset("dsynth", &data, 6).unwrap_err(),
            Error::UnsupportedVersion {
                what: "unit",
                major: 1,
                minor: 1
            }
        );

        let mut data = encode_preset("dsynth", &square1());
        data[8] = 2;
        assert!(matches!(
            decode_preset("dsynth", &data, 6),
            Err(Error::UnsupportedVersion { what: "format", major: 2, .. })
        ));
    }

    #[test]
    fn header_fields_are_checked() {
        let data = encode_preset("dsynth", &square1());
        assert!(matches!(
            decode_preset("demoGain", &data, 6),
            Err(Error::UnitMismatch { .. })
        ));
        assert!(matches!(
            decode_bank("dsynth", &data, 6, 6),
            Err(Error::UnexpectedKind { expected: "bank", .. })
        ));

        let mut bad = data.clone();
        bad[4] = b'P';
        assert_eq!(
            decode_preset("dsynth", &bad, 6).unwrap_err(),
            Error::BadMagic("Plum".into())
        );
    }

    #[test]
    fn truncation_and_trailing_bytes_are_rejected() {
        let data = encode_preset("dsynth", &square1());
        for len in [0, 3, 10, data.len() - 1] {
            assert!(
                matches!(decode_preset("dsynth", &data[..len], 6), Err(Error::Truncated { .. })),
                "length {len}"
            );
        }

        let mut long = data.clone();
        long.push(0);
        assert_eq!(
            decode_preset("dsynth", &long, 6).unwrap_err(),
            Error::TrailingBytes(1)
        );
    }

    #[test]
    fn oversized_string_length_is_truncation_not_allocation() {
        let mut data = header("dsynth", "preset");
        data.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode_preset("dsynth", &data, 6),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn non_finite_values_and_bad_utf8_are_rejected() {
        let mut data = header("dsynth", "preset");
        data.extend_from_slice(&1u32.to_le_bytes());
        data.push(b'x');
        data.extend_from_slice(&0.5f32.to_le_bytes());
        data.extend_from_slice(&f32::NAN.to_le_bytes());
        assert!(matches!(
            decode_preset("dsynth", &data, 2),
            Err(Error::NonFiniteValue { index: 1, .. })
        ));

        let mut data = header("dsynth", "preset");
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&[0xFF, 0xFE]);
        assert!(matches!(
            decode_preset("dsynth", &data, 0),
            Err(Error::InvalidUtf8(_))
        ));
    }
}
