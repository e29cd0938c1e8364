use num_bigint::BigInt;
use num_traits::{One, ToPrimitive};

use crate::error::Error;
use crate::term::Term;

/// A sequence of bits, one `0`/`1` entry per bit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bitstring {
    bits: Vec<u8>,
}

impl Bitstring {
    pub fn from_bits(bits: Vec<u8>) -> Self {
        Bitstring {
            bits: bits.into_iter().map(|b| u8::from(b != 0)).collect(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Bitstring {
            bits: bytes_to_bits(bytes),
        }
    }

    pub fn from_text(text: &str) -> Self {
        Bitstring::from_bytes(text.as_bytes())
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Whole number of bytes.
    pub fn is_binary(&self) -> bool {
        self.bits.len() % 8 == 0
    }

    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        self.is_binary()
            .then(|| self.bits.chunks(8).map(bits_to_byte).collect())
    }

    /// Decoded UTF-8 text, if this is a valid UTF-8 binary.
    pub fn to_text(&self) -> Option<String> {
        self.to_bytes().and_then(|bytes| String::from_utf8(bytes).ok())
    }

    pub fn concat(&self, other: &Bitstring) -> Bitstring {
        let mut bits = self.bits.clone();
        bits.extend_from_slice(&other.bits);
        Bitstring { bits }
    }

    /// Full bytes followed by the trailing partial byte, if any.
    pub fn split_bytes(&self) -> (Vec<u8>, Option<(u8, usize)>) {
        let full = self.bits.len() / 8 * 8;
        let bytes = self.bits[..full].chunks(8).map(bits_to_byte).collect();
        let rest = &self.bits[full..];
        let partial = (!rest.is_empty()).then(|| {
            let value = rest.iter().fold(0u8, |acc, bit| (acc << 1) | bit);
            (value, rest.len())
        });
        (bytes, partial)
    }
}

fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for byte in bytes {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1);
        }
    }
    bits
}

fn bits_to_byte(chunk: &[u8]) -> u8 {
    chunk.iter().fold(0u8, |acc, bit| (acc << 1) | bit)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    Binary,
    Bitstring,
    Float,
    Integer,
    Utf8,
    Utf16,
    Utf32,
}

impl SegmentType {
    pub fn name(self) -> &'static str {
        match self {
            SegmentType::Binary => "binary",
            SegmentType::Bitstring => "bitstring",
            SegmentType::Float => "float",
            SegmentType::Integer => "integer",
            SegmentType::Utf8 => "utf8",
            SegmentType::Utf16 => "utf16",
            SegmentType::Utf32 => "utf32",
        }
    }

    fn default_unit(self) -> u64 {
        match self {
            SegmentType::Binary => 8,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
    Native,
}

impl Endianness {
    fn is_little(self) -> bool {
        match self {
            Endianness::Big => false,
            Endianness::Little => true,
            Endianness::Native => cfg!(target_endian = "little"),
        }
    }
}

/// One `value::type-size(n)-unit(u)-signed-little` segment of a bitstring
/// expression or pattern.
#[derive(Debug, Clone)]
pub struct Segment {
    pub value: Term,
    pub kind: SegmentType,
    pub size: Option<Term>,
    pub unit: Option<u64>,
    pub signed: bool,
    pub endianness: Endianness,
}

impl Segment {
    pub fn new(value: Term, kind: SegmentType) -> Self {
        Segment {
            value,
            kind,
            size: None,
            unit: None,
            signed: false,
            endianness: Endianness::Big,
        }
    }

    pub fn integer(value: impl Into<Term>) -> Self {
        Segment::new(value.into(), SegmentType::Integer)
    }

    pub fn float(value: impl Into<Term>) -> Self {
        Segment::new(value.into(), SegmentType::Float)
    }

    pub fn bitstring(value: Term) -> Self {
        Segment::new(value, SegmentType::Bitstring)
    }

    pub fn binary(value: Term) -> Self {
        Segment::new(value, SegmentType::Binary)
    }

    pub fn utf8(value: impl Into<Term>) -> Self {
        Segment::new(value.into(), SegmentType::Utf8)
    }

    pub fn size(mut self, size: i64) -> Self {
        self.size = Some(Term::integer(size));
        self
    }

    pub fn size_term(mut self, size: Term) -> Self {
        self.size = Some(size);
        self
    }

    pub fn unit(mut self, unit: u64) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    pub fn endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    pub fn little(self) -> Self {
        self.endianness(Endianness::Little)
    }

    /// Explicit `size * unit`, if a size was given.
    pub fn explicit_width(&self) -> Result<Option<u64>, Error> {
        let Some((size, unit)) = self.size_and_unit()? else {
            return Ok(None);
        };
        size.checked_mul(unit).map(Some).ok_or_else(|| {
            Error::argument_error(format!(
                "construction of binary failed: segment size {size} with unit {unit} is too large"
            ))
        })
    }

    /// Whether the explicit width, if any, fits in `available` bits. A width
    /// that overflows never fits.
    pub fn fits_in(&self, available: usize) -> Result<bool, Error> {
        Ok(match self.size_and_unit()? {
            Some((size, unit)) => size
                .checked_mul(unit)
                .is_some_and(|width| width <= available as u64),
            None => true,
        })
    }

    fn size_and_unit(&self) -> Result<Option<(u64, u64)>, Error> {
        let Some(size) = &self.size else {
            return Ok(None);
        };
        let unit = self.unit.unwrap_or(self.kind.default_unit());
        match size {
            Term::Integer(n) => match n.to_u64() {
                Some(n) => Ok(Some((n, unit))),
                None => Err(Error::argument_error(format!(
                    "construction of binary failed: segment size must be a non-negative integer, got: {size}"
                ))),
            },
            Term::VariablePattern(_) => Err(Error::interpreter(
                "variable-size bitstring segments are not supported",
            )),
            other => Err(Error::argument_error(format!(
                "construction of binary failed: segment size must be a non-negative integer, got: {other}"
            ))),
        }
    }
}

fn construction_error(index: usize, segment: &Segment, expected: &str) -> Error {
    Error::argument_error(format!(
        "construction of binary failed: segment {index} of type '{}': expected {expected} but got: {}",
        segment.kind.name(),
        segment.value
    ))
}

/// Concatenate the bits of every literal segment.
pub fn encode_segments(segments: &[Segment]) -> Result<Bitstring, Error> {
    let mut bits = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        bits.extend(encode_segment(segment, i + 1)?);
    }
    Ok(Bitstring { bits })
}

/// Bits of a single literal segment; `index` is 1-based for diagnostics.
pub fn encode_segment(segment: &Segment, index: usize) -> Result<Vec<u8>, Error> {
    match segment.kind {
        SegmentType::Integer => {
            let Term::Integer(value) = &segment.value else {
                return Err(construction_error(index, segment, "an integer"));
            };
            let width = segment.explicit_width()?.unwrap_or(8);
            let bits = integer_bits(value, width);
            Ok(apply_endianness(bits, segment.endianness))
        }
        SegmentType::Float => {
            let value = match &segment.value {
                Term::Float(f) => *f,
                Term::Integer(i) => i.to_f64().unwrap_or(f64::INFINITY),
                _ => return Err(construction_error(index, segment, "a float or an integer")),
            };
            let width = segment.explicit_width()?.unwrap_or(64);
            let bits = match width {
                64 => bytes_to_bits(&value.to_bits().to_be_bytes()),
                32 => bytes_to_bits(&(value as f32).to_bits().to_be_bytes()),
                16 => {
                    return Err(Error::interpreter(
                        "16-bit float bitstring segments are not yet implemented in Hologram",
                    ))
                }
                other => {
                    return Err(Error::argument_error(format!(
                        "construction of binary failed: segment {index} of type 'float': expected one of the supported sizes 16, 32, or 64 but got: {other}"
                    )))
                }
            };
            Ok(apply_endianness(bits, segment.endianness))
        }
        SegmentType::Bitstring | SegmentType::Binary => {
            let expected = if segment.kind == SegmentType::Binary {
                "a binary"
            } else {
                "a bitstring"
            };
            let Term::Bitstring(value) = &segment.value else {
                return Err(construction_error(index, segment, expected));
            };
            match segment.explicit_width()? {
                Some(width) => {
                    let width = width as usize;
                    if value.len() < width {
                        return Err(construction_error(index, segment, expected));
                    }
                    Ok(value.bits()[..width].to_vec())
                }
                None if segment.kind == SegmentType::Binary && !value.is_binary() => {
                    Err(construction_error(index, segment, expected))
                }
                None => Ok(value.bits().to_vec()),
            }
        }
        SegmentType::Utf8 | SegmentType::Utf16 | SegmentType::Utf32 => {
            let expected = "a non-negative integer encodable as a code point";
            let chars: Vec<char> = match &segment.value {
                Term::Integer(i) => match i.to_u32().and_then(char::from_u32) {
                    Some(c) => vec![c],
                    None => return Err(construction_error(index, segment, expected)),
                },
                Term::Bitstring(b) => match b.to_text() {
                    Some(text) => text.chars().collect(),
                    None => return Err(construction_error(index, segment, expected)),
                },
                _ => return Err(construction_error(index, segment, expected)),
            };
            let little = segment.endianness.is_little();
            let mut bytes = Vec::new();
            for c in chars {
                encode_char(c, segment.kind, little, &mut bytes);
            }
            Ok(bytes_to_bits(&bytes))
        }
    }
}

fn encode_char(c: char, kind: SegmentType, little: bool, out: &mut Vec<u8>) {
    match kind {
        SegmentType::Utf16 => {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                let bytes = if little {
                    unit.to_le_bytes()
                } else {
                    unit.to_be_bytes()
                };
                out.extend_from_slice(&bytes);
            }
        }
        SegmentType::Utf32 => {
            let code = c as u32;
            let bytes = if little {
                code.to_le_bytes()
            } else {
                code.to_be_bytes()
            };
            out.extend_from_slice(&bytes);
        }
        _ => {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }
}

/// Two's complement truncated to `width` bits, most significant first.
fn integer_bits(value: &BigInt, width: u64) -> Vec<u8> {
    (0..width).rev().map(|i| u8::from(value.bit(i))).collect()
}

/// Little endian reverses byte order; only whole-byte widths are reordered.
fn apply_endianness(mut bits: Vec<u8>, endianness: Endianness) -> Vec<u8> {
    if endianness.is_little() && bits.len() % 8 == 0 {
        let bytes: Vec<Vec<u8>> = bits.chunks(8).rev().map(<[u8]>::to_vec).collect();
        bits = bytes.concat();
    }
    bits
}

/// Read a variable-valued segment from the front of `bits`.
///
/// Returns the decoded term and the number of bits consumed, or `None` when
/// the input cannot satisfy the segment.
pub fn decode_segment(segment: &Segment, bits: &[u8]) -> Result<Option<(Term, usize)>, Error> {
    let width = segment.explicit_width()?;
    let decoded = match segment.kind {
        SegmentType::Integer => {
            let width = width.unwrap_or(8) as usize;
            if bits.len() < width {
                return Ok(None);
            }
            let chunk = apply_endianness(bits[..width].to_vec(), segment.endianness);
            Some((Term::integer(decode_integer(&chunk, segment.signed)), width))
        }
        SegmentType::Float => {
            let width = width.unwrap_or(64) as usize;
            if bits.len() < width {
                return Ok(None);
            }
            let chunk = apply_endianness(bits[..width].to_vec(), segment.endianness);
            decode_float(&chunk).map(|f| (Term::float(f), width))
        }
        SegmentType::Bitstring | SegmentType::Binary => {
            let width = width.map(|w| w as usize).unwrap_or(bits.len());
            if bits.len() < width
                || (segment.kind == SegmentType::Binary && width % 8 != 0)
            {
                return Ok(None);
            }
            Some((Term::bitstring(bits[..width].to_vec()), width))
        }
        SegmentType::Utf8 => decode_utf8(bits).map(|(c, n)| (Term::integer(c), n)),
        SegmentType::Utf16 => decode_utf16(bits, segment.endianness.is_little())
            .map(|(c, n)| (Term::integer(c), n)),
        SegmentType::Utf32 => {
            if bits.len() < 32 {
                return Ok(None);
            }
            let chunk = apply_endianness(bits[..32].to_vec(), segment.endianness);
            decode_integer(&chunk, false)
                .to_u32()
                .and_then(char::from_u32)
                .map(|c| (Term::integer(c as u32), 32))
        }
    };
    Ok(decoded)
}

/// Big-endian bits to an integer, two's complement when `signed`.
pub fn decode_integer(bits: &[u8], signed: bool) -> BigInt {
    let mut value = BigInt::default();
    for bit in bits {
        value = (value << 1u32) + BigInt::from(*bit);
    }
    if signed && bits.first() == Some(&1) {
        value -= BigInt::one() << bits.len();
    }
    value
}

/// 32 or 64 big-endian bits to a float; other widths do not decode.
pub fn decode_float(bits: &[u8]) -> Option<f64> {
    let bytes: Vec<u8> = bits.chunks(8).map(bits_to_byte).collect();
    match bits.len() {
        64 => {
            let raw: [u8; 8] = bytes.try_into().ok()?;
            Some(f64::from_bits(u64::from_be_bytes(raw)))
        }
        32 => {
            let raw: [u8; 4] = bytes.try_into().ok()?;
            Some(f32::from_bits(u32::from_be_bytes(raw)) as f64)
        }
        _ => None,
    }
}

fn decode_utf8(bits: &[u8]) -> Option<(u32, usize)> {
    let lead = bits_to_byte(bits.get(..8)?);
    let len = match lead {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => return None,
    };
    let bytes: Vec<u8> = bits.get(..len * 8)?.chunks(8).map(bits_to_byte).collect();
    let c = std::str::from_utf8(&bytes).ok()?.chars().next()?;
    Some((c as u32, len * 8))
}

fn decode_utf16(bits: &[u8], little: bool) -> Option<(u32, usize)> {
    let unit = |offset: usize| -> Option<u16> {
        let bytes: Vec<u8> = bits.get(offset..offset + 16)?.chunks(8).map(bits_to_byte).collect();
        let pair = [bytes[0], bytes[1]];
        Some(if little {
            u16::from_le_bytes(pair)
        } else {
            u16::from_be_bytes(pair)
        })
    };
    let first = unit(0)?;
    if (0xd800..0xdc00).contains(&first) {
        let second = unit(16)?;
        let c = char::decode_utf16([first, second]).next()?.ok()?;
        Some((c as u32, 32))
    } else {
        let c = char::decode_utf16([first]).next()?.ok()?;
        Some((c as u32, 16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_of(s: &str) -> Vec<u8> {
        s.bytes().map(|b| b - b'0').collect()
    }

    // 1. Integer segments default to 8 bits, truncating two's complement
    #[test]
    fn test_encode_integer_segments() {
        let enc = |s: Segment| encode_segments(&[s]).unwrap().bits().to_vec();
        assert_eq!(enc(Segment::integer(170)), bits_of("10101010"));
        assert_eq!(enc(Segment::integer(-22)), bits_of("11101010"));
        assert_eq!(enc(Segment::integer(4010)), bits_of("10101010"));
        assert_eq!(enc(Segment::integer(5).size(3)), bits_of("101"));
        assert_eq!(enc(Segment::integer(1).size(2).unit(2)), bits_of("0001"));
    }

    // 2. Little endian swaps bytes
    #[test]
    fn test_encode_little_endian() {
        let bits = encode_segments(&[Segment::integer(258).size(16).little()]).unwrap();
        assert_eq!(bits.to_bytes().unwrap(), vec![2, 1]);
    }

    // 3. Floats: 64 by default, 32 supported, 16 is an interpreter error
    #[test]
    fn test_encode_float_segments() {
        let f64_bits = encode_segments(&[Segment::float(1.5)]).unwrap();
        assert_eq!(f64_bits.to_bytes().unwrap(), 1.5f64.to_be_bytes().to_vec());

        let f32_bits = encode_segments(&[Segment::float(1.5).size(32)]).unwrap();
        assert_eq!(f32_bits.to_bytes().unwrap(), 1.5f32.to_be_bytes().to_vec());

        let err = encode_segments(&[Segment::float(1.5).size(16)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Interpreter error: 16-bit float bitstring segments are not yet implemented in Hologram"
        );
    }

    // 4. Wrong value kind is an ArgumentError naming the segment
    #[test]
    fn test_encode_wrong_kind() {
        let err = encode_segments(&[Segment::integer(Term::atom("abc"))]).unwrap_err();
        assert_eq!(
            err.exception_message().as_deref(),
            Some("construction of binary failed: segment 1 of type 'integer': expected an integer but got: :abc")
        );
    }

    // 5. Text segments
    #[test]
    fn test_encode_utf8() {
        let bits = encode_segments(&[Segment::utf8("全"), Segment::binary(Term::string("ab"))]).unwrap();
        assert_eq!(bits.to_text().as_deref(), Some("全ab"));
    }

    // 6. Signed and unsigned integer decoding
    #[test]
    fn test_decode_integer() {
        assert_eq!(decode_integer(&bits_of("10101010"), false), BigInt::from(170));
        assert_eq!(decode_integer(&bits_of("10101010"), true), BigInt::from(-86));
        assert_eq!(decode_integer(&bits_of("0101"), true), BigInt::from(5));
    }

    // 7. Float decoding honours width
    #[test]
    fn test_decode_float() {
        let bits = bytes_to_bits(&123.45f32.to_bits().to_be_bytes());
        assert_eq!(decode_float(&bits), Some(123.44999694824219));
        assert_eq!(decode_float(&bits_of("10101010")), None);
    }

    // 8. Variable segment decoding consumes the right width
    #[test]
    fn test_decode_segment() {
        let input = bytes_to_bits("é!".as_bytes());
        let (term, used) = decode_segment(&Segment::utf8(Term::variable_pattern("c")), &input)
            .unwrap()
            .unwrap();
        assert_eq!(term, Term::integer('é' as u32));
        assert_eq!(used, 16);

        let short = decode_segment(
            &Segment::integer(Term::variable_pattern("x")).size(16),
            &bits_of("1010"),
        )
        .unwrap();
        assert!(short.is_none());
    }

    // 9. Width overflow is an ArgumentError; fits_in never overflows
    #[test]
    fn test_segment_width_overflow() {
        let huge = Segment::binary(Term::variable_pattern("x")).size(i64::MAX);
        let err = huge.explicit_width().unwrap_err();
        assert_eq!(err.exception_struct_name().as_deref(), Some("ArgumentError"));
        assert!(!huge.fits_in(usize::MAX).unwrap());

        let small = Segment::integer(1).size(3);
        assert!(small.fits_in(3).unwrap());
        assert!(!small.fits_in(2).unwrap());
        assert!(Segment::utf8(Term::variable_pattern("c")).fits_in(0).unwrap());
    }

    // 10. Partial trailing byte
    #[test]
    fn test_split_bytes() {
        let b = Bitstring::from_bits(bits_of("0000000110"));
        assert_eq!(b.split_bytes(), (vec![1], Some((2, 2))));
    }
}
