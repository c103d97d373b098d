//! QueryFont and ListFonts reply layouts.

use std::fmt;

use bytes::{Buf, BufMut, BytesMut};

use crate::error::ProtocolError;
use crate::{pad, MESSAGE_LEN};

pub const CHAR_INFO_LEN: usize = 12;
pub const FONT_PROP_LEN: usize = 8;
/// Reply header plus the fixed QueryFont fields that precede the property list.
pub const QUERY_FONT_FIXED_LEN: usize = 60;

const REPLY_TYPE: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharInfo {
    pub left_side_bearing: i16,
    pub right_side_bearing: i16,
    pub character_width: i16,
    pub ascent: i16,
    pub descent: i16,
    pub attributes: u16,
}

impl CharInfo {
    fn read(buf: &mut &[u8]) -> Self {
        Self {
            left_side_bearing: buf.get_i16_le(),
            right_side_bearing: buf.get_i16_le(),
            character_width: buf.get_i16_le(),
            ascent: buf.get_i16_le(),
            descent: buf.get_i16_le(),
            attributes: buf.get_u16_le(),
        }
    }

    fn write(&self, buf: &mut BytesMut) {
        buf.put_i16_le(self.left_side_bearing);
        buf.put_i16_le(self.right_side_bearing);
        buf.put_i16_le(self.character_width);
        buf.put_i16_le(self.ascent);
        buf.put_i16_le(self.descent);
        buf.put_u16_le(self.attributes);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontProp {
    pub name: u32,
    pub value: u32,
}

/// Where a metric check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricLocation {
    Font,
    MinBounds,
    MaxBounds,
    CharInfo(usize),
}

/// A QueryFont reply that parsed but breaks one of the font invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontIssue {
    CharInfoCount {
        declared: u32,
        expected: u32,
    },
    NonPositiveMetric {
        location: MetricLocation,
        ascent: i16,
        descent: i16,
    },
}

impl fmt::Display for FontIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontIssue::CharInfoCount { declared, expected } => write!(
                f,
                "char info count {} does not match character range size {}",
                declared, expected
            ),
            FontIssue::NonPositiveMetric {
                location,
                ascent,
                descent,
            } => write!(
                f,
                "{:?} has non-positive metrics: ascent={} descent={}",
                location, ascent, descent
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FontQueryResult {
    pub sequence: u16,
    pub min_bounds: CharInfo,
    pub max_bounds: CharInfo,
    pub min_char: u16,
    pub max_char: u16,
    pub default_char: u16,
    pub property_count: u16,
    pub draw_direction: u8,
    pub min_byte1: u8,
    pub max_byte1: u8,
    pub all_chars_exist: bool,
    pub font_ascent: i16,
    pub font_descent: i16,
    pub char_info_count: u32,
    pub properties: Vec<FontProp>,
    pub char_infos: Vec<CharInfo>,
}

impl FontQueryResult {
    pub fn parse(reply: &[u8]) -> Result<Self, ProtocolError> {
        if reply.len() < QUERY_FONT_FIXED_LEN {
            return Err(ProtocolError::Truncated {
                what: "QueryFont reply",
                needed: QUERY_FONT_FIXED_LEN,
                got: reply.len(),
            });
        }

        let mut buf = &reply[2..];
        let sequence = buf.get_u16_le();
        buf.advance(4);
        let min_bounds = CharInfo::read(&mut buf);
        buf.advance(4);
        let max_bounds = CharInfo::read(&mut buf);
        buf.advance(4);
        let min_char = buf.get_u16_le();
        let max_char = buf.get_u16_le();
        let default_char = buf.get_u16_le();
        let property_count = buf.get_u16_le();
        let draw_direction = buf.get_u8();
        let min_byte1 = buf.get_u8();
        let max_byte1 = buf.get_u8();
        let all_chars_exist = buf.get_u8() != 0;
        let font_ascent = buf.get_i16_le();
        let font_descent = buf.get_i16_le();
        let char_info_count = buf.get_u32_le();

        let needed = QUERY_FONT_FIXED_LEN
            + property_count as usize * FONT_PROP_LEN
            + (char_info_count as usize).saturating_mul(CHAR_INFO_LEN);
        if reply.len() < needed {
            return Err(ProtocolError::Truncated {
                what: "QueryFont reply",
                needed,
                got: reply.len(),
            });
        }

        let properties = (0..property_count)
            .map(|_| FontProp {
                name: buf.get_u32_le(),
                value: buf.get_u32_le(),
            })
            .collect();
        let char_infos = (0..char_info_count)
            .map(|_| CharInfo::read(&mut buf))
            .collect();

        Ok(Self {
            sequence,
            min_bounds,
            max_bounds,
            min_char,
            max_char,
            default_char,
            property_count,
            draw_direction,
            min_byte1,
            max_byte1,
            all_chars_exist,
            font_ascent,
            font_descent,
            char_info_count,
            properties,
            char_infos,
        })
    }

    /// Full reply buffer with the declared counts written as-is, so callers can
    /// build inconsistent replies on purpose.
    pub fn encode(&self) -> BytesMut {
        let body = self.properties.len() * FONT_PROP_LEN + self.char_infos.len() * CHAR_INFO_LEN;
        let total = QUERY_FONT_FIXED_LEN + body;
        let mut buf = BytesMut::with_capacity(total);
        buf.put_u8(REPLY_TYPE);
        buf.put_u8(0);
        buf.put_u16_le(self.sequence);
        buf.put_u32_le(((total - MESSAGE_LEN) / 4) as u32);
        self.min_bounds.write(&mut buf);
        buf.put_bytes(0, 4);
        self.max_bounds.write(&mut buf);
        buf.put_bytes(0, 4);
        buf.put_u16_le(self.min_char);
        buf.put_u16_le(self.max_char);
        buf.put_u16_le(self.default_char);
        buf.put_u16_le(self.property_count);
        buf.put_u8(self.draw_direction);
        buf.put_u8(self.min_byte1);
        buf.put_u8(self.max_byte1);
        buf.put_u8(self.all_chars_exist as u8);
        buf.put_i16_le(self.font_ascent);
        buf.put_i16_le(self.font_descent);
        buf.put_u32_le(self.char_info_count);
        for prop in &self.properties {
            buf.put_u32_le(prop.name);
            buf.put_u32_le(prop.value);
        }
        for info in &self.char_infos {
            info.write(&mut buf);
        }
        buf
    }

    pub fn expected_char_info_count(&self) -> u32 {
        if self.max_char < self.min_char {
            return 0;
        }
        u32::from(self.max_char - self.min_char) + 1
    }

    /// Every invariant violation, in a stable order. An empty result means the reply is sound.
    pub fn validate(&self) -> Vec<FontIssue> {
        let mut issues = Vec::new();

        let expected = self.expected_char_info_count();
        if self.char_info_count != expected {
            issues.push(FontIssue::CharInfoCount {
                declared: self.char_info_count,
                expected,
            });
        }

        let mut check = |location, ascent: i16, descent: i16| {
            if ascent <= 0 || descent <= 0 {
                issues.push(FontIssue::NonPositiveMetric {
                    location,
                    ascent,
                    descent,
                });
            }
        };
        check(MetricLocation::Font, self.font_ascent, self.font_descent);
        check(
            MetricLocation::MinBounds,
            self.min_bounds.ascent,
            self.min_bounds.descent,
        );
        check(
            MetricLocation::MaxBounds,
            self.max_bounds.ascent,
            self.max_bounds.descent,
        );
        for (idx, info) in self.char_infos.iter().enumerate() {
            check(MetricLocation::CharInfo(idx), info.ascent, info.descent);
        }

        issues
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListFontsReply {
    pub sequence: u16,
    pub declared_count: u16,
    pub names: Vec<String>,
}

impl ListFontsReply {
    pub fn new(sequence: u16, names: Vec<String>) -> Self {
        Self {
            sequence,
            declared_count: names.len() as u16,
            names,
        }
    }

    /// Reads names until the declared count is reached or the buffer runs out.
    pub fn parse(reply: &[u8]) -> Result<Self, ProtocolError> {
        if reply.len() < MESSAGE_LEN {
            return Err(ProtocolError::Truncated {
                what: "ListFonts reply",
                needed: MESSAGE_LEN,
                got: reply.len(),
            });
        }

        let sequence = u16::from_le_bytes([reply[2], reply[3]]);
        let declared_count = u16::from_le_bytes([reply[8], reply[9]]);

        let mut names = Vec::with_capacity(declared_count as usize);
        let mut offset = MESSAGE_LEN;
        while names.len() < declared_count as usize && offset < reply.len() {
            let rest = &reply[offset..];
            if rest.len() < 4 && rest.iter().all(|&b| b == 0) {
                // trailing alignment, not a run of empty names
                break;
            }
            let len = reply[offset] as usize;
            offset += 1;
            let end = offset + len;
            if end > reply.len() {
                return Err(ProtocolError::Truncated {
                    what: "font name",
                    needed: end,
                    got: reply.len(),
                });
            }
            names.push(String::from_utf8_lossy(&reply[offset..end]).into_owned());
            offset = end;
        }

        Ok(Self {
            sequence,
            declared_count,
            names,
        })
    }

    pub fn encode(&self) -> BytesMut {
        let body: usize = self.names.iter().map(|n| 1 + n.len().min(255)).sum();
        let padding = pad(body);
        let mut buf = BytesMut::with_capacity(MESSAGE_LEN + body + padding);
        buf.put_u8(REPLY_TYPE);
        buf.put_u8(0);
        buf.put_u16_le(self.sequence);
        buf.put_u32_le(((body + padding) / 4) as u32);
        buf.put_u16_le(self.declared_count);
        buf.put_bytes(0, 22);
        for name in &self.names {
            let bytes = &name.as_bytes()[..name.len().min(255)];
            buf.put_u8(bytes.len() as u8);
            buf.put_slice(bytes);
        }
        buf.put_bytes(0, padding);
        buf
    }
}
