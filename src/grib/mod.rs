pub mod sections;
pub mod tables;
pub mod utils;

use std::io::{BufReader, ErrorKind, Read};
use serde::Serialize;
use crate::grib::sections::{Indicator, LocalUse, Section, SectionHeader};
use crate::grib::sections::sect1::Identification;
use crate::grib::sections::sect3::GridDefinition;
use crate::grib::sections::sect4::ProductDefinition;
use crate::grib::sections::sect5::DataRepresentationDefinition;
use crate::grib::sections::sect6::BitMap;
use crate::grib::sections::sect7;
use crate::grib::utils::Buffer;

pub(crate) const SECT0_IS_MAGIC: &[u8] = b"GRIB";
const SECT0_IS_MAGIC_SIZE: usize = SECT0_IS_MAGIC.len();
pub(crate) const SECT0_IS_SIZE: usize = 16;
pub(crate) const SECT_HEADER_SIZE: usize = 5;
/// `7777` read as a big-endian section length.
pub(crate) const SECT8_ES_SENTINEL: u32 = u32::from_be_bytes(*b"7777");
const SECT8_ES_SIZE: usize = 4;
pub const SUPPORTED_EDITION: u8 = 2;

pub type Result<T, E = GribError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum GribError {
    #[error("StdError({0})")]
    StdError(#[from] std::io::Error),

    #[error("FormatError({0})")]
    FormatError(#[from] FormatError),

    #[error("DecodeError({0})")]
    DecodeError(#[from] DecodeError),
}

impl GribError {
    /// Whether the input stream can no longer be trusted to sit on a message
    /// boundary. Anything else only loses the current message.
    pub fn is_fatal_to_file(&self) -> bool {
        match self {
            GribError::StdError(_) => true,
            GribError::FormatError(e) => matches!(
                e,
                FormatError::NotGRIB()
                    | FormatError::UnsupportedEdition(_)
                    | FormatError::TruncatedMessage { .. }
                    | FormatError::InvalidMessageLength(_)
            ),
            GribError::DecodeError(_) => false,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("NotGRIB")]
    NotGRIB(),

    #[error("UnsupportedEdition({0})")]
    UnsupportedEdition(u8),

    #[error("TruncatedMessage(expected {expected} octets, read {read})")]
    TruncatedMessage { expected: u64, read: u64 },

    #[error("InvalidMessageLength({0})")]
    InvalidMessageLength(u64),

    #[error("UnknownSection({0})")]
    UnknownSection(u8),

    #[error("InvalidSectionLength(section {section}: {length})")]
    InvalidSectionLength { section: u8, length: u32 },

    #[error("SectionLengthMismatch(section {section}: declared {declared} octets, consumed {consumed})")]
    SectionLengthMismatch { section: u8, declared: usize, consumed: usize },

    #[error("MissingSection({0})")]
    MissingSection(u8),

    #[error("MissingEndSection")]
    MissingEndSection(),

    #[error("InvalidReferenceTime")]
    InvalidReferenceTime(),

    #[error("UnsupportedProductTemplate({0})")]
    UnsupportedProductTemplate(u16),
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("UnexpectedEnd")]
    UnexpectedEnd,

    #[error("InconsistentGroupLength(expected {expected}, actual {actual})")]
    InconsistentGroupLength { expected: usize, actual: usize },

    #[error("UnsupportedTemplate({0})")]
    UnsupportedTemplate(u16),

    #[error("FieldLengthMismatch(expected {expected}, actual {actual})")]
    FieldLengthMismatch { expected: usize, actual: usize },

    #[error("CorruptData({0})")]
    CorruptData(String),
}

/// One decoded GRIB2 message, owned by the worker that decoded it.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    #[serde(rename = "section0")]
    pub indicator: Indicator,
    #[serde(rename = "section1")]
    pub identification: Identification,
    #[serde(rename = "section2")]
    pub local_use: Option<LocalUse>,
    #[serde(rename = "section3")]
    pub grid_definition: GridDefinition,
    #[serde(rename = "section4")]
    pub product_definition: ProductDefinition,
    #[serde(rename = "section5")]
    pub data_representation_definition: DataRepresentationDefinition,
    #[serde(rename = "section6")]
    pub bitmap: Option<BitMap>,
    #[serde(rename = "section7")]
    pub data: Vec<f64>,
}

impl Message {
    /// Walks the sections of one message body (everything after Section 0)
    /// until the `7777` terminator.
    pub fn assemble(indicator: Indicator, body: &[u8]) -> Result<Message> {
        let mut identification = None;
        let mut local_use = None;
        let mut grid_definition = None;
        let mut product_definition = None;
        let mut data_representation_definition: Option<DataRepresentationDefinition> = None;
        let mut bitmap = None;
        let mut data = None;

        let mut pos = 0;
        loop {
            let header = match read_header(&body[pos..])? {
                Some(header) => header,
                None => break,
            };
            let content_length = header.content_length()?;
            let start = pos + SECT_HEADER_SIZE;
            let available = body.len() - start;
            if content_length > available {
                return Err(FormatError::SectionLengthMismatch {
                    section: header.number,
                    declared: content_length,
                    consumed: available,
                }.into());
            }
            let content = &body[start..start + content_length];

            debug!("Read section {} : {}(-{} : {})", header.number, header.byte_length, SECT_HEADER_SIZE, content_length);

            if header.number == 7 {
                check_point_count(grid_definition.as_ref(), data_representation_definition.as_ref(), bitmap.as_ref())?;
            }

            match read_section(&header, content, data_representation_definition.as_ref())? {
                Section::Section1(section) => identification = Some(section),
                Section::Section2(section) => local_use = Some(section),
                Section::Section3(section) => grid_definition = Some(section),
                Section::Section4(section) => product_definition = Some(section),
                Section::Section5(section) => data_representation_definition = Some(section),
                Section::Section6(section) => bitmap = Some(section),
                Section::Section7(section) => data = Some(section),
                Section::Section8 => break,
            }

            pos = start + content_length;
        }

        Ok(Message {
            indicator,
            identification: identification.ok_or(FormatError::MissingSection(1))?,
            local_use,
            grid_definition: grid_definition.ok_or(FormatError::MissingSection(3))?,
            product_definition: product_definition.ok_or(FormatError::MissingSection(4))?,
            data_representation_definition: data_representation_definition.ok_or(FormatError::MissingSection(5))?,
            bitmap,
            data: data.ok_or(FormatError::MissingSection(7))?,
        })
    }
}

/// Section 5 may not describe more points than the grid holds, nor fewer
/// unless a bitmap masks some of them out.
fn check_point_count(grid: Option<&GridDefinition>, data_repr_def: Option<&DataRepresentationDefinition>, bitmap: Option<&BitMap>) -> Result<()> {
    let grid = grid.ok_or(FormatError::MissingSection(3))?;
    let data_repr_def = data_repr_def.ok_or(FormatError::MissingSection(5))?;

    let expected = grid.num_points as usize;
    let actual = data_repr_def.num_points as usize;
    let masked = bitmap.map_or(false, BitMap::is_present);

    if actual > expected || (!masked && actual != expected) {
        return Err(DecodeError::FieldLengthMismatch { expected, actual }.into());
    }

    Ok(())
}

/// `None` once the end-section sentinel is reached.
fn read_header(buf: &[u8]) -> Result<Option<SectionHeader>> {
    if buf.len() < SECT8_ES_SIZE {
        return Err(FormatError::MissingEndSection().into());
    }

    let byte_length = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if byte_length == SECT8_ES_SENTINEL {
        return Ok(None);
    }

    let number = *buf.get(SECT8_ES_SIZE).ok_or(FormatError::MissingEndSection())?;

    Ok(Some(SectionHeader {
        byte_length,
        number,
    }))
}

fn read_section(header: &SectionHeader, content: &[u8], data_repr_def: Option<&DataRepresentationDefinition>) -> Result<Section> {
    let mut buf = Buffer::new(content, header.number);

    let section = match header.number {
        1 => Section::Section1(Identification::parse(&mut buf)?),
        2 => Section::Section2(LocalUse {
            local_use: buf.rest().to_vec(),
        }),
        3 => Section::Section3(GridDefinition::parse(&mut buf)?),
        4 => Section::Section4(ProductDefinition::parse(&mut buf)?),
        5 => Section::Section5(DataRepresentationDefinition::parse(&mut buf)?),
        6 => Section::Section6(BitMap::parse(&mut buf)?),
        7 => {
            let data_repr_def = data_repr_def.ok_or(FormatError::MissingSection(5))?;
            Section::Section7(sect7::decode(data_repr_def, buf.rest())?)
        }
        8 => return Ok(Section::Section8),
        n => return Err(FormatError::UnknownSection(n).into()),
    };

    buf.finish()?;

    Ok(section)
}

/// Streaming container decoder: finds each `GRIB` marker, validates Section 0
/// and hands the message body to [`Message::assemble`].
pub struct GribReader<R: Read> {
    reader: BufReader<R>,
    found: bool,
    done: bool,
}

impl<R: Read> GribReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            found: false,
            done: false,
        }
    }

    /// Consumes bytes up to and including the next `GRIB` marker. `false` on a
    /// clean end of input, [`FormatError::NotGRIB`] when the input had bytes
    /// but no message at all.
    fn scan_for_magic(&mut self) -> Result<bool> {
        let mut window = [0u8; SECT0_IS_MAGIC_SIZE];
        let mut filled = 0;
        let mut byte = [0u8; 1];
        let mut skipped = 0;

        loop {
            match self.reader.read_exact(&mut byte) {
                Ok(()) => skipped += 1,
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    if !self.found && skipped > 0 {
                        return Err(FormatError::NotGRIB().into());
                    }
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            }

            if filled < SECT0_IS_MAGIC_SIZE {
                window[filled] = byte[0];
                filled += 1;
            } else {
                window.rotate_left(1);
                window[SECT0_IS_MAGIC_SIZE - 1] = byte[0];
            }

            if filled == SECT0_IS_MAGIC_SIZE && window[..] == SECT0_IS_MAGIC[..] {
                self.found = true;
                return Ok(true);
            }
        }
    }

    /// Reads the rest of Section 0 after the marker.
    fn read_sect0(&mut self) -> Result<Indicator> {
        let mut buf = [0u8; SECT0_IS_SIZE - SECT0_IS_MAGIC_SIZE];

        let read = self.read_fully(&mut buf)?;
        if read < buf.len() {
            return Err(FormatError::TruncatedMessage {
                expected: SECT0_IS_SIZE as u64,
                read: (SECT0_IS_MAGIC_SIZE + read) as u64,
            }.into());
        }

        let mut buf = Buffer::new(&buf, 0);
        let indicator = Indicator {
            reserved: buf.read()?,
            discipline: buf.read()?,
            edition: buf.read()?,
            total_length: buf.read()?,
        };

        if indicator.edition != SUPPORTED_EDITION {
            return Err(FormatError::UnsupportedEdition(indicator.edition).into());
        }
        if indicator.total_length < (SECT0_IS_SIZE + SECT8_ES_SIZE) as u64 {
            return Err(FormatError::InvalidMessageLength(indicator.total_length).into());
        }

        debug!("Read section {} : {}", 0, SECT0_IS_SIZE);

        Ok(indicator)
    }

    fn read_fully(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut read = 0;
        while read < buf.len() {
            match self.reader.read(&mut buf[read..]) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(read)
    }

    fn read_message(&mut self) -> Result<Option<Message>> {
        if !self.scan_for_magic()? {
            return Ok(None);
        }

        let indicator = self.read_sect0()?;

        let body_length = usize::try_from(indicator.total_length - SECT0_IS_SIZE as u64)
            .map_err(|_| FormatError::InvalidMessageLength(indicator.total_length))?;
        let mut body = vec![0u8; body_length];
        let read = self.read_fully(&mut body)?;
        if read < body_length {
            return Err(FormatError::TruncatedMessage {
                expected: indicator.total_length,
                read: (SECT0_IS_SIZE + read) as u64,
            }.into());
        }

        Message::assemble(indicator, &body).map(Some)
    }
}

impl<R: Read> Iterator for GribReader<R> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_message() {
            Ok(Some(message)) => Some(Ok(message)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                if e.is_fatal_to_file() {
                    self.done = true;
                }
                Some(Err(e))
            }
        }
    }
}

/// Decodes every message in `reader`, failing on the first error.
pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Message>> {
    GribReader::new(reader).collect()
}

#[cfg(test)]
pub(crate) mod test_utils;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grib::test_utils::*;

    #[test]
    fn decodes_single_message() {
        let bytes = MessageFixture::simple(&[1, 2, 3, 4]).encode();

        let messages = from_reader(&bytes[..]).unwrap();

        assert_eq!(messages.len(), 1);
        let message = &messages[0];
        assert_eq!(message.indicator.edition, 2);
        assert_eq!(message.indicator.total_length, bytes.len() as u64);
        assert_eq!(message.data, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(message.grid_definition.num_points, 4);
        assert!(message.bitmap.is_some());
    }

    #[test]
    fn skips_leading_garbage_and_finds_every_message() {
        let mut bytes = b"GRGRIheaderGR".to_vec();
        bytes.extend(MessageFixture::simple(&[1, 2]).encode());
        bytes.extend(b"\0\0junk");
        bytes.extend(MessageFixture::simple(&[7, 8, 9]).encode());
        bytes.extend(b"trailer");

        let messages = from_reader(&bytes[..]).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].data, vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn empty_input_is_not_an_error() {
        assert!(from_reader(&b""[..]).unwrap().is_empty());
    }

    #[test]
    fn input_without_any_message_is_not_grib() {
        let mut reader = GribReader::new(&b"no marker here"[..]);

        let err = reader.next().unwrap().unwrap_err();

        assert!(matches!(err, GribError::FormatError(FormatError::NotGRIB())));
        assert!(err.is_fatal_to_file());
        assert!(reader.next().is_none());
    }

    #[test]
    fn trailing_bytes_after_a_message_are_ignored() {
        let mut bytes = MessageFixture::simple(&[1]).encode();
        bytes.extend(b"padding");

        assert_eq!(from_reader(&bytes[..]).unwrap().len(), 1);
    }

    #[test]
    fn rejects_other_editions() {
        let mut bytes = MessageFixture::simple(&[1]).encode();
        bytes[7] = 1;

        let mut reader = GribReader::new(&bytes[..]);
        let err = reader.next().unwrap().unwrap_err();

        assert!(matches!(err, GribError::FormatError(FormatError::UnsupportedEdition(1))));
        assert!(err.is_fatal_to_file());
        assert!(reader.next().is_none());
    }

    #[test]
    fn short_message_is_truncated() {
        let bytes = MessageFixture::simple(&[1, 2, 3]).encode();
        let cut = &bytes[..bytes.len() - 10];

        let mut reader = GribReader::new(cut);
        let err = reader.next().unwrap().unwrap_err();

        assert!(matches!(err, GribError::FormatError(FormatError::TruncatedMessage { .. })));
        assert!(reader.next().is_none());
    }

    #[test]
    fn unknown_section_loses_only_that_message() {
        let mut fixture = MessageFixture::simple(&[1, 2]);
        fixture.extra_sections.push((9, vec![0, 0, 0]));
        let mut bytes = fixture.encode();
        bytes.extend(MessageFixture::simple(&[5]).encode());

        let results: Vec<_> = GribReader::new(&bytes[..]).collect();

        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0],
            Err(GribError::FormatError(FormatError::UnknownSection(9)))
        ));
        assert_eq!(results[1].as_ref().unwrap().data, vec![5.0]);
    }

    #[test]
    fn section_length_must_match_consumed_bytes() {
        // Section 1 declares one octet more than its layout consumes
        let mut fixture = MessageFixture::simple(&[1, 2]);
        fixture.section1_padding = 1;
        let bytes = fixture.encode();
        let mut reader = GribReader::new(&bytes[..]);

        let err = reader.next().unwrap().unwrap_err();

        assert!(matches!(
            err,
            GribError::FormatError(FormatError::SectionLengthMismatch { section: 1, declared: 17, consumed: 16 })
        ));
    }

    #[test]
    fn section_may_not_overrun_its_message() {
        let indicator = Indicator {
            reserved: 0,
            discipline: 0,
            edition: 2,
            total_length: 0,
        };
        // declares 50 octets but only 10 follow, then more input
        let mut body = vec![0, 0, 0, 50, 1];
        body.extend([0u8; 10]);

        let err = Message::assemble(indicator, &body).unwrap_err();

        assert!(matches!(
            err,
            GribError::FormatError(FormatError::SectionLengthMismatch { section: 1, declared: 45, consumed: 10 })
        ));
    }

    #[test]
    fn missing_terminator_is_rejected() {
        let indicator = Indicator {
            reserved: 0,
            discipline: 0,
            edition: 2,
            total_length: 0,
        };

        let err = Message::assemble(indicator, &[0, 0]).unwrap_err();

        assert!(matches!(err, GribError::FormatError(FormatError::MissingEndSection())));
    }

    #[test]
    fn unsupported_data_template_fails_the_message() {
        let mut fixture = MessageFixture::simple(&[1, 2]);
        fixture.data_template = Some((4, vec![0; 10]));
        let mut bytes = fixture.encode();
        bytes.extend(MessageFixture::simple(&[3]).encode());

        let results: Vec<_> = GribReader::new(&bytes[..]).collect();

        assert!(matches!(
            results[0],
            Err(GribError::DecodeError(DecodeError::UnsupportedTemplate(4)))
        ));
        assert!(!results[0].as_ref().unwrap_err().is_fatal_to_file());
        assert_eq!(results[1].as_ref().unwrap().data, vec![3.0]);
    }

    #[test]
    fn data_points_beyond_the_grid_are_rejected() {
        // constant field claiming four billion points on a one-point grid
        let mut fixture = MessageFixture::simple(&[0]);
        fixture.data_template = Some((0, simple_template(0.0, 0, 0, 0)));
        fixture.data_points = Some(u32::MAX);
        let mut bytes = fixture.encode();
        bytes.extend(MessageFixture::simple(&[3]).encode());

        let results: Vec<_> = GribReader::new(&bytes[..]).collect();

        assert!(matches!(
            results[0],
            Err(GribError::DecodeError(DecodeError::FieldLengthMismatch { expected: 1, actual: 4_294_967_295 }))
        ));
        assert_eq!(results[1].as_ref().unwrap().data, vec![3.0]);
    }

    #[test]
    fn fewer_data_points_need_a_bitmap() {
        let mut fixture = MessageFixture::simple(&[1, 2]);
        fixture.data_points = Some(1);

        let err = from_reader(&fixture.encode()[..]).unwrap_err();
        assert!(matches!(err, GribError::DecodeError(DecodeError::FieldLengthMismatch { expected: 2, actual: 1 })));

        let message = from_reader(&MessageFixture::simple(&[1, 2]).encode()[..]).unwrap().remove(0);
        let data_repr_def = DataRepresentationDefinition {
            num_points: 1,
            ..message.data_representation_definition
        };
        let bitmap = BitMap { bitmap_indicator: 0, bitmap: vec![0b1000_0000] };
        assert!(check_point_count(Some(&message.grid_definition), Some(&data_repr_def), Some(&bitmap)).is_ok());
        assert!(check_point_count(Some(&message.grid_definition), Some(&data_repr_def), message.bitmap.as_ref()).is_err());
    }
}
