use serde::Serialize;
use crate::grib::{FormatError, SECT_HEADER_SIZE};
use crate::grib::sections::sect1::Identification;
use crate::grib::sections::sect3::GridDefinition;
use crate::grib::sections::sect4::ProductDefinition;
use crate::grib::sections::sect5::DataRepresentationDefinition;
use crate::grib::sections::sect6::BitMap;

pub mod sect1;
pub mod sect3;
pub mod sect4;
pub mod sect5;
pub mod sect6;
pub mod sect7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicator {
    pub reserved: u16,
    /// Discipline - GRIB Master Table Number (see Code Table 0.0)
    pub discipline: u8,
    /// GRIB edition number
    pub edition: u8,
    /// Total length of GRIB message in octets (including Section 0)
    pub total_length: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Length : Length of the section in octets
    pub byte_length: u32,
    /// Number : Number of the section
    pub number: u8,
}

impl SectionHeader {
    pub fn content_length(&self) -> Result<usize, FormatError> {
        (self.byte_length as usize)
            .checked_sub(SECT_HEADER_SIZE)
            .ok_or(FormatError::InvalidSectionLength {
                section: self.number,
                length: self.byte_length,
            })
    }
}

/// Section 2, kept as raw octets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalUse {
    pub local_use: Vec<u8>,
}

pub enum Section {
    Section1(Identification),
    Section2(LocalUse),
    Section3(GridDefinition),
    Section4(ProductDefinition),
    Section5(DataRepresentationDefinition),
    Section6(BitMap),
    Section7(Vec<f64>),
    Section8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_length_excludes_header() {
        let header = SectionHeader { byte_length: 21, number: 1 };
        assert_eq!(header.content_length().unwrap(), 16);

        let header = SectionHeader { byte_length: 5, number: 2 };
        assert_eq!(header.content_length().unwrap(), 0);
    }

    #[test]
    fn content_length_cannot_be_negative() {
        let header = SectionHeader { byte_length: 3, number: 4 };
        assert!(matches!(
            header.content_length(),
            Err(FormatError::InvalidSectionLength { section: 4, length: 3 })
        ));
    }
}
