use serde::Serialize;
use crate::grib::FormatError;
use crate::grib::utils::Buffer;

/// Indicator value meaning no bitmap applies to this message.
pub const NO_BITMAP: u8 = 255;

/// Section 6. The bitmap octets are carried through as-is; values are never
/// masked with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BitMap {
    /// Bit-map indicator (see Code Table 6.0)
    pub bitmap_indicator: u8,
    pub bitmap: Vec<u8>,
}

impl BitMap {
    pub(crate) fn parse(buf: &mut Buffer) -> Result<Self, FormatError> {
        let bitmap_indicator = buf.read()?;
        // Octets after an indicator other than 0 are left for the length check
        let bitmap = if bitmap_indicator == 0 {
            buf.rest().to_vec()
        } else {
            Vec::new()
        };

        Ok(BitMap {
            bitmap_indicator,
            bitmap,
        })
    }

    pub fn is_present(&self) -> bool {
        self.bitmap_indicator == 0
    }
}
