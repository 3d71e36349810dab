use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use crate::grib::FormatError;
use crate::grib::utils::Buffer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identification {
    /// Identification of originating/generating centre (see Common Code Table C-1)
    pub centre_id: u16,
    /// Identification of originating/generating sub-centre (allocated by originating/ generating centre)
    pub subcentre_id: u16,
    /// GRIB Master Tables Version Number (see Code Table 1.0)
    pub master_table_version: u8,
    /// GRIB Local Tables Version Number (see Code Table 1.1)
    pub local_table_version: u8,
    /// Significance of Reference Time (see Code Table 1.2)
    pub ref_time_significance: u8,
    /// Reference time of data
    pub ref_time: DateTime<Utc>,
    /// Production status of processed data in this GRIB message
    /// (see Code Table 1.3)
    pub prod_status: u8,
    /// Type of processed data in this GRIB message (see Code Table 1.4)
    pub data_type: u8,
}

impl Identification {
    /// Octets 6-21.
    pub(crate) fn parse(buf: &mut Buffer) -> Result<Self, FormatError> {
        let centre_id: u16 = buf.read()?;
        let subcentre_id: u16 = buf.read()?;
        let master_table_version: u8 = buf.read()?;
        let local_table_version: u8 = buf.read()?;
        let ref_time_significance: u8 = buf.read()?;

        let year: u16 = buf.read()?;
        let month: u8 = buf.read()?;
        let day: u8 = buf.read()?;
        let hour: u8 = buf.read()?;
        let minute: u8 = buf.read()?;
        let second: u8 = buf.read()?;
        let ref_time = Utc
            .with_ymd_and_hms(year.into(), month.into(), day.into(), hour.into(), minute.into(), second.into())
            .single()
            .ok_or(FormatError::InvalidReferenceTime())?;

        Ok(Identification {
            centre_id,
            subcentre_id,
            master_table_version,
            local_table_version,
            ref_time_significance,
            ref_time,
            prod_status: buf.read()?,
            data_type: buf.read()?,
        })
    }
}
