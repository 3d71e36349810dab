use serde::Serialize;
use crate::grib::FormatError;
use crate::grib::utils::Buffer;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRepresentationDefinition {
    /// Number of data points where one or more values are specified in Section 7
    pub num_points: u32,
    /// Data Representation Template Number
    pub template_number: u16,
    pub data: Data,
}

impl DataRepresentationDefinition {
    pub(crate) fn parse(buf: &mut Buffer) -> Result<Self, FormatError> {
        let num_points = buf.read()?;
        let template_number = buf.read()?;
        let data = Data::from_template(template_number, buf)?;

        Ok(DataRepresentationDefinition {
            num_points,
            template_number,
            data,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Data {
    Data0(Data0),
    Data2(Data2),
    Data3(Data3),
    Unknown(Vec<u8>)
}

impl Data {
    pub(crate) fn from_template(template_number: u16, buf: &mut Buffer) -> Result<Self, FormatError> {
        match template_number {
            0 => Ok(Data::Data0(Data0::parse(buf)?)),
            2 => Ok(Data::Data2(Data2::parse(buf)?)),
            3 => Ok(Data::Data3(Data3 {
                complex: Data2::parse(buf)?,
                spatial_difference_order: buf.read()?,
                octets_number: buf.read()?,
            })),
            _ => Ok(Data::Unknown(buf.rest().to_vec())),
        }
    }
}

/// Template 5.0: grid point data, simple packing.
///
/// Both scale factors are kept as raw octets: their sign bit selects the
/// direction of the scaling, see `sect7::Scaler`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Data0 {
    /// Reference value (R) (IEEE 32-bit floating-point value)
    pub reference_value: f32,
    /// Binary scale factor (E)
    pub binary_scale_factor: u16,
    /// Decimal scale factor (D)
    pub decimal_scale_factor: u16,
    /// Number of bits used for each packed value
    pub num_bits: u8,
    /// Type of original field values (see Code Table 5.1)
    pub values_type: u8,
}

impl Data0 {
    fn parse(buf: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Data0 {
            reference_value: buf.read()?,
            binary_scale_factor: buf.read()?,
            decimal_scale_factor: buf.read()?,
            num_bits: buf.read()?,
            values_type: buf.read()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDefinition {
    /// NG - number of groups of data values into which field is split
    pub num_groups: u32,
    /// Reference for group widths
    pub group_widths_reference: u8,
    /// Number of bits used for the group widths (after the reference value has been removed)
    pub group_widths_num_bits: u8,
    /// Reference for group lengths
    pub group_lengths_reference: u32,
    /// Length increment for the group lengths
    pub group_lengths_increment: u8,
    /// True length of last group
    pub group_lengths_last: u32,
    /// Number of bits used for the scaled group lengths (after subtraction of the reference value)
    pub group_scaled_lengths_num_bits: u8,
}

/// Template 5.2: grid point data, complex packing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Data2 {
    pub packing: Data0,
    /// Group splitting method used (see Code Table 5.4)
    pub group_method: u8,
    /// Missing value management used (see Code Table 5.5)
    pub missing_value_management: u8,
    pub missing_substitute_primary: u32,
    pub missing_substitute_secondary: u32,
    pub group_definition: GroupDefinition,
}

impl Data2 {
    fn parse(buf: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Data2 {
            packing: Data0::parse(buf)?,
            group_method: buf.read()?,
            missing_value_management: buf.read()?,
            missing_substitute_primary: buf.read()?,
            missing_substitute_secondary: buf.read()?,
            group_definition: GroupDefinition {
                num_groups: buf.read()?,
                group_widths_reference: buf.read()?,
                group_widths_num_bits: buf.read()?,
                group_lengths_reference: buf.read()?,
                group_lengths_increment: buf.read()?,
                group_lengths_last: buf.read()?,
                group_scaled_lengths_num_bits: buf.read()?,
            },
        })
    }
}

/// Template 5.3: grid point data, complex packing and spatial differencing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Data3 {
    pub complex: Data2,
    /// Order of spatial differencing (see Code Table 5.6)
    pub spatial_difference_order: u8,
    /// Number of octets required in the data section to specify extra
    /// descriptors needed for spatial differencing
    pub octets_number: u8,
}
