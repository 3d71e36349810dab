use crate::grib::DecodeError;
use crate::grib::sections::sect5::Data2;
use crate::grib::utils::BitReader;

/// Parameters of one group of complex-packed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Group {
    pub(crate) reference: i64,
    pub(crate) width: usize,
    pub(crate) length: usize,
}

/// Which substitute a missing point takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Missing {
    Primary,
    Secondary,
}

/// One unpacked grid point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Point {
    Value(i64),
    Missing(Missing),
}

impl Point {
    pub(crate) fn value(&self) -> Option<i64> {
        match self {
            Point::Value(v) => Some(*v),
            Point::Missing(_) => None,
        }
    }
}

/// Missing value management of Templates 5.2 and 5.3 (Code Table 5.5).
///
/// An all-ones field is a primary missing value; with secondary values, all
/// ones minus one is a secondary missing value. A zero-width group is missing
/// as a whole when its reference matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MissingManagement {
    None,
    Primary,
    PrimaryAndSecondary,
}

impl MissingManagement {
    pub(crate) fn from_code(code: u8) -> Self {
        match code {
            1 => MissingManagement::Primary,
            2 => MissingManagement::PrimaryAndSecondary,
            _ => MissingManagement::None,
        }
    }

    fn classify(&self, raw: u64, bits: usize) -> Option<Missing> {
        if bits == 0 || bits > 64 {
            return None;
        }
        let all_ones = u64::MAX >> (64 - bits);

        match self {
            MissingManagement::None => None,
            _ if raw == all_ones => Some(Missing::Primary),
            MissingManagement::PrimaryAndSecondary if raw == all_ones - 1 => Some(Missing::Secondary),
            _ => None,
        }
    }
}

/// Reads the group references, widths and lengths that precede the packed
/// values, each block starting on an octet boundary.
pub(crate) fn decode(data: &Data2, num_points: usize, reader: &mut BitReader) -> Result<Vec<Group>, DecodeError> {
    let group_definition = &data.group_definition;
    let num_groups = group_definition.num_groups as usize;

    // every group holds at least one point
    if num_groups > num_points {
        return Err(DecodeError::CorruptData(format!("{} groups for {} points", num_groups, num_points)));
    }

    let references = reader.read_unsigned_block(usize::from(data.packing.num_bits), num_groups)?;
    reader.align_to_byte();

    let widths = reader.read_unsigned_block(usize::from(group_definition.group_widths_num_bits), num_groups)?;
    reader.align_to_byte();

    let lengths = reader.read_unsigned_block(usize::from(group_definition.group_scaled_lengths_num_bits), num_groups)?;
    reader.align_to_byte();

    let widths_reference = u64::from(group_definition.group_widths_reference);
    let lengths_reference = u64::from(group_definition.group_lengths_reference);
    let lengths_increment = u64::from(group_definition.group_lengths_increment);

    let groups = references
        .into_iter()
        .zip(widths)
        .zip(lengths)
        .enumerate()
        .map(|(i, ((reference, width), length))| {
            let length = if i + 1 == num_groups {
                u64::from(group_definition.group_lengths_last)
            } else {
                length.saturating_mul(lengths_increment).saturating_add(lengths_reference)
            };
            Group {
                reference: reference as i64,
                width: width.saturating_add(widths_reference) as usize,
                length: length as usize,
            }
        })
        .collect();

    Ok(groups)
}

/// Checks the group lengths against the declared number of points and the
/// packed widths against the octets left in the section. Runs before any
/// value is unpacked.
pub(crate) fn check_lengths(groups: &[Group], num_points: usize, remaining_bits: usize) -> Result<(), DecodeError> {
    let mut total_length: usize = 0;
    let mut total_bits: usize = 0;

    for group in groups {
        total_length = total_length.saturating_add(group.length);
        total_bits = total_bits.saturating_add(group.width.saturating_mul(group.length));
    }

    if total_length != num_points {
        return Err(DecodeError::InconsistentGroupLength {
            expected: num_points,
            actual: total_length,
        });
    }
    if total_bits > remaining_bits {
        return Err(DecodeError::UnexpectedEnd);
    }

    Ok(())
}

/// Expands every group to absolute packed integers. A zero-width group
/// repeats its reference. `reference_bits` is the width the group references
/// were packed on.
pub(crate) fn unpack(groups: &[Group], reader: &mut BitReader, missing: MissingManagement, reference_bits: usize) -> Result<Vec<Point>, DecodeError> {
    let capacity = groups.iter().map(|g| g.length).sum();
    let mut points = Vec::with_capacity(capacity);

    for group in groups {
        if group.width == 0 {
            let point = match missing.classify(group.reference as u64, reference_bits) {
                Some(m) => Point::Missing(m),
                None => Point::Value(group.reference),
            };
            points.extend(std::iter::repeat(point).take(group.length));
            continue;
        }
        for v in reader.read_unsigned_block(group.width, group.length)? {
            points.push(match missing.classify(v, group.width) {
                Some(m) => Point::Missing(m),
                None => Point::Value(group.reference.wrapping_add(v as i64)),
            });
        }
    }

    Ok(points)
}
