use crate::grib::DecodeError;
use crate::grib::sections::sect5::{Data, Data2, DataRepresentationDefinition};
use crate::grib::sections::sect7::{Grib2DataDecoder, Scaler, groups};
use crate::grib::sections::sect7::groups::{Missing, MissingManagement, Point};
use crate::grib::utils::{BitReader, GribInt};

pub(crate) struct GridPointDataComplexPackingDecoder {}

impl Grib2DataDecoder for GridPointDataComplexPackingDecoder {
    fn decode(&self, data_repr_def: &DataRepresentationDefinition, slice: &[u8]) -> Result<Vec<f64>, DecodeError> {

        let data = match &data_repr_def.data {
            Data::Data2(data) => data,
            _ => {
                return Err(DecodeError::UnsupportedTemplate(data_repr_def.template_number));
            }
        };

        let mut reader = BitReader::new(slice);
        let points = unpack_complex(data, data_repr_def.num_points as usize, &mut reader)?;

        Ok(scale_points(data, points))
    }
}

/// Group metadata then grouped values, as unscaled integers. Shared with the
/// spatial differencing decoder, which reads its seeds first.
pub(crate) fn unpack_complex(data: &Data2, num_points: usize, reader: &mut BitReader) -> Result<Vec<Point>, DecodeError> {
    let groups = groups::decode(data, num_points, reader)?;
    groups::check_lengths(&groups, num_points, reader.remaining_bits())?;

    let missing = MissingManagement::from_code(data.missing_value_management);
    let points = groups::unpack(&groups, reader, missing, usize::from(data.packing.num_bits))?;
    debug!("Unpacked {} groups into {} points", groups.len(), points.len());

    Ok(points)
}

/// Scales values and puts the declared substitute in place of missing points.
pub(crate) fn scale_points(data: &Data2, points: Vec<Point>) -> Vec<f64> {
    let scaler = Scaler::new(&data.packing);
    let primary = substitute(data, data.missing_substitute_primary);
    let secondary = substitute(data, data.missing_substitute_secondary);

    points
        .into_iter()
        .map(|point| match point {
            Point::Value(v) => scaler.apply(v),
            Point::Missing(Missing::Primary) => primary,
            Point::Missing(Missing::Secondary) => secondary,
        })
        .collect()
}

/// Substitutes are stored in the type of the original field values.
fn substitute(data: &Data2, raw: u32) -> f64 {
    if data.packing.values_type == 0 {
        f64::from(f32::from_bits(raw))
    } else {
        let value: i32 = raw.as_grib_int();
        f64::from(value)
    }
}
