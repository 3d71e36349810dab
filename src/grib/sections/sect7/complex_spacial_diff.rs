use crate::grib::DecodeError;
use crate::grib::sections::sect5::{Data, DataRepresentationDefinition};
use crate::grib::sections::sect7::Grib2DataDecoder;
use crate::grib::sections::sect7::complex::{scale_points, unpack_complex};
use crate::grib::sections::sect7::groups::Point;
use crate::grib::utils::BitReader;

pub(crate) struct GridPointDataComplexPackingSpacialDiffDecoder {}

impl Grib2DataDecoder for GridPointDataComplexPackingSpacialDiffDecoder {
    fn decode(&self, data_repr_def: &DataRepresentationDefinition, slice: &[u8]) -> Result<Vec<f64>, DecodeError> {

        let data = match &data_repr_def.data {
            Data::Data3(data) => data,
            _ => {
                return Err(DecodeError::UnsupportedTemplate(data_repr_def.template_number));
            }
        };

        let mut reader = BitReader::new(slice);
        let seeds = Seeds::read(&mut reader, data.spatial_difference_order, data.octets_number)?;

        let mut points = unpack_complex(&data.complex, data_repr_def.num_points as usize, &mut reader)?;
        if let Some(seeds) = seeds {
            // missing points take no part in the differencing
            let mut values: Vec<i64> = points.iter().filter_map(Point::value).collect();
            seeds.reconstruct(data.spatial_difference_order, &mut values)?;

            let mut restored = values.into_iter();
            for point in points.iter_mut() {
                if let Point::Value(v) = point {
                    if let Some(value) = restored.next() {
                        *v = value;
                    }
                }
            }
        }

        Ok(scale_points(&data.complex, points))
    }
}

/// Extra descriptors stored at the start of Section 7, each `octets * 8` bits
/// in sign-and-magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Seeds {
    first: i64,
    second: i64,
    minimum: i64,
}

impl Seeds {
    /// `None` when no octets are reserved for the descriptors.
    fn read(reader: &mut BitReader, order: u8, octets: u8) -> Result<Option<Self>, DecodeError> {
        let bits = usize::from(octets) * 8;
        if bits == 0 {
            return Ok(None);
        }

        let first = reader.read_signed(bits)?;
        let second = if order == 2 { reader.read_signed(bits)? } else { 0 };
        let minimum = reader.read_signed(bits)?;

        Ok(Some(Seeds {
            first,
            second,
            minimum,
        }))
    }

    /// Undoes first or second order differencing in place. Other orders leave
    /// the values untouched, as does an empty field.
    fn reconstruct(&self, order: u8, values: &mut [i64]) -> Result<(), DecodeError> {
        if values.is_empty() {
            return Ok(());
        }
        match order {
            1 => {
                values[0] = self.first;
                for n in 1..values.len() {
                    values[n] = values[n]
                        .wrapping_add(values[n - 1])
                        .wrapping_add(self.minimum);
                }
            }
            2 => {
                if values.len() < 2 {
                    return Err(DecodeError::CorruptData(format!(
                        "{} values cannot seed second order differencing", values.len()
                    )));
                }
                values[0] = self.first;
                values[1] = self.second;
                for n in 2..values.len() {
                    values[n] = values[n]
                        .wrapping_add(values[n - 1].wrapping_mul(2))
                        .wrapping_sub(values[n - 2])
                        .wrapping_add(self.minimum);
                }
            }
            n => {
                debug!("Spatial differencing order {} left as is", n);
            }
        }
        Ok(())
    }
}
