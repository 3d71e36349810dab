use std::cmp::Ordering;
use crate::grib::DecodeError;
use crate::grib::sections::sect5::{Data, DataRepresentationDefinition};
use crate::grib::sections::sect7::{Grib2DataDecoder, Scaler};
use crate::grib::utils::BitReader;

pub(crate) struct GridPointDataSimplePackingDecoder {}

impl Grib2DataDecoder for GridPointDataSimplePackingDecoder {
    fn decode(&self, data_repr_def: &DataRepresentationDefinition, slice: &[u8]) -> Result<Vec<f64>, DecodeError> {

        let data = match &data_repr_def.data {
            Data::Data0(data) => data,
            _ => {
                return Err(DecodeError::UnsupportedTemplate(data_repr_def.template_number));
            }
        };

        if slice.is_empty() {
            return Ok(Vec::new());
        }

        let scaler = Scaler::new(data);
        let num_points = data_repr_def.num_points as usize;

        if data.num_bits == 0 {
            return Ok(vec![scaler.reference(); num_points]);
        }

        let num_bits = usize::from(data.num_bits);
        let count = 8 * slice.len() / num_bits;
        let packed = BitReader::new(slice).read_unsigned_block(num_bits, count)?;

        let mut decoded: Vec<f64> = packed
            .into_iter()
            .map(|v| scaler.apply(v as i64))
            .collect();

        // the last octet is padded, so a few spare values may have been unpacked
        match decoded.len().cmp(&num_points) {
            Ordering::Less => {
                return Err(DecodeError::FieldLengthMismatch {
                    expected: num_points,
                    actual: decoded.len(),
                });
            }
            Ordering::Greater => decoded.truncate(num_points),
            Ordering::Equal => {}
        }

        Ok(decoded)
    }
}
