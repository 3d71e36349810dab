use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use crate::grib::DecodeError;
use crate::grib::sections::sect5::{Data0, DataRepresentationDefinition};
use crate::grib::sections::sect7::complex::GridPointDataComplexPackingDecoder;
use crate::grib::sections::sect7::complex_spacial_diff::GridPointDataComplexPackingSpacialDiffDecoder;
use crate::grib::sections::sect7::simple::GridPointDataSimplePackingDecoder;

pub(crate) mod simple;
pub(crate) mod complex;
mod groups;
pub(crate) mod complex_spacial_diff;

pub(crate) trait Grib2DataDecoder {
    fn decode(&self, data_repr_def: &DataRepresentationDefinition, slice: &[u8]) -> Result<Vec<f64>, DecodeError>;
}

fn decoder_for(template_number: u16) -> Result<Box<dyn Grib2DataDecoder>, DecodeError> {
    match template_number {
        0 => Ok(Box::new(GridPointDataSimplePackingDecoder {})),
        2 => Ok(Box::new(GridPointDataComplexPackingDecoder {})),
        3 => Ok(Box::new(GridPointDataComplexPackingSpacialDiffDecoder {})),
        n => Err(DecodeError::UnsupportedTemplate(n)),
    }
}

/// Decodes the raw Section 7 octets with the decoder selected by Section 5.
///
/// A panic inside a decoder is reported as [`DecodeError::CorruptData`] so
/// that one bad message cannot take the worker down.
pub fn decode(data_repr_def: &DataRepresentationDefinition, slice: &[u8]) -> Result<Vec<f64>, DecodeError> {
    let decoder = decoder_for(data_repr_def.template_number)?;
    run_guarded(decoder.as_ref(), data_repr_def, slice)
}

fn run_guarded(decoder: &dyn Grib2DataDecoder, data_repr_def: &DataRepresentationDefinition, slice: &[u8]) -> Result<Vec<f64>, DecodeError> {
    panic::catch_unwind(AssertUnwindSafe(|| decoder.decode(data_repr_def, slice)))
        .unwrap_or_else(|payload| Err(DecodeError::CorruptData(panic_message(payload))))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        String::from(*message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("panic while decoding data section")
    }
}

/// Reference and scale of Template 5.0, shared by every packing.
///
/// Only the binary scale factor is read as sign-and-magnitude. The decimal
/// scale factor is the raw 16-bit value, and its direction follows the sign
/// of the binary factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Scaler {
    reference: f64,
    scale: f64,
}

impl Scaler {
    pub(crate) fn new(packing: &Data0) -> Self {
        let binary = packing.binary_scale_factor;
        let decimal = i32::from(packing.decimal_scale_factor);

        let (binary_scale, decimal_scale) = if binary & 0x8000 != 0 {
            let magnitude = i32::from(binary & 0x7FFF);
            (2_f64.powi(-magnitude), 10_f64.powi(-decimal))
        } else {
            (2_f64.powi(i32::from(binary)), 10_f64.powi(decimal))
        };

        Self {
            reference: decimal_scale * f64::from(packing.reference_value),
            scale: binary_scale * decimal_scale,
        }
    }

    pub(crate) fn reference(&self) -> f64 {
        self.reference
    }

    pub(crate) fn apply(&self, packed: i64) -> f64 {
        self.reference + packed as f64 * self.scale
    }
}
