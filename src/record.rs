use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use crate::grib::{FormatError, Message};
use crate::grib::sections::sect3::GridDefinition;
use crate::grib::tables::{parameter_name, surface_name};
use crate::stamp::Stamp;

/// Grid metadata stored next to every record, as one JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridMetadata {
    pub name: String,
    #[serde(rename = "sec3")]
    pub definition: GridDefinition,
}

/// What a decoded message describes, resolved through the code tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub forecast_offset: u32,
    pub parameter: String,
    pub surface_type: String,
    pub surface_value: String,
}

impl Descriptor {
    pub fn of(message: &Message) -> Result<Self, FormatError> {
        let product = message.product_definition.product0()?;

        Ok(Descriptor {
            forecast_offset: product.forecast_time,
            parameter: parameter_name(
                message.indicator.discipline,
                product.parameter_category,
                product.parameter_number,
            ),
            surface_type: surface_name(product.first_surface.surface_type),
            surface_value: format!("{}m", product.first_surface.scaled_value),
        })
    }

    pub fn file_name(&self) -> String {
        json_file_name(&self.parameter, &self.surface_type, &self.surface_value)
    }
}

/// The unit handed to the export stage. One per decoded message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub forecast_offset: u32,
    pub parameter: String,
    pub surface_type: String,
    pub surface_value: String,
    pub grid: GridMetadata,
    pub data: Vec<f64>,
    /// `data` truncated toward zero
    pub data_int: Vec<i64>,
}

impl Record {
    pub fn from_message(message: Message) -> Result<Self, FormatError> {
        let descriptor = Descriptor::of(&message)?;

        let data_int = message.data.iter().map(|v| *v as i64).collect();
        let grid = GridMetadata {
            name: message.grid_definition.template_name(),
            definition: message.grid_definition,
        };

        Ok(Record {
            id: Uuid::new_v4(),
            timestamp: message.identification.ref_time,
            forecast_offset: descriptor.forecast_offset,
            parameter: descriptor.parameter,
            surface_type: descriptor.surface_type,
            surface_value: descriptor.surface_value,
            grid,
            data: message.data,
            data_int,
        })
    }

    pub(crate) fn stamp(&self) -> Stamp {
        Stamp::new(self.timestamp, self.forecast_offset)
    }

    pub fn file_name(&self) -> String {
        json_file_name(&self.parameter, &self.surface_type, &self.surface_value)
    }
}

fn json_file_name(parameter: &str, surface_type: &str, surface_value: &str) -> String {
    format!("{}_{}_{}.json", parameter, surface_type, surface_value)
}
