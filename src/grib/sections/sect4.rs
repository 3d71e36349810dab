use serde::Serialize;
use crate::grib::FormatError;
use crate::grib::utils::Buffer;

/// Octets in Product Definition Template 4.0.
const PRODUCT0_SIZE: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDefinition {
    /// Number of coordinate values after Template
    pub num_coordinates: u16,
    /// Product Definition Template Number
    pub template_number: u16,
    pub product: Product,
    pub coordinates: Vec<u8>,
}

impl ProductDefinition {
    pub(crate) fn parse(buf: &mut Buffer) -> Result<Self, FormatError> {
        let num_coordinates = buf.read()?;
        let template_number = buf.read()?;
        let product = Product::from_template(template_number, buf)?;

        Ok(ProductDefinition {
            num_coordinates,
            template_number,
            product,
            coordinates: buf.rest().to_vec(),
        })
    }

    pub fn product0(&self) -> Result<&Product0, FormatError> {
        match &self.product {
            Product::Product0(product) => Ok(product),
            Product::Unknown(_) => Err(FormatError::UnsupportedProductTemplate(self.template_number)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Product {
    Product0(Product0),
    Unknown(Vec<u8>)
}

impl Product {
    pub(crate) fn from_template(template_number: u16, buf: &mut Buffer) -> Result<Self, FormatError> {
        match template_number {
            0 => {
                let mut buf = Buffer::new(buf.take(PRODUCT0_SIZE)?, 4);
                let product = Product0 {
                    parameter_category: buf.read()?,
                    parameter_number: buf.read()?,
                    process_type: buf.read()?,
                    background_process: buf.read()?,
                    analysis_process: buf.read()?,
                    hours: buf.read()?,
                    minutes: buf.read()?,
                    time_unit: buf.read()?,
                    forecast_time: buf.read()?,
                    first_surface: Surface::parse(&mut buf)?,
                    second_surface: Surface::parse(&mut buf)?,
                };
                buf.finish()?;
                Ok(Product::Product0(product))
            },
            _ => {
                Ok(Product::Unknown(buf.rest().to_vec()))
            }
        }
    }
}

/// Template 4.0: analysis or forecast at a horizontal level or in a
/// horizontal layer at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product0 {
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub process_type: u8,
    pub background_process: u8,
    pub analysis_process: u8,
    pub hours: u16,
    pub minutes: u8,
    /// Indicator of unit of time range (see Code Table 4.4)
    pub time_unit: u8,
    /// Forecast time in units of `time_unit`
    pub forecast_time: u32,
    pub first_surface: Surface,
    pub second_surface: Surface,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Surface {
    pub surface_type: u8,
    pub scale_factor: u8,
    pub scaled_value: u32,
}

impl Surface {
    fn parse(buf: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Surface {
            surface_type: buf.read()?,
            scale_factor: buf.read()?,
            scaled_value: buf.read()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grib::test_utils::product0_template;

    #[test]
    fn parses_template_zero() {
        let mut bytes = vec![0, 0, 0, 0];
        bytes.extend(product0_template(2, 3, 1, 6, 103, 10));
        let mut buf = Buffer::new(&bytes, 4);

        let definition = ProductDefinition::parse(&mut buf).unwrap();
        let product = definition.product0().unwrap();

        assert_eq!((product.parameter_category, product.parameter_number), (2, 3));
        assert_eq!(product.forecast_time, 6);
        assert_eq!(product.first_surface.surface_type, 103);
        assert_eq!(product.first_surface.scaled_value, 10);
        assert!(definition.coordinates.is_empty());
    }

    #[test]
    fn trailing_coordinates_are_kept() {
        let mut bytes = vec![0, 2, 0, 0];
        bytes.extend(product0_template(0, 0, 1, 0, 1, 0));
        bytes.extend([1, 2, 3, 4, 5, 6, 7, 8]);
        let mut buf = Buffer::new(&bytes, 4);

        let definition = ProductDefinition::parse(&mut buf).unwrap();

        assert_eq!(definition.num_coordinates, 2);
        assert_eq!(definition.coordinates.len(), 8);
    }

    #[test]
    fn other_templates_are_opaque() {
        let bytes = vec![0, 0, 0, 8, 9, 9, 9];
        let mut buf = Buffer::new(&bytes, 4);

        let definition = ProductDefinition::parse(&mut buf).unwrap();

        assert_eq!(definition.product, Product::Unknown(vec![9, 9, 9]));
        assert!(matches!(
            definition.product0(),
            Err(FormatError::UnsupportedProductTemplate(8))
        ));
    }
}
