use serde::Serialize;
use crate::grib::FormatError;
use crate::grib::utils::{Buffer, GribInt};

/// Octets in Grid Definition Template 3.0.
const GRID0_SIZE: usize = 58;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDefinition {
    pub source: u8,
    /// Number of data points
    pub num_points: u32,
    /// Octets per entry of the optional list of numbers of points
    pub point_count_octets: u8,
    pub point_count_interpretation: u8,
    /// Grid Definition Template Number
    pub template_number: u16,
    pub grid: Grid,
    pub optional_num_list: Vec<u8>,
}

impl GridDefinition {
    pub(crate) fn parse(buf: &mut Buffer) -> Result<Self, FormatError> {
        let source = buf.read()?;
        let num_points = buf.read()?;
        let point_count_octets = buf.read()?;
        let point_count_interpretation = buf.read()?;
        let template_number = buf.read()?;

        let grid = Grid::from_template(template_number, buf)?;

        Ok(GridDefinition {
            source,
            num_points,
            point_count_octets,
            point_count_interpretation,
            template_number,
            grid,
            optional_num_list: buf.rest().to_vec(),
        })
    }

    /// Human name of the grid definition template (Code Table 3.1).
    pub fn template_name(&self) -> String {
        match self.template_number {
            0 => String::from("Latitude/longitude"),
            1 => String::from("Rotated latitude/longitude"),
            10 => String::from("Mercator"),
            20 => String::from("Polar stereographic"),
            30 => String::from("Lambert conformal"),
            40 => String::from("Gaussian latitude/longitude"),
            90 => String::from("Space view perspective"),
            n => format!("Grid definition template 3.{}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Grid {
    Grid0(Grid0),
    Unknown(Vec<u8>),
}

impl Grid {
    /// Template 3.0 is decoded; anything else is carried through as raw
    /// octets, together with any optional list that follows it.
    pub(crate) fn from_template(template_number: u16, buf: &mut Buffer) -> Result<Self, FormatError> {
        match template_number {
            0 => {
                let mut buf = Buffer::new(buf.take(GRID0_SIZE)?, 3);
                let grid = Grid0 {
                    header: GridHeader {
                        earth_shape: buf.read()?,
                        spherical_radius: ScaledValue { scale: buf.read()?, value: buf.read()? },
                        major_axis: ScaledValue { scale: buf.read()?, value: buf.read()? },
                        minor_axis: ScaledValue { scale: buf.read()?, value: buf.read()? },
                    },
                    n_i: buf.read()?,
                    n_j: buf.read()?,
                    initial_prod_basic_angle: BasicAngle { basic_angle: buf.read()?, basic_angle_sub: buf.read()? },
                    la1: buf.read::<u32>()?.as_grib_int(),
                    lo1: buf.read::<u32>()?.as_grib_int(),
                    resolution_and_component_flags: buf.read()?,
                    la2: buf.read::<u32>()?.as_grib_int(),
                    lo2: buf.read::<u32>()?.as_grib_int(),
                    d_i: buf.read()?,
                    d_j: buf.read()?,
                    scanning_mode: buf.read()?,
                };
                buf.finish()?;
                Ok(Grid::Grid0(grid))
            },
            _ => {
                Ok(Grid::Unknown(buf.rest().to_vec()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ScaledValue {
    pub scale: u8,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicAngle {
    pub basic_angle: u32,
    pub basic_angle_sub: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridHeader {
    pub earth_shape: u8,
    pub spherical_radius: ScaledValue,
    pub major_axis: ScaledValue,
    pub minor_axis: ScaledValue,
}

///Grid0 Definition Template 3.0: Latitude/longitude (or equidistant cylindrical, or Plate Carree)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid0 {
    pub header: GridHeader,
    pub n_i: u32,
    pub n_j: u32,
    pub initial_prod_basic_angle: BasicAngle,
    pub la1: i32,
    pub lo1: i32,
    pub resolution_and_component_flags: u8,
    pub la2: i32,
    pub lo2: i32,
    pub d_i: u32,
    pub d_j: u32,
    pub scanning_mode: u8,
}
