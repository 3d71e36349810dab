//! Built-in subset of the WMO GRIB2 code tables used to name records.
//!
//! Codes that are not listed resolve to a stable descriptive string so that
//! records of unknown parameters remain distinguishable.

/// Code Table 4.2: parameter by discipline, category and number.
pub fn parameter_name(discipline: u8, category: u8, number: u8) -> String {
    let name = match (discipline, category, number) {
        // meteorological products, temperature
        (0, 0, 0) => "Temperature",
        (0, 0, 1) => "Virtual temperature",
        (0, 0, 2) => "Potential temperature",
        (0, 0, 4) => "Maximum temperature",
        (0, 0, 5) => "Minimum temperature",
        (0, 0, 6) => "Dew point temperature",
        (0, 0, 17) => "Skin temperature",
        // moisture
        (0, 1, 0) => "Specific humidity",
        (0, 1, 1) => "Relative humidity",
        (0, 1, 3) => "Precipitable water",
        (0, 1, 7) => "Precipitation rate",
        (0, 1, 8) => "Total precipitation",
        (0, 1, 11) => "Snow depth",
        (0, 1, 13) => "Water equivalent of accumulated snow depth",
        // momentum
        (0, 2, 0) => "Wind direction",
        (0, 2, 1) => "Wind speed",
        (0, 2, 2) => "U-component of wind",
        (0, 2, 3) => "V-component of wind",
        (0, 2, 8) => "Vertical velocity (pressure)",
        (0, 2, 9) => "Vertical velocity (geometric)",
        (0, 2, 10) => "Absolute vorticity",
        (0, 2, 22) => "Wind speed (gust)",
        // mass
        (0, 3, 0) => "Pressure",
        (0, 3, 1) => "Pressure reduced to MSL",
        (0, 3, 5) => "Geopotential height",
        (0, 3, 6) => "Geometric height",
        // short-wave and long-wave radiation
        (0, 4, 7) => "Downward short-wave radiation flux",
        (0, 5, 3) => "Downward long-wave radiation flux",
        // cloud
        (0, 6, 1) => "Total cloud cover",
        (0, 6, 3) => "Low cloud cover",
        (0, 6, 4) => "Medium cloud cover",
        (0, 6, 5) => "High cloud cover",
        // thermodynamic stability indices
        (0, 7, 6) => "Convective available potential energy",
        (0, 7, 7) => "Convective inhibition",
        // physical atmospheric properties
        (0, 19, 0) => "Visibility",
        // land surface products
        (2, 0, 0) => "Land cover",
        (2, 0, 192) => "Volumetric soil moisture content",
        // oceanographic products
        (10, 0, 3) => "Significant height of combined wind waves and swell",
        (10, 2, 0) => "Ice cover",
        (10, 3, 0) => "Water temperature",
        _ => {
            return format!("discipline {} category {} parameter {}", discipline, category, number);
        }
    };
    String::from(name)
}

/// Code Table 4.5: fixed surface type.
pub fn surface_name(surface_type: u8) -> String {
    let name = match surface_type {
        1 => "Ground or water surface",
        2 => "Cloud base level",
        3 => "Level of cloud tops",
        4 => "Level of 0 degree C isotherm",
        6 => "Maximum wind level",
        7 => "Tropopause",
        8 => "Nominal top of the atmosphere",
        10 => "Entire atmosphere",
        100 => "Isobaric surface",
        101 => "Mean sea level",
        102 => "Specific altitude above mean sea level",
        103 => "Specified height level above ground",
        104 => "Sigma level",
        105 => "Hybrid level",
        106 => "Depth below land surface",
        108 => "Level at specified pressure difference from ground to level",
        200 => "Entire atmosphere (considered as a single layer)",
        255 => "Missing",
        n => {
            return format!("surface type {}", n);
        }
    };
    String::from(name)
}
