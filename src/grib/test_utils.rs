//! Hand-built GRIB2 messages for unit tests.

use crate::grib::sections::sect5::GroupDefinition;
use crate::grib::sections::sect6::NO_BITMAP;

/// Sign-and-magnitude form of `value`.
pub(crate) fn grib_u32(value: i32) -> u32 {
    if value < 0 {
        0x8000_0000 | value.unsigned_abs()
    } else {
        value as u32
    }
}

/// Template 3.0 body, 58 octets.
pub(crate) fn grid0_template(n_i: u32, n_j: u32, la1: i32, la2: i32) -> Vec<u8> {
    let mut bytes = vec![6]; // earth shape
    bytes.extend([0u8; 15]); // radius and axes
    bytes.extend(n_i.to_be_bytes());
    bytes.extend(n_j.to_be_bytes());
    bytes.extend([0u8; 8]); // basic angle
    bytes.extend(grib_u32(la1).to_be_bytes());
    bytes.extend(0u32.to_be_bytes());
    bytes.push(48);
    bytes.extend(grib_u32(la2).to_be_bytes());
    bytes.extend(359_750_000u32.to_be_bytes());
    bytes.extend(250_000u32.to_be_bytes());
    bytes.extend(250_000u32.to_be_bytes());
    bytes.push(0);
    bytes
}

/// Template 4.0 body, 25 octets.
pub(crate) fn product0_template(category: u8, number: u8, time_unit: u8, forecast_time: u32, surface_type: u8, surface_value: u32) -> Vec<u8> {
    let mut bytes = vec![category, number, 2, 0, 96];
    bytes.extend(0u16.to_be_bytes());
    bytes.push(0);
    bytes.push(time_unit);
    bytes.extend(forecast_time.to_be_bytes());
    bytes.extend([surface_type, 0]);
    bytes.extend(surface_value.to_be_bytes());
    bytes.extend([255, 0, 0, 0, 0, 0]);
    bytes
}

/// Template 5.0 body, 10 octets.
pub(crate) fn simple_template(reference_value: f32, binary_scale_factor: u16, decimal_scale_factor: u16, num_bits: u8) -> Vec<u8> {
    let mut bytes = reference_value.to_be_bytes().to_vec();
    bytes.extend(binary_scale_factor.to_be_bytes());
    bytes.extend(decimal_scale_factor.to_be_bytes());
    bytes.extend([num_bits, 0]);
    bytes
}

/// Template 5.2 body with a zero reference and no scaling, 36 octets.
pub(crate) fn complex_template(num_bits: u8, group_definition: &GroupDefinition) -> Vec<u8> {
    let mut bytes = simple_template(0.0, 0, 0, num_bits);
    bytes.extend([1, 0]);
    bytes.extend(0u32.to_be_bytes());
    bytes.extend(0u32.to_be_bytes());
    bytes.extend(group_definition.num_groups.to_be_bytes());
    bytes.push(group_definition.group_widths_reference);
    bytes.push(group_definition.group_widths_num_bits);
    bytes.extend(group_definition.group_lengths_reference.to_be_bytes());
    bytes.push(group_definition.group_lengths_increment);
    bytes.extend(group_definition.group_lengths_last.to_be_bytes());
    bytes.push(group_definition.group_scaled_lengths_num_bits);
    bytes
}

fn section(number: u8, content: &[u8]) -> Vec<u8> {
    let mut bytes = ((content.len() + 5) as u32).to_be_bytes().to_vec();
    bytes.push(number);
    bytes.extend(content);
    bytes
}

/// A complete single-grid message with simple packing on 16 bits, no
/// scaling and a zero reference, so every value decodes to itself.
pub(crate) struct MessageFixture {
    pub(crate) values: Vec<u16>,
    pub(crate) discipline: u8,
    /// year, month, day, hour, minute, second
    pub(crate) ref_time: (u16, u8, u8, u8, u8, u8),
    pub(crate) parameter: (u8, u8),
    pub(crate) forecast_time: u32,
    pub(crate) surface: (u8, u32),
    /// Octets appended to Section 1 and counted in its length
    pub(crate) section1_padding: usize,
    /// Replaces the Section 5 template number and body
    pub(crate) data_template: Option<(u16, Vec<u8>)>,
    /// Overrides the point count declared in Section 5
    pub(crate) data_points: Option<u32>,
    /// Sections written between Section 7 and the end marker
    pub(crate) extra_sections: Vec<(u8, Vec<u8>)>,
}

impl MessageFixture {
    pub(crate) fn simple(values: &[u16]) -> Self {
        Self {
            values: values.to_vec(),
            discipline: 0,
            ref_time: (2024, 3, 15, 12, 0, 0),
            parameter: (0, 0),
            forecast_time: 6,
            surface: (103, 2),
            section1_padding: 0,
            data_template: None,
            data_points: None,
            extra_sections: Vec::new(),
        }
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        let num_points = self.values.len() as u32;
        let (year, month, day, hour, minute, second) = self.ref_time;

        let mut sect1 = vec![0, 7, 0, 0, 2, 1, 1];
        sect1.extend(year.to_be_bytes());
        sect1.extend([month, day, hour, minute, second, 0, 1]);
        sect1.extend(vec![0u8; self.section1_padding]);

        let mut sect3 = vec![0];
        sect3.extend(num_points.to_be_bytes());
        sect3.extend([0, 0, 0, 0]);
        sect3.extend(grid0_template(num_points, 1, 90_000_000, -90_000_000));

        let mut sect4 = vec![0, 0, 0, 0];
        sect4.extend(product0_template(self.parameter.0, self.parameter.1, 1, self.forecast_time, self.surface.0, self.surface.1));

        let (template_number, template) = self
            .data_template
            .clone()
            .unwrap_or_else(|| (0, simple_template(0.0, 0, 0, 16)));
        let mut sect5 = self.data_points.unwrap_or(num_points).to_be_bytes().to_vec();
        sect5.extend(template_number.to_be_bytes());
        sect5.extend(template);

        let sect7: Vec<u8> = self.values.iter().flat_map(|v| v.to_be_bytes()).collect();

        let mut body = Vec::new();
        body.extend(section(1, &sect1));
        body.extend(section(3, &sect3));
        body.extend(section(4, &sect4));
        body.extend(section(5, &sect5));
        body.extend(section(6, &[NO_BITMAP]));
        body.extend(section(7, &sect7));
        for (number, content) in &self.extra_sections {
            body.extend(section(*number, content));
        }
        body.extend(b"7777");

        let mut bytes = b"GRIB".to_vec();
        bytes.extend(0u16.to_be_bytes());
        bytes.push(self.discipline);
        bytes.push(2);
        bytes.extend(((body.len() + 16) as u64).to_be_bytes());
        bytes.extend(body);
        bytes
    }
}
