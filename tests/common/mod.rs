#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use flate2::Compression;
use flate2::write::GzEncoder;

/// Simple-packed GRIB2 message on a one-row lat/lon grid.
pub struct Grib2 {
    pub values: Vec<u16>,
    /// year, month, day, hour
    pub ref_time: (u16, u8, u8, u8),
    /// discipline, category, number
    pub parameter: (u8, u8, u8),
    pub forecast_hours: u32,
    /// surface type, scaled value
    pub surface: (u8, u32),
}

impl Grib2 {
    pub fn new(values: &[u16]) -> Self {
        Self {
            values: values.to_vec(),
            ref_time: (2024, 1, 1, 0),
            parameter: (0, 0, 0),
            forecast_hours: 0,
            surface: (1, 0),
        }
    }

    pub fn at(mut self, year: u16, month: u8, day: u8, hour: u8) -> Self {
        self.ref_time = (year, month, day, hour);
        self
    }

    pub fn forecast(mut self, hours: u32) -> Self {
        self.forecast_hours = hours;
        self
    }

    pub fn parameter(mut self, discipline: u8, category: u8, number: u8) -> Self {
        self.parameter = (discipline, category, number);
        self
    }

    pub fn surface(mut self, surface_type: u8, value: u32) -> Self {
        self.surface = (surface_type, value);
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let n = self.values.len() as u32;
        let (year, month, day, hour) = self.ref_time;

        // centre, subcentre, tables, significance
        let mut identification = vec![0, 7, 0, 0, 2, 1, 1];
        identification.extend(year.to_be_bytes());
        identification.extend([month, day, hour, 0, 0, 0, 1]);

        let mut grid = vec![0];
        grid.extend(n.to_be_bytes());
        grid.extend([0, 0, 0, 0]);
        grid.push(6);
        grid.extend([0; 15]);
        grid.extend(n.to_be_bytes());
        grid.extend(1u32.to_be_bytes());
        grid.extend([0; 8]);
        grid.extend(0u32.to_be_bytes());
        grid.extend(0u32.to_be_bytes());
        grid.push(48);
        grid.extend(0u32.to_be_bytes());
        grid.extend(359_000_000u32.to_be_bytes());
        grid.extend(1_000_000u32.to_be_bytes());
        grid.extend(1_000_000u32.to_be_bytes());
        grid.push(0);

        let mut product = vec![0, 0, 0, 0];
        product.extend([self.parameter.1, self.parameter.2, 2, 0, 96, 0, 0, 0, 1]);
        product.extend(self.forecast_hours.to_be_bytes());
        product.extend([self.surface.0, 0]);
        product.extend(self.surface.1.to_be_bytes());
        product.extend([255, 0, 0, 0, 0, 0]);

        let mut representation = n.to_be_bytes().to_vec();
        representation.extend(0u16.to_be_bytes());
        representation.extend(0f32.to_be_bytes());
        representation.extend([0, 0, 0, 0, 16, 0]);

        let data: Vec<u8> = self.values.iter().flat_map(|v| v.to_be_bytes()).collect();

        let mut body = Vec::new();
        body.extend(section(1, &identification));
        body.extend(section(3, &grid));
        body.extend(section(4, &product));
        body.extend(section(5, &representation));
        body.extend(section(6, &[255]));
        body.extend(section(7, &data));
        body.extend(b"7777");

        let mut message = b"GRIB".to_vec();
        message.extend([0, 0, self.parameter.0, 2]);
        message.extend((16 + body.len() as u64).to_be_bytes());
        message.extend(body);
        message
    }
}

fn section(number: u8, content: &[u8]) -> Vec<u8> {
    let mut bytes = ((content.len() + 5) as u32).to_be_bytes().to_vec();
    bytes.push(number);
    bytes.extend_from_slice(content);
    bytes
}

pub fn write_file(dir: &Path, name: &str, messages: &[Grib2]) -> PathBuf {
    let bytes: Vec<u8> = messages.iter().flat_map(Grib2::encode).collect();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

pub fn write_gz_file(dir: &Path, name: &str, messages: &[Grib2]) -> PathBuf {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    for message in messages {
        encoder.write_all(&message.encode()).unwrap();
    }
    let path = dir.join(name);
    std::fs::write(&path, encoder.finish().unwrap()).unwrap();
    path
}
