//! Design units to device pixels

use crate::error::{BenchError, Result};

/// Converts positions from a font's design grid to pixels at a text size
///
/// A font measures everything on a grid `units_per_em` wide. At `font_size`
/// pixels per em one design unit is `font_size / units_per_em` pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitScale {
    font_size: f32,
    units_per_em: u16,
    scale_x: f32,
}

impl UnitScale {
    pub fn new(font_size: f32, units_per_em: u16) -> Result<Self> {
        if units_per_em == 0 {
            return Err(BenchError::Config("units per em must be non-zero".into()));
        }
        Ok(Self {
            font_size,
            units_per_em,
            scale_x: 1.0,
        })
    }

    /// Stretch horizontal positions by `scale_x`
    pub fn with_scale_x(mut self, scale_x: f32) -> Self {
        self.scale_x = scale_x;
        self
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Pixels per design unit, vertically
    pub fn factor(&self) -> f32 {
        self.font_size / self.units_per_em as f32
    }

    /// Pixels per design unit, horizontally
    pub fn factor_x(&self) -> f32 {
        self.factor() * self.scale_x
    }

    pub fn to_device(&self, design: i32) -> f32 {
        design as f32 * self.factor()
    }

    pub fn to_device_x(&self, design: i32) -> f32 {
        design as f32 * self.factor_x()
    }
}
