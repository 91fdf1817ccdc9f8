// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversion of relative numeric values to absolute ones.

use core::f32::consts::PI;

use kurbo::Size;
use understory_value::{NumericValue, Unit};

use crate::{ComputedValue, RelativeTarget};

const PX_PER_INCH: f32 = 96.0;

/// Inputs needed to resolve relative lengths on one node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LengthContext {
    /// Computed font size of the node, in pixels.
    pub font_size: f32,
    /// Computed font size of the parent, in pixels.
    pub parent_font_size: f32,
    /// Computed font size of the root node, in pixels.
    pub root_font_size: f32,
    /// Viewport dimensions, in pixels.
    pub viewport: Size,
    /// Device pixels per `dp`.
    pub dp_ratio: f32,
    /// Containing block, when layout has provided one.
    ///
    /// Without it, percentages of containing-block properties stay
    /// [`ComputedValue::Percentage`].
    pub containing_block: Option<Size>,
}

impl Default for LengthContext {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            parent_font_size: 12.0,
            root_font_size: 12.0,
            viewport: Size::ZERO,
            dp_ratio: 1.0,
            containing_block: None,
        }
    }
}

impl LengthContext {
    /// Resolves `value` to pixels (or radians for angles).
    ///
    /// Percentages are taken of `base`; `em` uses the node's own font size.
    ///
    /// ```rust
    /// use understory_cascade::LengthContext;
    /// use understory_value::{NumericValue, Unit};
    ///
    /// let cx = LengthContext { font_size: 20.0, ..LengthContext::default() };
    /// assert_eq!(cx.resolve_numeric_value(NumericValue::new(1.5, Unit::EM), 0.0), 30.0);
    /// assert_eq!(cx.resolve_numeric_value(NumericValue::new(50.0, Unit::PERCENT), 80.0), 40.0);
    /// assert_eq!(cx.resolve_numeric_value(NumericValue::new(1.0, Unit::INCH), 0.0), 96.0);
    /// ```
    #[must_use]
    pub fn resolve_numeric_value(&self, value: NumericValue, base: f32) -> f32 {
        let n = value.number;
        if value.unit == Unit::EM {
            n * self.font_size
        } else if value.unit == Unit::PERCENT {
            n * base * 0.01
        } else {
            self.absolute(value).unwrap_or(n)
        }
    }

    /// Converts units that need no base.
    fn absolute(&self, value: NumericValue) -> Option<f32> {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "viewport sizes fit comfortably in f32"
        )]
        let (vw, vh) = (self.viewport.width as f32, self.viewport.height as f32);
        let scale = [
            (Unit::NUMBER | Unit::PX | Unit::RAD, 1.0),
            (Unit::DP, self.dp_ratio),
            (Unit::REM, self.root_font_size),
            (Unit::VW, vw * 0.01),
            (Unit::VH, vh * 0.01),
            (Unit::INCH, PX_PER_INCH),
            (Unit::CM, PX_PER_INCH / 2.54),
            (Unit::MM, PX_PER_INCH / 25.4),
            (Unit::PT, PX_PER_INCH / 72.0),
            (Unit::PC, PX_PER_INCH / 6.0),
            (Unit::DEG, PI / 180.0),
        ];
        scale
            .iter()
            .find(|(units, _)| units.contains(value.unit))
            .map(|(_, factor)| value.number * factor)
    }

    /// Computes `value` for a property that resolves against `target`.
    ///
    /// ```rust
    /// use understory_cascade::{ComputedValue, LengthContext, RelativeTarget};
    /// use understory_value::{NumericValue, Unit};
    ///
    /// let cx = LengthContext {
    ///     font_size: 20.0,
    ///     parent_font_size: 10.0,
    ///     ..LengthContext::default()
    /// };
    /// let two_em = NumericValue::new(2.0, Unit::EM);
    /// assert_eq!(
    ///     cx.resolve_relative_length(two_em, RelativeTarget::ParentFontSize),
    ///     ComputedValue::Length(20.0)
    /// );
    /// assert_eq!(
    ///     cx.resolve_relative_length(two_em, RelativeTarget::ContainingBlockWidth),
    ///     ComputedValue::Length(40.0)
    /// );
    /// let half = NumericValue::new(50.0, Unit::PERCENT);
    /// assert_eq!(
    ///     cx.resolve_relative_length(half, RelativeTarget::ContainingBlockWidth),
    ///     ComputedValue::Percentage(50.0)
    /// );
    /// ```
    #[must_use]
    pub fn resolve_relative_length(&self, value: NumericValue, target: RelativeTarget) -> ComputedValue {
        let n = value.number;
        let unit = value.unit;
        if unit == Unit::NUMBER {
            return ComputedValue::Number(n);
        }
        if Unit::ANGLE.contains(unit) {
            return ComputedValue::Angle(self.resolve_numeric_value(value, 0.0));
        }
        if unit == Unit::EM && target == RelativeTarget::ParentFontSize {
            return ComputedValue::Length(n * self.parent_font_size);
        }
        if unit != Unit::PERCENT {
            return ComputedValue::Length(self.resolve_numeric_value(value, 0.0));
        }
        match target {
            RelativeTarget::ParentFontSize => ComputedValue::Length(n * self.parent_font_size * 0.01),
            RelativeTarget::FontSize => ComputedValue::Length(n * self.font_size * 0.01),
            RelativeTarget::ContainingBlockWidth => match self.containing_block {
                Some(block) => ComputedValue::Length(self.of_block(value, block.width)),
                None => ComputedValue::Percentage(n),
            },
            RelativeTarget::ContainingBlockHeight => match self.containing_block {
                Some(block) => ComputedValue::Length(self.of_block(value, block.height)),
                None => ComputedValue::Percentage(n),
            },
            RelativeTarget::None => ComputedValue::Percentage(n),
        }
    }

    fn of_block(&self, value: NumericValue, extent: f64) -> f32 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "layout extents fit comfortably in f32"
        )]
        let base = extent as f32;
        self.resolve_numeric_value(value, base)
    }
}
