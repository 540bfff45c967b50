// Copyright (c) 2019-present Dmitry Stepanov and Fyrox Engine contributors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Color gradient is an ordered list of color stops. Used by particle systems and by the
//! gradient editing widget.

use crate::color::Color;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(PartialEq, Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct GradientPoint {
    location: f32,
    color: Color,
}

impl GradientPoint {
    #[inline]
    pub fn new(location: f32, color: Color) -> Self {
        Self { location, color }
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn location(&self) -> f32 {
        self.location
    }
}

#[derive(PartialEq, Clone, Debug, Default, Serialize, Deserialize)]
pub struct ColorGradient {
    points: Vec<GradientPoint>,
}

fn sort_points(points: &mut [GradientPoint]) {
    points.sort_by(|a, b| {
        a.location
            .partial_cmp(&b.location)
            .unwrap_or(Ordering::Equal)
    });
}

impl From<Vec<GradientPoint>> for ColorGradient {
    fn from(mut points: Vec<GradientPoint>) -> Self {
        sort_points(&mut points);
        Self { points }
    }
}

impl ColorGradient {
    pub const STUB_COLOR: Color = Color::WHITE;

    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Inserts the point keeping the list sorted by location. Returns the index of the new point.
    pub fn add_point(&mut self, pt: GradientPoint) -> usize {
        let pos = self.points.partition_point(|p| p.location <= pt.location);
        self.points.insert(pos, pt);
        pos
    }

    pub fn remove_point(&mut self, index: usize) -> Option<GradientPoint> {
        if index < self.points.len() {
            Some(self.points.remove(index))
        } else {
            None
        }
    }

    /// Moves the point to a new location and returns its new index.
    pub fn set_point_location(&mut self, index: usize, location: f32) -> Option<usize> {
        let mut point = self.remove_point(index)?;
        point.location = location;
        Some(self.add_point(point))
    }

    pub fn set_point_color(&mut self, index: usize, color: Color) -> bool {
        if let Some(point) = self.points.get_mut(index) {
            point.color = color;
            true
        } else {
            false
        }
    }

    pub fn get_color(&self, location: f32) -> Color {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return Self::STUB_COLOR;
        };

        if location <= first.location {
            first.color
        } else if location >= last.location {
            last.color
        } else {
            let right = self.points.partition_point(|p| p.location <= location);
            let pt_a = &self.points[right - 1];
            let pt_b = &self.points[right];
            let span = pt_b.location - pt_a.location;
            if span <= f32::EPSILON {
                return pt_b.color;
            }
            let t = (location - pt_a.location) / span;
            pt_a.color.lerp(pt_b.color, t)
        }
    }

    pub fn points(&self) -> &[GradientPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear()
    }
}

#[cfg(test)]
mod test {
    use super::{ColorGradient, GradientPoint};
    use crate::color::Color;

    #[test]
    fn test_color_gradient() {
        let mut cg = ColorGradient::new();
        assert_eq!(cg.get_color(0.0), ColorGradient::STUB_COLOR);

        cg.add_point(GradientPoint::new(0.0, Color::BLACK));
        assert_eq!(cg.get_color(0.7), Color::BLACK);

        cg.add_point(GradientPoint::new(1.0, Color::WHITE));
        assert_eq!(cg.get_color(-0.5), Color::BLACK);
        assert_eq!(cg.get_color(0.5), Color::opaque(127, 127, 127));
        assert_eq!(cg.get_color(1.5), Color::WHITE);

        cg.add_point(GradientPoint::new(0.5, Color::opaque(127, 127, 127)));
        assert_eq!(cg.get_color(0.25), Color::opaque(63, 63, 63));
    }

    #[test]
    fn points_stay_sorted() {
        let mut cg = ColorGradient::from(vec![
            GradientPoint::new(1.0, Color::WHITE),
            GradientPoint::new(0.0, Color::BLACK),
        ]);
        assert_eq!(cg.points()[0].location(), 0.0);

        let index = cg.add_point(GradientPoint::new(0.5, Color::RED));
        assert_eq!(index, 1);

        // Moving the first point past the last one reorders the list.
        assert_eq!(cg.set_point_location(0, 2.0), Some(2));
        assert_eq!(cg.points()[2].color(), Color::BLACK);
        assert_eq!(cg.points()[0].color(), Color::RED);
    }
}
