//! Span compositing.
//!
//! Blends a row of coverage spans into a surface. The blend amount of each
//! span is its coverage times the shape opacity; zero-coverage spans are
//! skipped so uncovered pixels are never touched.

use crate::blend::BlendMethod;
use crate::color::Rgba;
use crate::polyspan::SpanRow;
use crate::surface::Surface;

/// Composite `row` into `surface` at the row's y.
pub fn composite_row<S: Surface + ?Sized>(
    surface: &mut S,
    row: &SpanRow,
    color: &Rgba,
    opacity: f64,
    method: BlendMethod,
) {
    let y = row.y();
    for span in row.spans() {
        if span.cover <= 0.0 {
            continue;
        }
        let amount = span.cover * opacity;
        if span.len == 1 {
            surface.blend_pixel(span.x, y, color, amount, method);
        } else {
            surface.blend_hline(span.x, y, span.len, color, amount, method);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{CoverageMask, RgbaSurface};

    #[test]
    fn test_zero_coverage_untouched() {
        let mut s = RgbaSurface::filled(4, 1, Rgba::new(0.2, 0.2, 0.2, 1.0));
        let mut row = SpanRow::new();
        row.reset(0);
        row.push(0, 2, 0.0);
        row.push(2, 2, 1.0);
        composite_row(&mut s, &row, &Rgba::white(), 1.0, BlendMethod::Composite);
        assert_eq!(s.pixel(0, 0), Some(Rgba::new(0.2, 0.2, 0.2, 1.0)));
        assert_eq!(s.pixel(3, 0), Some(Rgba::white()));
    }

    #[test]
    fn test_amount_is_cover_times_opacity() {
        let mut m = CoverageMask::new(3, 1);
        let mut row = SpanRow::new();
        row.reset(0);
        row.push(0, 1, 0.5);
        row.push(1, 2, 1.0);
        composite_row(&mut m, &row, &Rgba::white(), 0.5, BlendMethod::Straight);
        assert_eq!(m.row(0), &[0.25, 0.5, 0.5]);
    }

    #[test]
    fn test_dyn_surface() {
        let mut s = RgbaSurface::new(2, 2);
        let mut row = SpanRow::new();
        row.reset(1);
        row.push(0, 2, 1.0);
        let dyn_s: &mut dyn Surface = &mut s;
        composite_row(dyn_s, &row, &Rgba::black(), 1.0, BlendMethod::Composite);
        assert_eq!(s.pixel(1, 1), Some(Rgba::black()));
        assert_eq!(s.pixel(1, 0), Some(Rgba::transparent()));
    }
}
