//! Length conversions. All model geometry is in CSS pixels at 96 DPI.

pub const DPI: f32 = 96.0;

const TWIPS_PER_INCH: f32 = 1440.0;
const EMU_PER_INCH: f32 = 914_400.0;
const POINTS_PER_INCH: f32 = 72.0;

pub fn twips_to_pixels(twips: f32) -> f32 {
    twips * DPI / TWIPS_PER_INCH
}

pub fn pixels_to_twips(px: f32) -> f32 {
    px * TWIPS_PER_INCH / DPI
}

pub fn emu_to_pixels(emu: f32) -> f32 {
    emu * DPI / EMU_PER_INCH
}

pub fn points_to_pixels(pt: f32) -> f32 {
    pt * DPI / POINTS_PER_INCH
}

pub fn pixels_to_points(px: f32) -> f32 {
    px * POINTS_PER_INCH / DPI
}

/// `w:sz` and friends are expressed in half-points.
pub fn half_points_to_points(hp: f32) -> f32 {
    hp / 2.0
}

/// Border widths (`w:sz` on border elements) are in eighths of a point.
pub fn eighth_points_to_pixels(ep: f32) -> f32 {
    points_to_pixels(ep / 8.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twips_one_inch_is_96px() {
        assert_eq!(twips_to_pixels(0.0), 0.0);
        assert_eq!(twips_to_pixels(1440.0), 96.0);
        assert_eq!(pixels_to_twips(96.0), 1440.0);
    }

    #[test]
    fn twips_conversion_is_monotonic() {
        let mut prev = twips_to_pixels(0.0);
        for t in (1..5000).step_by(37) {
            let px = twips_to_pixels(t as f32);
            assert!(px > prev);
            prev = px;
        }
    }

    #[test]
    fn emu_and_points() {
        assert_eq!(emu_to_pixels(914_400.0), 96.0);
        assert_eq!(emu_to_pixels(9525.0), 1.0);
        assert_eq!(points_to_pixels(72.0), 96.0);
        assert_eq!(pixels_to_points(96.0), 72.0);
        assert_eq!(half_points_to_points(32.0), 16.0);
        assert_eq!(eighth_points_to_pixels(48.0), 8.0);
    }
}
