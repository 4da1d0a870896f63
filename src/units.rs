//! Physical-unit conversions.
//!
//! The whole model works in millimeters; device pixels only appear at the
//! pointer-input boundary. The screen ratio is fixed: CSS renders 1mm as
//! 96/25.4 ≈ 3.78px, and the host supplies pointer coordinates in that same
//! device-pixel space.

/// Device pixels per millimeter at 96dpi.
pub const MM_TO_PX: f64 = 3.78;

/// Device pixels per typographic point (1/72 inch) at 96dpi.
pub const PT_TO_PX: f64 = 96.0 / 72.0;

pub fn mm_to_px(mm: f64) -> f64 {
    mm * MM_TO_PX
}

pub fn px_to_mm(px: f64) -> f64 {
    px / MM_TO_PX
}

pub fn pt_to_px(pt: f64) -> f64 {
    pt * PT_TO_PX
}
