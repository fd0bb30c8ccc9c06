/// Map a raw reading into `[0, 1]` with the white background at 1.0.
///
/// Out-of-range readings are clamped; non-finite ones read as background.
#[inline]
pub fn normalize(raw: f32, white_is_high: bool) -> f32 {
    if !raw.is_finite() {
        return 1.0;
    }
    let v = raw.clamp(0.0, 1.0);
    if white_is_high { v } else { 1.0 - v }
}
