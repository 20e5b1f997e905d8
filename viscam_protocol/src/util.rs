//! # Internal utilities

/// Spreads a `u16` over four bytes, one hex digit in the low nibble of each
/// byte, most significant digit first.
///
/// VISCA uses this for positions: `0x1234` becomes `01 02 03 04`.
pub const fn to_nibbles(v: u16) -> [u8; 4] {
    [
        ((v >> 12) & 0xf) as u8,
        ((v >> 8) & 0xf) as u8,
        ((v >> 4) & 0xf) as u8,
        (v & 0xf) as u8,
    ]
}

/// Reverses [to_nibbles]. High nibbles are ignored.
pub const fn from_nibbles(b: [u8; 4]) -> u16 {
    ((b[0] as u16 & 0xf) << 12)
        | ((b[1] as u16 & 0xf) << 8)
        | ((b[2] as u16 & 0xf) << 4)
        | (b[3] as u16 & 0xf)
}

/// Rounds to the nearest integer (halves go up, like a joystick axis would
/// expect), then clamps to `-limit..=limit`.
///
/// `NaN` maps to `0`.
pub fn round_clamp(v: f64, limit: u8) -> i16 {
    if v.is_nan() {
        return 0;
    }
    let limit = f64::from(limit);
    (v + 0.5).floor().clamp(-limit, limit) as i16
}
