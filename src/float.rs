//! Decoders for the two non-IEEE float layouts.
//!
//! # 48-bit reals
//! The 6-byte Turbo Pascal `Real` layout: an 8-bit exponent biased by 0x81,
//! a 39-bit normalized mantissa, and one sign bit.  It cannot store
//! denormals, infinities, or NaN; an exponent byte of zero means the value
//! is zero.
//!
//! Little-endian byte layout:
//! `0: EEEEEEEE  1: MMMMMMMM  2: MMMMMMMM  3: MMMMMMMM  4: MMMMMMMM  5: SMMMMMMM`
//!
//! Value: `(-1)^S * 2^(E - 0x81) * 1.M`
//!
//! # 80-bit extended precision
//! The 10-byte x87 extended layout: one sign bit, a 15-bit exponent biased
//! by 0x3FFF, and a 64-bit mantissa split across two 32-bit words.  An
//! exponent of 0x7FFF is reserved: zero mantissa decodes to ±infinity,
//! anything else to NaN.
//!
//! Both decoders take the little-endian byte layout; callers reading the
//! big-endian variant reverse the raw bytes first.

/// Decode a 48-bit real.  The result is rounded to 4 decimal places.
pub(crate) fn float48(bytes: [u8; 6]) -> f64 {
    if bytes[0] == 0 {
        return 0.0;
    }
    let exponent = i32::from(bytes[0]) - 0x81;

    let mut mantissa = 0.0f64;
    for i in 1..=4 {
        mantissa = (mantissa + f64::from(bytes[i])) / 256.0;
    }
    mantissa = (mantissa + f64::from(bytes[5] & 0x7f)) / 128.0;
    mantissa += 1.0;

    if bytes[5] & 0x80 != 0 {
        mantissa = -mantissa;
    }

    let value = mantissa * f64::from(exponent).exp2();
    (value * 10_000.0).round() / 10_000.0
}

/// Decode an 80-bit extended-precision float.
pub(crate) fn float80(bytes: [u8; 10]) -> f64 {
    let high = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let low = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let a0 = bytes[9];
    let a1 = bytes[8];

    let sign = if a0 & 0x80 != 0 { -1.0f64 } else { 1.0 };
    let exponent = (u32::from(a0 & 0x7f) << 8) | u32::from(a1);

    if exponent == 0 && low == 0 && high == 0 {
        return 0.0;
    }

    // 0x7FFF is a reserved exponent value.
    if exponent == 0x7fff {
        if low == 0 && high == 0 {
            return sign * f64::INFINITY;
        }
        return f64::NAN;
    }

    let exponent = exponent as i32 - 0x3fff;
    let mut out = f64::from(low) * f64::from(exponent - 31).exp2();
    out += f64::from(high) * f64::from(exponent - 63).exp2();

    sign * out
}
