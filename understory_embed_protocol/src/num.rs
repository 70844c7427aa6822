// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversions from script numbers (always `f64`) to pixel integers.
//!
//! Fractions truncate toward zero, out-of-range values saturate, and `NaN`
//! becomes zero, matching how script engines coerce numbers to integers.

#[allow(
    clippy::cast_possible_truncation,
    reason = "saturating float to int conversion is the intent"
)]
pub(crate) fn to_i32(v: f64) -> i32 {
    // `as` saturates and maps NaN to 0.
    v as i32
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "saturating float to int conversion is the intent"
)]
pub(crate) fn to_u32(v: f64) -> u32 {
    v as u32
}
