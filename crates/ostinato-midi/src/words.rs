//! Bit extraction helpers for 32-bit UMP words.
//!
//! Byte 0 is the most significant byte of the word, matching the UMP layout
//! where the message-type nibble sits in bits 31-28.

/// Most significant byte (bits 31-24).
#[inline]
pub fn b0(word: u32) -> u8 {
    (word >> 24) as u8
}

/// Byte 1 (bits 23-16).
#[inline]
pub fn b1(word: u32) -> u8 {
    (word >> 16) as u8
}

/// Byte 2 (bits 15-8).
#[inline]
pub fn b2(word: u32) -> u8 {
    (word >> 8) as u8
}

/// Least significant byte (bits 7-0).
#[inline]
pub fn b3(word: u32) -> u8 {
    word as u8
}

/// High 16 bits.
#[inline]
pub fn s0(word: u32) -> u16 {
    (word >> 16) as u16
}

/// Low 16 bits.
#[inline]
pub fn s1(word: u32) -> u16 {
    word as u16
}

#[inline]
pub fn high_nibble(byte: u8) -> u8 {
    byte >> 4
}

#[inline]
pub fn low_nibble(byte: u8) -> u8 {
    byte & 0x0F
}

/// Reconstruct a legacy 14-bit value from its 7-bit halves.
#[inline]
pub fn word14(msb: u8, lsb: u8) -> u16 {
    ((msb as u16) << 7) | lsb as u16
}
