//! UTF-16LE string descriptors.

use crate::types::DescriptorType;

/// LANGID for English (United States).
pub const LANGUAGE_ID_ENGLISH_US: u16 = 0x0409;

/// String descriptor 0: the table of supported language IDs.
pub static LANGUAGE_TABLE: [u8; 4] = [
    4,
    DescriptorType::String as u8,
    (LANGUAGE_ID_ENGLISH_US & 0xFF) as u8,
    (LANGUAGE_ID_ENGLISH_US >> 8) as u8,
];

/// Encode an ASCII string as a USB string descriptor.
///
/// `N` must equal `2 + 2 * text.len()`; a mismatch or a non-ASCII byte
/// fails const evaluation. Embedded NUL characters are encoded like any
/// other code unit and count toward the length.
///
/// ```
/// use usb2serial_descriptors::string_descriptor;
///
/// const HI: [u8; 6] = string_descriptor("Hi");
/// assert_eq!(HI, [6, 3, b'H', 0, b'i', 0]);
/// ```
#[must_use]
pub const fn string_descriptor<const N: usize>(text: &str) -> [u8; N] {
    let bytes = text.as_bytes();
    assert!(N == 2 + 2 * bytes.len(), "string descriptor size mismatch");
    assert!(N <= 0xFF, "string descriptor too long");

    let mut out = [0u8; N];
    out[0] = N as u8;
    out[1] = DescriptorType::String as u8;
    let mut i = 0;
    while i < bytes.len() {
        assert!(bytes[i] < 0x80, "string descriptor text must be ASCII");
        out[2 + 2 * i] = bytes[i];
        i += 1;
    }
    out
}

/// Decode an ASCII-range string descriptor into `out`.
///
/// Returns `None` if the descriptor is malformed, contains code units
/// outside ASCII, or does not fit in `out`.
pub fn decode_ascii<'b>(descriptor: &[u8], out: &'b mut [u8]) -> Option<&'b str> {
    let declared = usize::from(*descriptor.first()?);
    if declared != descriptor.len()
        || declared < 2
        || declared % 2 != 0
        || descriptor[1] != DescriptorType::String as u8
    {
        return None;
    }

    let units = descriptor[2..].chunks_exact(2);
    let count = units.len();
    if count > out.len() {
        return None;
    }

    for (slot, unit) in out.iter_mut().zip(units) {
        if unit[1] != 0 || unit[0] >= 0x80 {
            return None;
        }
        *slot = unit[0];
    }

    core::str::from_utf8(&out[..count]).ok()
}
