/// Encode a signed 64-bit integer as 8 big-endian bytes.
///
/// This is the only integer encoding that feeds the hash functions, so it
/// must stay big-endian everywhere. The width is fixed at compile time,
/// which makes the conversion infallible.
pub fn int_to_bytes(num: i64) -> [u8; 8] {
    num.to_be_bytes()
}
