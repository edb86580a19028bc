//! Small validation helpers shared by config checking and the adapters.

/// Every byte is in `0x20..=0x7E` (space through tilde).
///
/// SSIDs, MQTT client IDs and anything echoed into logs must pass this.
pub(crate) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}
