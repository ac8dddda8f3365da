use crate::models::HardwareAddress;

pub const MODEL: &str = "TZC4";
pub const MANUFACTURER: &str = "Leaone";

/// Build the display title: model, space, last two address bytes in hex.
pub fn format_title(model: &str, address: &HardwareAddress) -> String {
    let bytes = address.bytes();
    format!("{} {:02X}{:02X}", model, bytes[4], bytes[5])
}
