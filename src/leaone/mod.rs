pub mod decoder;
pub mod identity;
pub mod locator;
pub mod merger;
pub mod parser;
pub mod units;

pub use decoder::decode;
pub use identity::{format_title, MANUFACTURER, MODEL};
pub use locator::locate;
pub use merger::merge;
pub use parser::{snapshot, LeaoneDeviceData};
pub use units::{convert_impedance, convert_weight};
