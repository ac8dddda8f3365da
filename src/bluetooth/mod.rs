pub mod collector;
pub mod scanner;

pub use collector::ManufacturerDataTracker;
pub use scanner::scan_for_scales;
