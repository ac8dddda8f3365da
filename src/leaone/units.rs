/// Kilograms per pound.
const KG_PER_LB: f64 = 0.45359237;

/// Convert a raw weight (tenths of a pound) to kilograms.
///
/// The protocol always carries pounds, whatever unit the scale displays.
pub fn convert_weight(raw: u16) -> f64 {
    (raw as f64 / 10.0) * KG_PER_LB
}

/// Convert a raw impedance (tenths of an ohm) to ohms.
pub fn convert_impedance(raw: u16) -> f64 {
    raw as f64 / 10.0
}

/// Round to two decimal places, the precision masses are reported at.
pub fn round_mass(kg: f64) -> f64 {
    (kg * 100.0).round() / 100.0
}
