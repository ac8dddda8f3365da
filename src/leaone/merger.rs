use crate::leaone::units::{convert_impedance, convert_weight, round_mass};
use crate::models::{DeviceState, Fragment};

/// Fold fragments into a device state, in arrival order
///
/// Packet id and non-stabilized mass are overwritten by every fragment.
/// Stabilized mass and impedance are only overwritten by fragments that carry
/// an impedance reading; otherwise the last full reading is kept.
pub fn merge<I>(mut state: DeviceState, fragments: I) -> DeviceState
where
    I: IntoIterator<Item = Fragment>,
{
    for fragment in fragments {
        let mass = round_mass(convert_weight(fragment.weight_raw));

        state.packet_id = fragment.packet_id;
        state.non_stabilized_mass_kg = mass;

        if fragment.impedance_present {
            state.stabilized_mass_kg = Some(mass);
            state.impedance_ohm = Some(convert_impedance(fragment.impedance_raw));
        }
    }
    state
}
