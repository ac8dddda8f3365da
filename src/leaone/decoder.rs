/// Leaone scale payload decoding
use crate::error::PayloadError;
use crate::models::{CanonicalPayload, Fragment, VendorIdentifier, PAYLOAD_LEN};

/// Decode a 13-byte Leaone payload into a fragment
///
/// Payload layout (big-endian fields):
/// - Bytes 0-1: Weight (unsigned 16-bit, 0.1 lb resolution)
/// - Bytes 2-3: Impedance (unsigned 16-bit, 0.1 Ω resolution, 0 = not measured)
/// - Byte 4: Reserved
/// - Byte 5: Marker (not interpreted)
/// - Byte 6: Packet counter low byte
/// - Bytes 7-12: Hardware address echo (checked by the locator)
///
/// The packet counter high byte lives in the high byte of the identifier.
///
/// # Arguments
/// * `identifier` - Identifier reported alongside the payload
/// * `payload` - Payload bytes following the identifier
///
/// # Returns
/// The fragment, or `InvalidLength` if the payload is not exactly 13 bytes
pub fn decode(identifier: u16, payload: &[u8]) -> Result<Fragment, PayloadError> {
    let bytes: &[u8; PAYLOAD_LEN] = payload
        .try_into()
        .map_err(|_| PayloadError::InvalidLength {
            expected: PAYLOAD_LEN,
            actual: payload.len(),
        })?;

    Ok(decode_fields(VendorIdentifier::from_u16(identifier), bytes))
}

impl CanonicalPayload {
    pub fn decode(&self) -> Fragment {
        decode_fields(self.identifier, &self.bytes)
    }
}

fn decode_fields(identifier: VendorIdentifier, bytes: &[u8; PAYLOAD_LEN]) -> Fragment {
    let weight_raw = u16::from_be_bytes([bytes[0], bytes[1]]);
    let impedance_raw = u16::from_be_bytes([bytes[2], bytes[3]]);
    let sequence_low_byte = bytes[6];

    Fragment {
        sequence_low_byte,
        packet_id: u16::from_be_bytes([identifier.data, sequence_low_byte]),
        weight_raw,
        impedance_raw,
        impedance_present: impedance_raw != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NON_STABILIZED: &[u8] = b"\x06\xa4\x00\x00\x00\x020_Z\\R\xd3\x94";
    const STABILIZED: &[u8] = b"\x06\xa4\x13\x80\x00\x021_Z\\R\xd3\x94";

    #[test]
    fn decodes_weight_only_payload() {
        let fragment = decode(57280, NON_STABILIZED).unwrap();
        assert_eq!(
            fragment,
            Fragment {
                sequence_low_byte: 0x30,
                packet_id: 57136,
                weight_raw: 1700,
                impedance_raw: 0,
                impedance_present: false,
            }
        );
    }

    #[test]
    fn decodes_impedance_payload() {
        let fragment = decode(63424, STABILIZED).unwrap();
        assert_eq!(fragment.packet_id, 63281);
        assert_eq!(fragment.weight_raw, 1700);
        assert_eq!(fragment.impedance_raw, 0x1380);
        assert!(fragment.impedance_present);
    }

    #[test]
    fn packet_id_ignores_identifier_low_byte() {
        let a = decode(0x19C0, b"\x06\x8e\x00\x00\x00\x020_Z\\R\xd3\x94").unwrap();
        let b = decode(0x1900, b"\x06\x8e\x00\x00\x00\x020_Z\\R\xd3\x94").unwrap();
        assert_eq!(a.packet_id, 6448);
        assert_eq!(a, b);
    }

    #[test]
    fn marker_byte_is_not_validated() {
        let mut payload = NON_STABILIZED.to_vec();
        payload[4] = 0xAA;
        payload[5] = 0x7F;
        assert_eq!(
            decode(57280, &payload).unwrap(),
            decode(57280, NON_STABILIZED).unwrap()
        );
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            decode(57280, &NON_STABILIZED[..12]),
            Err(PayloadError::InvalidLength {
                expected: 13,
                actual: 12
            })
        );
        assert!(decode(57280, &[]).is_err());
    }

    #[test]
    fn decoding_is_deterministic() {
        assert_eq!(decode(63424, STABILIZED), decode(63424, STABILIZED));
    }
}
