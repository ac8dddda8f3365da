/// Locating the vendor payload inside an advertisement
use log::{debug, trace};

use crate::error::PayloadError;
use crate::models::{
    CanonicalPayload, HardwareAddress, VendorIdentifier, ADDRESS_LEN, PAYLOAD_LEN,
};

/// AD type of a manufacturer specific data element.
const AD_TYPE_MANUFACTURER_DATA: u8 = 0xFF;

/// Identifier plus payload, as framed on air.
const IDENTIFIER_LEN: usize = 2;

/// Find every valid payload in an advertisement
///
/// When `raw` is present it is authoritative and the pre-split map is not
/// consulted. Candidates that are malformed or carry another device's
/// address are dropped without affecting the rest.
///
/// # Arguments
/// * `raw` - Full advertising data, if the backend exposes it
/// * `manufacturer_data` - Manufacturer data entries as split by the backend
/// * `address` - Hardware address the payloads must echo
///
/// # Returns
/// Canonical payloads in advertisement order (possibly empty)
pub fn locate(
    raw: Option<&[u8]>,
    manufacturer_data: &[(u16, Vec<u8>)],
    address: &HardwareAddress,
) -> Vec<CanonicalPayload> {
    let candidates: Vec<Result<CanonicalPayload, PayloadError>> = match raw {
        Some(raw) => manufacturer_elements(raw)
            .map(|element| locate_element(element, address))
            .collect(),
        None => manufacturer_data
            .iter()
            .map(|(identifier, data)| locate_entry(*identifier, data, address))
            .collect(),
    };

    candidates
        .into_iter()
        .filter_map(|candidate| match candidate {
            Ok(payload) => {
                trace!(
                    "Located payload for {}: id=0x{:04X} {:02X?}",
                    address,
                    payload.identifier.as_u16(),
                    payload.bytes
                );
                Some(payload)
            }
            Err(e) => {
                debug!("Dropping candidate payload for {}: {}", address, e);
                None
            }
        })
        .collect()
}

/// Walk `[len][type][data]` structures and yield manufacturer data bodies.
fn manufacturer_elements(raw: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut i = 0usize;
    std::iter::from_fn(move || {
        while i < raw.len() {
            let len = raw[i] as usize;
            i += 1;
            if len == 0 {
                continue;
            }
            if i + len > raw.len() {
                i = raw.len();
                return None;
            }
            let ty = raw[i];
            let data = &raw[i + 1..i + len];
            i += len;
            if ty == AD_TYPE_MANUFACTURER_DATA {
                return Some(data);
            }
        }
        None
    })
}

/// A raw element body: little-endian identifier followed by the payload.
fn locate_element(
    element: &[u8],
    address: &HardwareAddress,
) -> Result<CanonicalPayload, PayloadError> {
    if element.len() != IDENTIFIER_LEN + PAYLOAD_LEN {
        return Err(PayloadError::InvalidLength {
            expected: IDENTIFIER_LEN + PAYLOAD_LEN,
            actual: element.len(),
        });
    }
    let identifier = u16::from_le_bytes([element[0], element[1]]);
    canonicalize(
        VendorIdentifier::from_u16(identifier).data,
        &element[IDENTIFIER_LEN..],
        address,
    )
}

/// A backend-split entry.
///
/// Backends that honour the 2-byte identifier hand over the 13-byte payload
/// and keep the counter high byte in the identifier. Backends that end the
/// identifier one byte early leave that byte at the front of the data.
fn locate_entry(
    identifier: u16,
    data: &[u8],
    address: &HardwareAddress,
) -> Result<CanonicalPayload, PayloadError> {
    match data.len() {
        PAYLOAD_LEN => canonicalize(VendorIdentifier::from_u16(identifier).data, data, address),
        n if n == PAYLOAD_LEN + 1 => canonicalize(data[0], &data[1..], address),
        actual => Err(PayloadError::InvalidLength {
            expected: PAYLOAD_LEN,
            actual,
        }),
    }
}

fn canonicalize(
    counter_high: u8,
    payload: &[u8],
    address: &HardwareAddress,
) -> Result<CanonicalPayload, PayloadError> {
    let bytes: [u8; PAYLOAD_LEN] = payload
        .try_into()
        .map_err(|_| PayloadError::InvalidLength {
            expected: PAYLOAD_LEN,
            actual: payload.len(),
        })?;

    let echo = &bytes[PAYLOAD_LEN - ADDRESS_LEN..];
    if echo != address.bytes() {
        return Err(PayloadError::AddressMismatch {
            expected: address.to_string(),
            found: format!("{:02X?}", echo),
        });
    }

    Ok(CanonicalPayload {
        identifier: VendorIdentifier::with_data(counter_high),
        bytes,
    })
}
