/// Rendering snapshots as typed sensor descriptions and values
use std::collections::BTreeMap;
use std::fmt;

use crate::models::Snapshot;

/// Identifies one reported entity of a scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceKey {
    PacketId,
    NonStabilizedMass,
    Mass,
    Impedance,
    SignalStrength,
}

impl DeviceKey {
    pub fn key(&self) -> &'static str {
        match self {
            DeviceKey::PacketId => "packet_id",
            DeviceKey::NonStabilizedMass => "non_stabilized_mass",
            DeviceKey::Mass => "mass",
            DeviceKey::Impedance => "impedance",
            DeviceKey::SignalStrength => "signal_strength",
        }
    }

    /// Human readable entity name.
    pub fn name(&self) -> &'static str {
        match self {
            DeviceKey::PacketId => "Packet Id",
            DeviceKey::NonStabilizedMass => "Non Stabilized Mass",
            DeviceKey::Mass => "Mass",
            DeviceKey::Impedance => "Impedance",
            DeviceKey::SignalStrength => "Signal Strength",
        }
    }

    pub fn device_class(&self) -> SensorDeviceClass {
        match self {
            DeviceKey::PacketId => SensorDeviceClass::PacketId,
            DeviceKey::NonStabilizedMass => SensorDeviceClass::MassNonStabilized,
            DeviceKey::Mass => SensorDeviceClass::Mass,
            DeviceKey::Impedance => SensorDeviceClass::Impedance,
            DeviceKey::SignalStrength => SensorDeviceClass::SignalStrength,
        }
    }

    pub fn unit(&self) -> Option<Units> {
        match self {
            DeviceKey::PacketId => None,
            DeviceKey::NonStabilizedMass | DeviceKey::Mass => Some(Units::MassKilograms),
            DeviceKey::Impedance => Some(Units::Ohm),
            DeviceKey::SignalStrength => Some(Units::SignalStrengthDecibelsMilliwatt),
        }
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorDeviceClass {
    PacketId,
    MassNonStabilized,
    Mass,
    Impedance,
    SignalStrength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    MassKilograms,
    Ohm,
    SignalStrengthDecibelsMilliwatt,
}

impl Units {
    pub fn symbol(&self) -> &'static str {
        match self {
            Units::MassKilograms => "kg",
            Units::Ohm => "Ω",
            Units::SignalStrengthDecibelsMilliwatt => "dBm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeValue {
    Integer(i64),
    Float(f64),
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Integer(v) => write!(f, "{}", v),
            NativeValue::Float(v) => write!(f, "{:.2}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorDescription {
    pub device_key: DeviceKey,
    pub device_class: SensorDeviceClass,
    pub native_unit_of_measurement: Option<Units>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorValue {
    pub device_key: DeviceKey,
    pub name: &'static str,
    pub native_value: NativeValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub name: String,
    pub model: &'static str,
    pub manufacturer: &'static str,
}

/// Everything a consumer needs to render one scale.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorUpdate {
    pub title: String,
    pub device: DeviceInfo,
    pub entity_descriptions: BTreeMap<DeviceKey, SensorDescription>,
    pub entity_values: BTreeMap<DeviceKey, SensorValue>,
}

impl SensorUpdate {
    fn push(&mut self, key: DeviceKey, value: NativeValue) {
        self.entity_descriptions.insert(
            key,
            SensorDescription {
                device_key: key,
                device_class: key.device_class(),
                native_unit_of_measurement: key.unit(),
            },
        );
        self.entity_values.insert(
            key,
            SensorValue {
                device_key: key,
                name: key.name(),
                native_value: value,
            },
        );
    }

    pub fn value(&self, key: DeviceKey) -> Option<NativeValue> {
        self.entity_values.get(&key).map(|v| v.native_value)
    }
}

impl From<&Snapshot> for SensorUpdate {
    fn from(snapshot: &Snapshot) -> Self {
        let mut update = SensorUpdate {
            title: snapshot.title.clone(),
            device: DeviceInfo {
                name: snapshot.name.clone(),
                model: snapshot.model,
                manufacturer: snapshot.manufacturer,
            },
            entity_descriptions: BTreeMap::new(),
            entity_values: BTreeMap::new(),
        };

        update.push(
            DeviceKey::PacketId,
            NativeValue::Integer(snapshot.packet_id.into()),
        );
        update.push(
            DeviceKey::NonStabilizedMass,
            NativeValue::Float(snapshot.non_stabilized_mass_kg),
        );
        update.push(
            DeviceKey::SignalStrength,
            NativeValue::Integer(snapshot.signal_strength.into()),
        );
        if let Some(mass) = snapshot.stabilized_mass_kg {
            update.push(DeviceKey::Mass, NativeValue::Float(mass));
        }
        if let Some(impedance) = snapshot.impedance_ohm {
            update.push(DeviceKey::Impedance, NativeValue::Float(impedance));
        }

        update
    }
}
