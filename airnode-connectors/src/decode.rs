//! Slot naming: the out-of-band half of the wire contract
//!
//! A frame carries positions, not names — which index is temperature and
//! which is dose rate is fixed per deployment and agreed out of band. The
//! [`SlotSchema`] is that agreement in code: an ordered list of field names,
//! one per slot, used to turn a decoded record into a JSON object.
//!
//! Presets cover the fielded layouts; anything else is a custom name list.

use airnode_core::record::TelemetryRecord;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Schema/record mismatch.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaError {
    /// The schema names a different number of slots than the record has.
    #[error("schema has {schema} names but record has {record} slots")]
    SlotCount {
        /// Names in the schema.
        schema: usize,
        /// Slots in the record.
        record: usize,
    },
}

/// Ordered slot names for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSchema {
    names: Vec<String>,
}

impl SlotSchema {
    /// Schema from an explicit name list.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The original 3-slot climate layout.
    pub fn climate() -> Self {
        Self::new(["temperature", "humidity", "pressure"])
    }

    /// The 4-slot layout adding the Geiger tube's dose rate.
    pub fn climate_with_dose() -> Self {
        Self::new(["temperature", "humidity", "pressure", "dose_rate"])
    }

    /// The 7-slot layout adding particulate mass concentrations.
    pub fn air_quality() -> Self {
        Self::new([
            "temperature",
            "humidity",
            "pressure",
            "dose_rate",
            "pm1_0",
            "pm2_5",
            "pm10",
        ])
    }

    /// Number of slots this schema names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the schema is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Slot names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Decode a record into a JSON object in schema order.
    ///
    /// Non-finite slot values become JSON `null` — a NaN that made it
    /// through the checksum is still not representable as a JSON number.
    pub fn decode<const N: usize>(
        &self,
        record: &TelemetryRecord<N>,
    ) -> Result<Map<String, Value>, SchemaError> {
        if self.names.len() != N {
            return Err(SchemaError::SlotCount {
                schema: self.names.len(),
                record: N,
            });
        }

        let mut fields = Map::with_capacity(N);
        for (name, &value) in self.names.iter().zip(record.slots().iter()) {
            let json_value = if value.is_finite() {
                json!(value)
            } else {
                Value::Null
            };
            fields.insert(name.clone(), json_value);
        }
        Ok(fields)
    }
}
