use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Device, DeviceStatus, DeviceType, ParseEnumError, normalize};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_SERIAL_LEN: usize = 64;

/// The editable part of a device, sent as the body of create and update.
///
/// Optional text fields are kept as plain strings while editing; empty ones
/// are left out of the request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub status: DeviceStatus,
    pub address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub serial_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Client-side constraint violations, reported before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("name is required")]
    MissingName,
    #[error("name must be at most {} characters", MAX_NAME_LEN)]
    NameTooLong,
    #[error("address is required")]
    MissingAddress,
    #[error("serial number must be at most {} characters", MAX_SERIAL_LEN)]
    SerialTooLong,
    #[error("invalid value for {field}: {source}")]
    InvalidValue {
        field: &'static str,
        #[source]
        source: ParseEnumError,
    },
}

impl Default for DeviceDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            device_type: DeviceType::Other,
            status: DeviceStatus::Active,
            address: String::new(),
            location: String::new(),
            serial_number: String::new(),
            description: String::new(),
        }
    }
}

impl From<&Device> for DeviceDraft {
    fn from(device: &Device) -> Self {
        fn text(value: &Option<Box<str>>) -> String {
            value.as_deref().unwrap_or_default().to_string()
        }

        Self {
            name: device.name.to_string(),
            device_type: device.device_type,
            status: device.status,
            address: text(&device.address),
            location: text(&device.location),
            serial_number: text(&device.serial_number),
            description: text(&device.description),
        }
    }
}

impl DeviceDraft {
    /// Required-field and length checks. Returns the first violation found.
    pub fn validate(&self) -> Result<(), DraftError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DraftError::MissingName);
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(DraftError::NameTooLong);
        }
        if self.address.trim().is_empty() {
            return Err(DraftError::MissingAddress);
        }
        if self.serial_number.trim().chars().count() > MAX_SERIAL_LEN {
            return Err(DraftError::SerialTooLong);
        }

        Ok(())
    }

    /// Set a single field from user input.
    pub fn set(&mut self, field: DraftField, value: &str) -> Result<(), DraftError> {
        let value = value.trim();
        match field {
            DraftField::Name => self.name = value.to_string(),
            DraftField::Type => {
                self.device_type = value
                    .parse()
                    .map_err(|source| DraftError::InvalidValue {
                        field: "type",
                        source,
                    })?
            }
            DraftField::Status => {
                self.status = value
                    .parse()
                    .map_err(|source| DraftError::InvalidValue {
                        field: "status",
                        source,
                    })?
            }
            DraftField::Address => self.address = value.to_string(),
            DraftField::Location => self.location = value.to_string(),
            DraftField::SerialNumber => self.serial_number = value.to_string(),
            DraftField::Description => self.description = value.to_string(),
        }

        Ok(())
    }
}

/// Names of the draft fields, as typed by an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Name,
    Type,
    Status,
    Address,
    Location,
    SerialNumber,
    Description,
}

impl FromStr for DraftField {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "name" => Ok(DraftField::Name),
            "type" => Ok(DraftField::Type),
            "status" => Ok(DraftField::Status),
            "address" => Ok(DraftField::Address),
            "location" => Ok(DraftField::Location),
            "serial" | "serialnumber" => Ok(DraftField::SerialNumber),
            "description" => Ok(DraftField::Description),
            _ => Err(ParseEnumError {
                kind: "field",
                value: s.to_string(),
            }),
        }
    }
}
