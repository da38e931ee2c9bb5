pub mod draft;
pub mod query;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use draft::{DeviceDraft, DraftError, DraftField};
pub use query::{PageQuery, Sort, SortColumn, SortDirection};

// We use `Box<str>` for strings that are never edited in place. Records are
// replaced wholesale on every reload, so there is no reason to carry spare
// capacity around.
type BoxStr = Box<str>;

/// Identifiers are opaque to the console. The inventory API may hand them out
/// as strings or as integers, both are kept as text.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl RawId {
    fn into_text(self) -> BoxStr {
        match self {
            RawId::Text(text) => text.into_boxed_str(),
            RawId::Signed(n) => n.to_string().into_boxed_str(),
            RawId::Unsigned(n) => n.to_string().into_boxed_str(),
        }
    }
}

/// Stable identifier of a device, assigned by the inventory API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawId")]
pub struct DeviceId(pub BoxStr);

impl From<RawId> for DeviceId {
    fn from(raw: RawId) -> Self {
        DeviceId(raw.into_text())
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        DeviceId(id.into())
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a single audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawId")]
pub struct AuditId(pub BoxStr);

impl From<RawId> for AuditId {
    fn from(raw: RawId) -> Self {
        AuditId(raw.into_text())
    }
}

/// Error returned when a device type or status name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

// Accepts `ACCESS_POINT`, `access-point`, `AccessPoint` and `access point`.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Device classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    Router,
    Switch,
    Server,
    Firewall,
    AccessPoint,
    Sensor,
    Gateway,
    Other,
}

impl DeviceType {
    pub const ALL: [DeviceType; 8] = [
        DeviceType::Router,
        DeviceType::Switch,
        DeviceType::Server,
        DeviceType::Firewall,
        DeviceType::AccessPoint,
        DeviceType::Sensor,
        DeviceType::Gateway,
        DeviceType::Other,
    ];

    /// Name used on the wire, both in bodies and in the `type` query parameter.
    pub fn wire_name(&self) -> &'static str {
        match self {
            DeviceType::Router => "ROUTER",
            DeviceType::Switch => "SWITCH",
            DeviceType::Server => "SERVER",
            DeviceType::Firewall => "FIREWALL",
            DeviceType::AccessPoint => "ACCESS_POINT",
            DeviceType::Sensor => "SENSOR",
            DeviceType::Gateway => "GATEWAY",
            DeviceType::Other => "OTHER",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeviceType::Router => "Router",
            DeviceType::Switch => "Switch",
            DeviceType::Server => "Server",
            DeviceType::Firewall => "Firewall",
            DeviceType::AccessPoint => "Access point",
            DeviceType::Sensor => "Sensor",
            DeviceType::Gateway => "Gateway",
            DeviceType::Other => "Other",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DeviceType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        DeviceType::ALL
            .into_iter()
            .find(|kind| normalize(kind.wire_name()) == wanted)
            .ok_or_else(|| ParseEnumError {
                kind: "device type",
                value: s.to_string(),
            })
    }
}

/// Operational status of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    /// Device is in service.
    Active,
    /// Device is installed but switched off or unreachable.
    Inactive,
    /// Device is temporarily taken out of service.
    Maintenance,
    /// Device is retired and kept for the record only.
    Decommissioned,
}

impl DeviceStatus {
    pub const ALL: [DeviceStatus; 4] = [
        DeviceStatus::Active,
        DeviceStatus::Inactive,
        DeviceStatus::Maintenance,
        DeviceStatus::Decommissioned,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            DeviceStatus::Active => "ACTIVE",
            DeviceStatus::Inactive => "INACTIVE",
            DeviceStatus::Maintenance => "MAINTENANCE",
            DeviceStatus::Decommissioned => "DECOMMISSIONED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeviceStatus::Active => "Active",
            DeviceStatus::Inactive => "Inactive",
            DeviceStatus::Maintenance => "Maintenance",
            DeviceStatus::Decommissioned => "Decommissioned",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DeviceStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        DeviceStatus::ALL
            .into_iter()
            .find(|status| normalize(status.wire_name()) == wanted)
            .ok_or_else(|| ParseEnumError {
                kind: "device status",
                value: s.to_string(),
            })
    }
}

/// A device record as served by the inventory API.
///
/// The console only holds transient copies of these, for display and to
/// pre-fill the edit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Stable identity of this device.
    pub id: DeviceId,
    /// Human readable name.
    pub name: BoxStr,
    /// Type of the device.
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    /// Operational status.
    pub status: DeviceStatus,
    /// Network address (IP or hostname).
    #[serde(default)]
    pub address: Option<BoxStr>,
    /// Physical location, free text.
    #[serde(default)]
    pub location: Option<BoxStr>,
    #[serde(default)]
    pub serial_number: Option<BoxStr>,
    #[serde(default)]
    pub description: Option<BoxStr>,
    /// Creation timestamp.
    #[serde(
        default,
        deserialize_with = "timestamp::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<jiff::Timestamp>,
    /// Last modification timestamp.
    #[serde(
        default,
        deserialize_with = "timestamp::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<jiff::Timestamp>,
}

/// One entry of a device's audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: AuditId,
    /// What happened, e.g. `CREATE`, `UPDATE` or `DELETE`.
    pub action: BoxStr,
    /// Who did it, when the API knows.
    #[serde(default)]
    pub actor: Option<BoxStr>,
    #[serde(deserialize_with = "timestamp::required")]
    pub timestamp: jiff::Timestamp,
    #[serde(default)]
    pub details: Option<BoxStr>,
}

/// One page of a paginated collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
        }
    }
}

/// Timestamps arrive either as RFC 3339 instants or as offset-less local
/// date-times. The latter are read as UTC.
pub mod timestamp {
    use jiff::{Timestamp, civil::DateTime, tz::TimeZone};
    use serde::{Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Result<Timestamp, jiff::Error> {
        match raw.parse::<Timestamp>() {
            Ok(ts) => Ok(ts),
            Err(_) => Ok(raw.parse::<DateTime>()?.to_zoned(TimeZone::UTC)?.timestamp()),
        }
    }

    pub fn optional<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| parse(&s).map_err(serde::de::Error::custom))
            .transpose()
    }

    pub fn required<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}
