use std::fmt;
use std::str::FromStr;

use crate::{DeviceStatus, DeviceType, ParseEnumError, normalize};

/// Columns the collection endpoint can sort on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Name,
    Type,
    Status,
    Address,
    Location,
    UpdatedAt,
}

impl SortColumn {
    pub const ALL: [SortColumn; 6] = [
        SortColumn::Name,
        SortColumn::Type,
        SortColumn::Status,
        SortColumn::Address,
        SortColumn::Location,
        SortColumn::UpdatedAt,
    ];

    /// Field name expected in the `sort` query parameter.
    pub fn field_name(&self) -> &'static str {
        match self {
            SortColumn::Name => "name",
            SortColumn::Type => "type",
            SortColumn::Status => "status",
            SortColumn::Address => "address",
            SortColumn::Location => "location",
            SortColumn::UpdatedAt => "updatedAt",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortColumn::Name => "Name",
            SortColumn::Type => "Type",
            SortColumn::Status => "Status",
            SortColumn::Address => "Address",
            SortColumn::Location => "Location",
            SortColumn::UpdatedAt => "Updated",
        }
    }
}

impl FromStr for SortColumn {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        SortColumn::ALL
            .into_iter()
            .find(|column| {
                normalize(column.field_name()) == wanted || normalize(column.label()) == wanted
            })
            .ok_or_else(|| ParseEnumError {
                kind: "sort column",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn wire_name(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// A sort column together with its direction. They only ever travel as a
/// pair, so there is no way to express a sort without a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sort {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::new(SortColumn::UpdatedAt, SortDirection::Descending)
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{}",
            self.column.field_name(),
            self.direction.wire_name()
        )
    }
}

/// Everything the collection endpoint needs to serve one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// Zero-based page index.
    pub page: usize,
    pub size: usize,
    pub sort: Sort,
    pub status: Option<DeviceStatus>,
    pub device_type: Option<DeviceType>,
    /// Free-text search, already trimmed. `None` when blank.
    pub q: Option<String>,
}

impl PageQuery {
    /// Query string pairs in the order the API documents them. Absent filters
    /// are omitted rather than sent empty.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
            ("sort", self.sort.to_string()),
        ];

        if let Some(status) = self.status {
            params.push(("status", status.wire_name().to_string()));
        }
        if let Some(device_type) = self.device_type {
            params.push(("type", device_type.wire_name().to_string()));
        }
        if let Some(q) = &self.q {
            params.push(("q", q.clone()));
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_skip_absent_filters() {
        let query = PageQuery {
            page: 2,
            size: 20,
            sort: Sort::new(SortColumn::Name, SortDirection::Ascending),
            status: None,
            device_type: None,
            q: None,
        };

        assert_eq!(
            query.to_params(),
            vec![
                ("page", "2".to_string()),
                ("size", "20".to_string()),
                ("sort", "name,asc".to_string()),
            ]
        );
    }

    #[test]
    fn params_carry_filters_in_wire_form() {
        let query = PageQuery {
            page: 0,
            size: 50,
            sort: Sort::default(),
            status: Some(DeviceStatus::Maintenance),
            device_type: Some(DeviceType::AccessPoint),
            q: Some("lobby".to_string()),
        };

        let params = query.to_params();
        assert!(params.contains(&("sort", "updatedAt,desc".to_string())));
        assert!(params.contains(&("status", "MAINTENANCE".to_string())));
        assert!(params.contains(&("type", "ACCESS_POINT".to_string())));
        assert!(params.contains(&("q", "lobby".to_string())));
    }

    #[test]
    fn sort_column_parses_field_or_label() {
        assert_eq!("updatedAt".parse::<SortColumn>(), Ok(SortColumn::UpdatedAt));
        assert_eq!("updated".parse::<SortColumn>(), Ok(SortColumn::UpdatedAt));
        assert_eq!("NAME".parse::<SortColumn>(), Ok(SortColumn::Name));
        assert!("color".parse::<SortColumn>().is_err());
    }
}
