use ersha_core::{Device, DeviceId, SortColumn, SortDirection};

use crate::controller::{LoadState, ResultSummary};
use crate::query::QueryState;

/// Columns in display order.
pub const COLUMNS: [SortColumn; 6] = SortColumn::ALL;

const MISSING: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub column: SortColumn,
    pub label: &'static str,
    /// Set on the column the list is sorted by.
    pub sorted: Option<SortDirection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub id: DeviceId,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableBody {
    /// Nothing to show yet.
    Loading,
    /// The last reload failed.
    Error(String),
    /// The reload succeeded with zero matches.
    Empty,
    Rows(Vec<TableRow>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub header: Vec<HeaderCell>,
    pub body: TableBody,
    /// A reload is in flight while older rows are still shown.
    pub refreshing: bool,
}

fn cell(device: &Device, column: SortColumn) -> String {
    let text = |value: &Option<Box<str>>| value.as_deref().unwrap_or(MISSING).to_string();

    match column {
        SortColumn::Name => device.name.to_string(),
        SortColumn::Type => device.device_type.label().to_string(),
        SortColumn::Status => device.status.label().to_string(),
        SortColumn::Address => text(&device.address),
        SortColumn::Location => text(&device.location),
        SortColumn::UpdatedAt => device
            .updated_at
            .map(|ts| ts.strftime("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| MISSING.to_string()),
    }
}

pub fn header(query: &QueryState) -> Vec<HeaderCell> {
    let sort = query.sort();
    COLUMNS
        .into_iter()
        .map(|column| HeaderCell {
            column,
            label: column.label(),
            sorted: (column == sort.column).then_some(sort.direction),
        })
        .collect()
}

/// Derive the table from the controller's current state.
///
/// Rows keep the server's order.
pub fn render_table(
    state: &LoadState,
    summary: Option<&ResultSummary>,
    query: &QueryState,
) -> TableView {
    let body = match (state, summary) {
        (LoadState::Errored(err), _) => TableBody::Error(err.to_string()),
        (_, None) => TableBody::Loading,
        (_, Some(summary)) if summary.items.is_empty() => TableBody::Empty,
        (_, Some(summary)) => TableBody::Rows(
            summary
                .items
                .iter()
                .map(|device| TableRow {
                    id: device.id.clone(),
                    cells: COLUMNS.iter().map(|column| cell(device, *column)).collect(),
                })
                .collect(),
        ),
    };

    TableView {
        header: header(query),
        refreshing: matches!(state, LoadState::Loading) && summary.is_some(),
        body,
    }
}
