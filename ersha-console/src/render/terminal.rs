use std::fmt;
use std::io::{self, Write};

use ersha_core::SortDirection;
use tracing::error;

use crate::console::{Frame, Notice, View};
use crate::modal::Modal;
use crate::render::{PageLink, PaginationView, TableBody, TableView};

/// Draws frames as plain text on a terminal.
pub struct TerminalView<W> {
    out: W,
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> View for TerminalView<W> {
    fn render(&mut self, frame: &Frame) {
        let mut text = String::new();
        // Writing into a String cannot fail.
        let _ = write_frame(&mut text, frame);

        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            error!(error = %e, "failed to draw console");
        }
    }
}

fn arrow(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => " ^",
        SortDirection::Descending => " v",
    }
}

fn write_table(out: &mut impl fmt::Write, table: &TableView) -> fmt::Result {
    let labels: Vec<String> = table
        .header
        .iter()
        .map(|cell| format!("{}{}", cell.label, cell.sorted.map(arrow).unwrap_or_default()))
        .collect();

    let rows = match &table.body {
        TableBody::Loading => return writeln!(out, "Loading devices..."),
        TableBody::Error(message) => return writeln!(out, "Failed to load devices: {message}"),
        TableBody::Empty => {
            writeln!(out, "{}", labels.join("  "))?;
            return writeln!(out, "No devices match the current filters.");
        }
        TableBody::Rows(rows) => rows,
    };

    let mut widths: Vec<usize> = labels.iter().map(|label| label.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let id_width = rows.iter().map(|row| row.id.0.len()).max().unwrap_or(2).max(2);
    write!(out, "{:id_width$}  ", "ID")?;
    for (label, width) in labels.iter().zip(widths.iter().copied()) {
        write!(out, "{label:width$}  ")?;
    }
    writeln!(out)?;

    for row in rows {
        write!(out, "{:id_width$}  ", row.id.0)?;
        for (cell, width) in row.cells.iter().zip(widths.iter().copied()) {
            write!(out, "{cell:width$}  ")?;
        }
        writeln!(out)?;
    }

    if table.refreshing {
        writeln!(out, "(refreshing)")?;
    }
    Ok(())
}

fn write_pagination(out: &mut impl fmt::Write, pagination: &PaginationView) -> fmt::Result {
    if let Some(range) = pagination.range {
        writeln!(
            out,
            "Showing {}-{} of {}",
            range.first, range.last, range.total
        )?;
    }
    if pagination.is_hidden() {
        return Ok(());
    }

    let links: Vec<String> = pagination
        .links
        .iter()
        .map(|link| match link {
            PageLink::Page(page) if *page == pagination.current => format!("[{}]", page + 1),
            PageLink::Page(page) => (page + 1).to_string(),
            PageLink::Ellipsis => "...".to_string(),
        })
        .collect();

    let previous = if pagination.previous.is_some() { "< prev" } else { "" };
    let next = if pagination.next.is_some() { "next >" } else { "" };
    writeln!(out, "{previous}  {}  {next}", links.join(" "))
}

fn write_modal(out: &mut impl fmt::Write, modal: &Modal, trigger_enabled: bool) -> fmt::Result {
    let busy = if trigger_enabled { "" } else { " (working...)" };

    match modal {
        Modal::Closed => Ok(()),
        Modal::Opening { id } => writeln!(out, "Opening device {id}...{busy}"),
        Modal::Create { draft, error } | Modal::Edit { draft, error, .. } => {
            let title = match modal {
                Modal::Edit { id, .. } => format!("Edit device {id}"),
                _ => "New device".to_string(),
            };
            writeln!(out, "== {title}{busy} ==")?;
            writeln!(out, "  name:        {}", draft.name)?;
            writeln!(out, "  type:        {}", draft.device_type.label())?;
            writeln!(out, "  status:      {}", draft.status.label())?;
            writeln!(out, "  address:     {}", draft.address)?;
            writeln!(out, "  location:    {}", draft.location)?;
            writeln!(out, "  serial:      {}", draft.serial_number)?;
            writeln!(out, "  description: {}", draft.description)?;
            if let Some(error) = error {
                writeln!(out, "  ! {error}")?;
            }
            writeln!(out, "  (set <field> <value>, save, cancel)")
        }
        Modal::ConfirmDelete { id, name, error } => {
            let name = name.as_deref().unwrap_or("this device");
            writeln!(out, "Delete {name} ({id})?{busy} (confirm, cancel)")?;
            if let Some(error) = error {
                writeln!(out, "  ! {error}")?;
            }
            Ok(())
        }
        Modal::Audit { id, entries } => {
            writeln!(out, "== Audit log of {id} ==")?;
            if entries.is_empty() {
                writeln!(out, "  no entries")?;
            }
            for entry in entries {
                write!(
                    out,
                    "  {}  {:<8} {}",
                    entry.timestamp.strftime("%Y-%m-%d %H:%M:%S"),
                    entry.action,
                    entry.actor.as_deref().unwrap_or("-")
                )?;
                if let Some(details) = &entry.details {
                    write!(out, "  {details}")?;
                }
                writeln!(out)?;
            }
            writeln!(out, "  (cancel to close)")
        }
    }
}

pub fn write_frame(out: &mut impl fmt::Write, frame: &Frame) -> fmt::Result {
    writeln!(out)?;
    write_table(out, &frame.table)?;
    write_pagination(out, &frame.pagination)?;

    if frame.search_pending {
        writeln!(out, "searching...")?;
    } else if !frame.search_text.trim().is_empty() {
        writeln!(out, "search: {}", frame.search_text.trim())?;
    }

    write_modal(out, &frame.modal, frame.trigger_enabled)?;

    match &frame.notice {
        Some(Notice::Info(message)) => writeln!(out, "{message}")?,
        Some(Notice::Error(message)) => writeln!(out, "error: {message}")?,
        None => {}
    }
    write!(out, "> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ItemRange, TableRow, header};
    use crate::query::QueryState;
    use ersha_core::DeviceId;

    fn frame(body: TableBody) -> Frame {
        Frame {
            table: TableView {
                header: header(&QueryState::default()),
                body,
                refreshing: false,
            },
            pagination: PaginationView::default(),
            modal: Modal::Closed,
            trigger_enabled: true,
            search_pending: false,
            search_text: String::new(),
            notice: None,
        }
    }

    fn draw(frame: &Frame) -> String {
        let mut view = TerminalView::new(Vec::new());
        view.render(frame);
        String::from_utf8(view.into_inner()).unwrap()
    }

    #[test]
    fn empty_and_error_views_differ() {
        let empty = draw(&frame(TableBody::Empty));
        assert!(empty.contains("No devices match"));

        let failed = draw(&frame(TableBody::Error("timed out".to_string())));
        assert!(failed.contains("Failed to load devices: timed out"));
        assert!(!failed.contains("No devices match"));
    }

    #[test]
    fn rows_and_pagination_are_drawn() {
        let mut frame = frame(TableBody::Rows(vec![TableRow {
            id: DeviceId::from("7"),
            cells: ["gw-7", "Gateway", "Active", "10.0.0.7", "-", "-"]
                .map(String::from)
                .to_vec(),
        }]));
        frame.pagination = PaginationView {
            links: vec![PageLink::Page(0), PageLink::Page(1)],
            current: 1,
            previous: Some(0),
            next: None,
            range: Some(ItemRange {
                first: 21,
                last: 21,
                total: 21,
            }),
        };
        frame.notice = Some(Notice::Info("saved gw-7".to_string()));

        let text = draw(&frame);
        assert!(text.contains("Updated v"));
        assert!(text.contains("gw-7"));
        assert!(text.contains("Showing 21-21 of 21"));
        assert!(text.contains("< prev  1 [2]"));
        assert!(text.contains("saved gw-7"));
    }
}
