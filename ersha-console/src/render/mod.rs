//! Pure functions from controller state to what gets drawn.

mod pagination;
mod table;
pub mod terminal;

pub use pagination::{
    ItemRange, MAX_UNCOMPRESSED, NEIGHBOURS, PageLink, PaginationView, page_links,
    render_pagination,
};
pub use table::{COLUMNS, HeaderCell, TableBody, TableRow, TableView, header, render_table};
pub use terminal::TerminalView;
