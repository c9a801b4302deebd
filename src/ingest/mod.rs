//! Spreadsheet ingestion: header resolution, brand detection, point-of-sale
//! lookup and the sheet-to-row mapping built on top of them.

pub mod brand;
pub mod columns;
pub mod mapper;
pub mod pdv;

pub use mapper::{IngestReport, MappedRows, SalesLayout, map_workbook};
pub use pdv::PdvLookup;
