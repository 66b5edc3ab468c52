//! Sale records and the reports built from them.
//!
//! This module contains everything related to sales:
//! - The `Sale` model and database functions for storing and clearing sales
//! - The paginated sales listing
//! - The monthly statistics, bar chart, pie chart and combined reports

mod bar_chart;
mod combined;
mod core;
mod list;
mod pie_chart;
mod report;
mod statistics;

pub use bar_chart::{
    BAND_COUNT, BAND_LABELS, PriceBand, band_index, get_bar_chart, get_bar_chart_endpoint,
};
pub use combined::{CombinedReport, get_combined_report, get_combined_report_endpoint};
pub use core::{
    NewSale, SALE_COLUMNS, Sale, count_sales, create_sale_table, delete_all_sales, fold_case,
    from_unix_millis, insert_sales, map_sale_row,
};
pub use list::{ListSalesQuery, ListSalesState, SaleFilter, get_sales_endpoint, list_sales};
pub use pie_chart::{CategoryCount, get_pie_chart, get_pie_chart_endpoint};
pub use report::ReportState;
pub use statistics::{Statistics, get_statistics, get_statistics_endpoint};
