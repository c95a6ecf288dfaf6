//! Grouped summary statistics over a classified table.

mod aggregator;

pub use aggregator::{
    GroupOrder, Summary, SummaryAggregator, SummaryRow, EXCEEDS_COLUMN, PERCENTAGE_COLUMN,
    TOTAL_COLUMN,
};
