//! Analytic configuration: rule lists, required fields, thresholds, reporting.
//!
//! An analytic file looks like:
//!
//! ```yaml
//! analytic_id: 77
//! analytic_name: Audit Test Workpaper Approvals
//! source:
//!   required_columns:
//!     - name: TW submitter
//!       alias: [Submitter, Prepared By]
//! validations:
//!   - rule: segregation_of_duties
//!     parameters:
//!       submitter_field: TW submitter
//!       approver_fields: [TL approver, AL approver]
//! thresholds:
//!   error_percentage: 5.0
//! reporting:
//!   group_by: AL approver
//! ```

mod analytic;
mod catalog;

pub use analytic::{
    AnalyticConfig, ReferenceSource, ReportingConfig, RuleConfig, RuleParameters, SourceConfig,
    Thresholds,
};
pub use catalog::ConfigCatalog;
