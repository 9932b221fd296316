pub mod apply;
pub mod browse;
pub mod commit;
pub mod conflict;
pub mod fingerprint;
pub mod update_pipeline;

pub use apply::ApplyReport;
pub use browse::{describe_database, list_measures};
pub use commit::CommitStatus;
pub use update_pipeline::MeasureUpdatePipeline;
