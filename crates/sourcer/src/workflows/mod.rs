pub mod estimation;
pub mod pipeline;
pub mod report;
