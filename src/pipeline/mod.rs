//! Batch pipeline: enumerate, detect, filter, name, write.

mod batch;
mod coordinator;
mod filter;
mod stats;

pub use batch::{BatchOptions, BatchPhase, BatchState, ImageOutcome, process_image, run_batch};
pub use coordinator::{collect_input_images, is_image_file};
pub use filter::{AllowList, build_allow_list, filter_detections};
pub use stats::{RunStatistics, RunSummary};
