//! Output naming, photo transfer, and sidecar records.

mod naming;
pub mod progress;
mod sidecar;
mod transfer;
mod types;

pub use naming::{NamingOptions, disambiguate, output_name};
pub use sidecar::{read_sidecar, sidecar_path_for, write_sidecar};
pub use transfer::transfer_image;
pub use types::{AcceptedDetection, ImageRecord};
