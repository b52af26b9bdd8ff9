pub mod cli;
pub mod cutter;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod pipeline;
pub mod sort;
pub mod stage;
pub mod transform;

pub use cli::{Cli, Command};
pub use cutter::{cut_sheet, CardImage};
pub use error::{Error, Result};
pub use geometry::{
    fit_dimensions, CellRect, CropCell, GridSpec, MarkOrientation, PageSpec, RegistrationMark,
};
pub use layout::{compose_page, compose_pages, paginate};
pub use pipeline::{list_images, OutputLayout, Pipeline};
pub use sort::natural_cmp;
pub use stage::{run_stage, FailurePolicy};
pub use transform::{crop_cell, resize_to_fit};
