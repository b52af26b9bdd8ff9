use image::DynamicImage;
use tracing::{debug, info};

use crate::error::Result;
use crate::geometry::{CropCell, GridSpec};
use crate::stage::{run_stage, FailurePolicy};
use crate::transform::crop_cell;

/// An artwork cut from a sheet
#[derive(Debug, Clone)]
pub struct CardImage {
    pub id: String,
    pub cell: CropCell,
    pub image: DynamicImage,
}

/// Slice `sheet` into one image per non-skipped cell of `grid`.
///
/// The grid is validated before anything is cut. Cells that fall outside the sheet
/// are logged and left out; the rest come back in index order.
pub fn cut_sheet(sheet: &DynamicImage, grid: &GridSpec, stem: &str) -> Result<Vec<CardImage>> {
    let cells = grid.cells(sheet.width(), sheet.height())?;

    info!(
        width = sheet.width(),
        height = sheet.height(),
        columns = grid.columns,
        rows = grid.rows,
        "cutting sheet"
    );
    for index in &grid.skip {
        if u64::from(*index) < grid.cell_count() {
            info!(index = *index, "skipped");
        }
    }

    run_stage("crop", cells, FailurePolicy::Isolate, |cell| {
        debug!(
            index = cell.index,
            row = cell.row,
            col = cell.col,
            rect = %cell.rect,
            "crop"
        );
        Ok(CardImage {
            id: cell.identifier(stem),
            cell,
            image: crop_cell(sheet, cell.rect)?,
        })
    })
}
