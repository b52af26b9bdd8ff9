use std::collections::BTreeSet;
use std::fmt;

use image::Rgba;

use crate::error::{Error, Result};

/// Cards per row (and per column) of a page
pub const GRID_SIDE: u32 = 3;
pub const CARDS_PER_PAGE: usize = (GRID_SIDE * GRID_SIDE) as usize;

/// How a source sheet is divided into cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSpec {
    pub columns: u32,
    pub rows: u32,
    pub margin_top: u32,
    pub margin_left: u32,
    /// 0-based cell indices to leave out
    pub skip: BTreeSet<u32>,
}

impl GridSpec {
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            margin_top: 0,
            margin_left: 0,
            skip: BTreeSet::new(),
        }
    }

    pub fn with_margins(mut self, top: u32, left: u32) -> Self {
        self.margin_top = top;
        self.margin_left = left;
        self
    }

    pub fn with_skip(mut self, skip: impl IntoIterator<Item = u32>) -> Self {
        self.skip = skip.into_iter().collect();
        self
    }

    /// Number of cells in the grid, skipped ones included
    pub fn cell_count(&self) -> u64 {
        u64::from(self.columns) * u64::from(self.rows)
    }

    /// Size of a single cell on a sheet of the given size.
    ///
    /// The usable area is the sheet minus the margins on both sides; any remainder
    /// left by the integer division is dropped.
    pub fn cell_size(&self, sheet_width: u32, sheet_height: u32) -> Result<(u32, u32)> {
        if self.columns == 0 || self.rows == 0 {
            return Err(Error::InvalidGridSpec(format!(
                "grid must have at least one column and row, got {}x{}",
                self.columns, self.rows
            )));
        }
        if self.columns.checked_mul(self.rows).is_none() {
            return Err(Error::InvalidGridSpec(format!(
                "{}x{} grid has too many cells",
                self.columns, self.rows
            )));
        }

        let effective_width = i64::from(sheet_width) - 2 * i64::from(self.margin_left);
        let effective_height = i64::from(sheet_height) - 2 * i64::from(self.margin_top);
        if effective_width <= 0 || effective_height <= 0 {
            return Err(Error::InvalidGridSpec(format!(
                "margins (top {}, left {}) leave no usable area on a {}x{} sheet",
                self.margin_top, self.margin_left, sheet_width, sheet_height
            )));
        }

        let cell_width = effective_width as u32 / self.columns;
        let cell_height = effective_height as u32 / self.rows;
        if cell_width == 0 || cell_height == 0 {
            return Err(Error::InvalidGridSpec(format!(
                "{}x{} grid does not fit in usable area {}x{}",
                self.columns, self.rows, effective_width, effective_height
            )));
        }

        Ok((cell_width, cell_height))
    }

    /// All non-skipped cells in index order
    pub fn cells(&self, sheet_width: u32, sheet_height: u32) -> Result<Vec<CropCell>> {
        let (cell_width, cell_height) = self.cell_size(sheet_width, sheet_height)?;

        // cell_size rejected grids whose cell count overflows u32
        Ok((0..self.columns * self.rows)
            .filter(|index| !self.skip.contains(index))
            .map(|index| {
                let (row, col) = grid_position(index, self.columns);
                CropCell {
                    index,
                    row,
                    col,
                    rect: CellRect {
                        x: self.margin_left + cell_width * col,
                        y: self.margin_top + cell_height * row,
                        width: cell_width,
                        height: cell_height,
                    },
                }
            })
            .collect())
    }
}

/// Row-major `(row, col)` of a cell index in a grid `columns` wide
pub fn grid_position(index: u32, columns: u32) -> (u32, u32) {
    let row = index / columns;
    let col = index - columns * row;
    (row, col)
}

/// Pixel rectangle inside a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CellRect {
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }
}

impl fmt::Display for CellRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// One cell of the sheet grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropCell {
    pub index: u32,
    pub row: u32,
    pub col: u32,
    pub rect: CellRect,
}

impl CropCell {
    /// Name of the artwork cut from this cell, rows and columns counted from 1
    pub fn identifier(&self, stem: &str) -> String {
        format!("{}-r{}-c{}", stem, self.row + 1, self.col + 1)
    }
}

/// Largest size with the aspect ratio of `width`x`height` that fits the target box.
///
/// Exactly one side of the result equals its target; the other is at most its target.
pub fn fit_dimensions(
    width: u32,
    height: u32,
    target_width: u32,
    target_height: u32,
) -> Result<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(Error::DegenerateResizeInput { width, height });
    }
    if target_width == 0 || target_height == 0 {
        return Err(Error::DegenerateResizeInput {
            width: target_width,
            height: target_height,
        });
    }

    let (w, h) = (u64::from(width), u64::from(height));
    let (tw, th) = (u64::from(target_width), u64::from(target_height));

    // height/width > target_height/target_width, without floating point
    if h * tw > th * w {
        let out_width = round_div(th * w, h).max(1);
        Ok((out_width as u32, target_height))
    } else {
        let out_height = round_div(tw * h, w).max(1);
        Ok((target_width, out_height as u32))
    }
}

fn round_div(numerator: u64, denominator: u64) -> u64 {
    (2 * numerator + denominator) / (2 * denominator)
}

/// Page layout for the 3x3 card grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpec {
    pub page_width: u32,
    pub page_height: u32,
    /// Bounding box every card is resized into
    pub card_width: u32,
    pub card_height: u32,
    /// Uniform padding added around each card to form its slot
    pub border: u32,
    pub mark_length: u32,
    pub mark_thickness: u32,
    pub backing_color: Rgba<u8>,
    pub mark_color: Rgba<u8>,
    pub background_color: Rgba<u8>,
}

impl Default for PageSpec {
    /// Poker-size cards on A4 at 300 DPI
    fn default() -> Self {
        Self {
            page_width: 2480,
            page_height: 3508,
            card_width: 750,
            card_height: 1050,
            border: 0,
            mark_length: 30,
            mark_thickness: 1,
            backing_color: Rgba([255, 0, 255, 255]),
            mark_color: Rgba([255, 0, 255, 255]),
            background_color: Rgba([255, 255, 255, 255]),
        }
    }
}

impl PageSpec {
    /// Reject layouts that cannot be drawn. Every other method assumes this passed.
    pub fn validate(&self) -> Result<()> {
        if self.card_width == 0 || self.card_height == 0 {
            return Err(Error::InvalidPageSpec(format!(
                "card size must be positive, got {}x{}",
                self.card_width, self.card_height
            )));
        }
        let max = i32::MAX as u32;
        if self.page_width > max || self.page_height > max || self.mark_length > max {
            return Err(Error::InvalidPageSpec(format!(
                "page {}x{} or mark length {} exceeds {} pixels",
                self.page_width, self.page_height, self.mark_length, max
            )));
        }

        let block = |card: u32| {
            u64::from(self.border)
                .checked_mul(2)
                .and_then(|border| border.checked_add(u64::from(card)))
                .and_then(|slot| slot.checked_mul(u64::from(GRID_SIDE)))
        };
        match (block(self.card_width), block(self.card_height)) {
            (Some(width), Some(height))
                if width <= u64::from(self.page_width) && height <= u64::from(self.page_height) =>
            {
                Ok(())
            }
            _ => Err(Error::InvalidPageSpec(format!(
                "{}x{} cards with a {} pixel border do not fit 3x3 on a {}x{} page",
                self.card_width, self.card_height, self.border, self.page_width, self.page_height
            ))),
        }
    }

    /// Card box plus the border on each side; only meaningful on a validated spec
    pub fn slot_size(&self) -> (u32, u32) {
        let padding = self.border.saturating_mul(2);
        (
            self.card_width.saturating_add(padding),
            self.card_height.saturating_add(padding),
        )
    }

    /// Top-left corner of the 3x3 block, centering it on the page
    pub fn layout_offset(&self) -> (u32, u32) {
        let (slot_width, slot_height) = self.slot_size();
        (
            self.page_width
                .saturating_sub(GRID_SIDE.saturating_mul(slot_width))
                / 2,
            self.page_height
                .saturating_sub(GRID_SIDE.saturating_mul(slot_height))
                / 2,
        )
    }

    /// Page-pixel origin of the slot at local index `inner` (0..9)
    pub fn slot_origin(&self, inner: usize) -> (u32, u32) {
        let (row, col) = grid_position(inner as u32, GRID_SIDE);
        let (slot_width, slot_height) = self.slot_size();
        let (offset_x, offset_y) = self.layout_offset();
        (offset_x + slot_width * col, offset_y + slot_height * row)
    }

    /// Offset that centers a card of the given size inside its slot
    pub fn center_offset(&self, card_width: u32, card_height: u32) -> (u32, u32) {
        let (slot_width, slot_height) = self.slot_size();
        (
            slot_width.saturating_sub(card_width) / 2,
            slot_height.saturating_sub(card_height) / 2,
        )
    }

    /// Cutting ticks just outside the 3x3 block, one per column and row boundary on
    /// each of the four sides. A zero mark length or thickness disables them.
    pub fn registration_marks(&self) -> Vec<RegistrationMark> {
        if self.mark_length == 0 || self.mark_thickness == 0 {
            return Vec::new();
        }
        let (slot_width, slot_height) = self.slot_size();
        let (offset_x, offset_y) = self.layout_offset();
        let (left, top) = (offset_x as i32, offset_y as i32);
        let right = left + (GRID_SIDE * slot_width) as i32;
        let bottom = top + (GRID_SIDE * slot_height) as i32;
        let length = self.mark_length as i32;

        let mut marks = Vec::with_capacity(4 * (GRID_SIDE as usize + 1));
        for boundary in 0..=GRID_SIDE {
            let x = left + (slot_width * boundary) as i32;
            let y = top + (slot_height * boundary) as i32;
            marks.push(self.mark(MarkOrientation::Vertical, x, top - length));
            marks.push(self.mark(MarkOrientation::Vertical, x, bottom));
            marks.push(self.mark(MarkOrientation::Horizontal, left - length, y));
            marks.push(self.mark(MarkOrientation::Horizontal, right, y));
        }
        marks
    }

    fn mark(&self, orientation: MarkOrientation, x: i32, y: i32) -> RegistrationMark {
        let (width, height) = match orientation {
            MarkOrientation::Vertical => (self.mark_thickness, self.mark_length),
            MarkOrientation::Horizontal => (self.mark_length, self.mark_thickness),
        };
        RegistrationMark {
            orientation,
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOrientation {
    /// Above and below the block, on column boundaries
    Vertical,
    /// Left and right of the block, on row boundaries
    Horizontal,
}

/// A thin tick rectangle in page pixels; may start off-page on small margins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationMark {
    pub orientation: MarkOrientation,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl RegistrationMark {
    pub fn is_vertical(&self) -> bool {
        self.orientation == MarkOrientation::Vertical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_skip_and_positions() {
        let grid = GridSpec::new(3, 2).with_skip([1]);
        let cells = grid.cells(3000, 2000).unwrap();

        let indices: Vec<u32> = cells.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 2, 3, 4, 5]);

        assert_eq!((cells[0].row, cells[0].col), (0, 0));
        let last = cells.last().unwrap();
        assert_eq!((last.row, last.col), (1, 2));
        assert_eq!(
            last.rect,
            CellRect {
                x: 2000,
                y: 1000,
                width: 1000,
                height: 1000
            }
        );
    }

    #[test]
    fn test_non_square_grid_indexing_round_trips() {
        let grid = GridSpec::new(5, 2);
        for cell in grid.cells(500, 200).unwrap() {
            assert!(cell.col < 5);
            assert!(cell.row < 2);
            assert_eq!(cell.row * 5 + cell.col, cell.index);
        }
        // index 7 is the third cell of the second row
        assert_eq!(grid_position(7, 5), (1, 2));
    }

    #[test]
    fn test_margins_shift_and_shrink_cells() {
        let grid = GridSpec::new(2, 2).with_margins(10, 20);
        let cells = grid.cells(1041, 1020).unwrap();
        // (1041 - 40) / 2 = 500, (1020 - 20) / 2 = 500
        assert_eq!(
            cells[3].rect,
            CellRect {
                x: 520,
                y: 510,
                width: 500,
                height: 500
            }
        );
        assert!(cells.iter().all(|c| c.rect.fits_within(1041, 1020)));
    }

    #[test]
    fn test_invalid_grid() {
        assert!(matches!(
            GridSpec::new(0, 2).cells(100, 100),
            Err(Error::InvalidGridSpec(_))
        ));
        assert!(matches!(
            GridSpec::new(2, 2).with_margins(50, 0).cells(100, 100),
            Err(Error::InvalidGridSpec(_))
        ));
        assert!(matches!(
            GridSpec::new(200, 1).cells(100, 100),
            Err(Error::InvalidGridSpec(_))
        ));
    }

    #[test]
    fn test_identifier_is_one_indexed() {
        let cell = GridSpec::new(3, 2).cells(300, 200).unwrap()[5];
        assert_eq!(cell.identifier("sheet"), "sheet-r2-c3");
    }

    #[test]
    fn test_fit_taller_source() {
        // 1:2 is taller than 750:1050
        assert_eq!(fit_dimensions(500, 1000, 750, 1050).unwrap(), (525, 1050));
    }

    #[test]
    fn test_fit_wider_source() {
        assert_eq!(fit_dimensions(1000, 1000, 750, 1050).unwrap(), (750, 750));
        assert_eq!(fit_dimensions(75, 105, 750, 1050).unwrap(), (750, 1050));
    }

    #[test]
    fn test_fit_preserves_ratio() {
        for &(w, h) in &[(1, 1), (333, 517), (1920, 1080), (7, 3000), (3000, 7)] {
            let (ow, oh) = fit_dimensions(w, h, 750, 1050).unwrap();
            assert!(ow <= 750 && oh <= 1050);
            // the free side is within half a pixel of the exact scaled length
            if ow == 750 {
                assert!((oh as f64 - 750.0 * h as f64 / w as f64).abs() <= 0.5);
            } else {
                assert_eq!(oh, 1050);
                assert!((ow as f64 - 1050.0 * w as f64 / h as f64).abs() <= 0.5);
            }
        }
    }

    #[test]
    fn test_fit_degenerate() {
        assert!(matches!(
            fit_dimensions(0, 10, 750, 1050),
            Err(Error::DegenerateResizeInput { .. })
        ));
    }

    #[test]
    fn test_slot_positions_cover_grid_row_major() {
        let spec = PageSpec::default();
        let mut seen = Vec::new();
        for inner in 0..CARDS_PER_PAGE {
            seen.push(grid_position(inner as u32, GRID_SIDE));
        }
        let expected: Vec<(u32, u32)> = (0..3)
            .flat_map(|row| (0..3).map(move |col| (row, col)))
            .collect();
        assert_eq!(seen, expected);

        assert_eq!(spec.layout_offset(), (115, 179));
        assert_eq!(spec.slot_origin(0), (115, 179));
        assert_eq!(spec.slot_origin(4), (865, 1229));
        assert_eq!(spec.slot_origin(8), (1615, 2279));
    }

    #[test]
    fn test_border_inflates_slots() {
        let spec = PageSpec {
            border: 10,
            ..PageSpec::default()
        };
        assert_eq!(spec.slot_size(), (770, 1070));
        assert_eq!(spec.layout_offset(), (85, 149));
        assert_eq!(spec.center_offset(750, 1050), (10, 10));
    }

    #[test]
    fn test_center_offset() {
        let spec = PageSpec::default();
        assert_eq!(spec.center_offset(750, 1050), (0, 0));
        assert_eq!(spec.center_offset(750, 750), (0, 150));
        assert_eq!(spec.center_offset(524, 1050), (113, 0));
    }

    #[test]
    fn test_registration_marks() {
        let spec = PageSpec::default();
        let marks = spec.registration_marks();
        assert_eq!(marks.len(), 16);
        assert_eq!(marks.iter().filter(|m| m.is_vertical()).count(), 8);

        // top-left vertical tick sits directly above the block's corner
        assert!(marks.contains(&RegistrationMark {
            orientation: MarkOrientation::Vertical,
            x: 115,
            y: 149,
            width: 1,
            height: 30
        }));
        // right-hand tick on the last row boundary
        assert!(marks.contains(&RegistrationMark {
            orientation: MarkOrientation::Horizontal,
            x: 115 + 2250,
            y: 179 + 3150,
            width: 30,
            height: 1
        }));
    }

    #[test]
    fn test_oversized_layout_rejected() {
        let spec = PageSpec {
            card_width: 1000,
            ..PageSpec::default()
        };
        assert!(matches!(spec.validate(), Err(Error::InvalidPageSpec(_))));
        assert!(PageSpec::default().validate().is_ok());
    }

    #[test]
    fn test_marks_disabled() {
        let spec = PageSpec {
            mark_length: 0,
            ..PageSpec::default()
        };
        assert!(spec.registration_marks().is_empty());
    }

    #[test]
    fn test_square_marks_keep_orientation() {
        let spec = PageSpec {
            mark_length: 1,
            mark_thickness: 1,
            ..PageSpec::default()
        };
        let marks = spec.registration_marks();
        assert_eq!(marks.iter().filter(|m| m.is_vertical()).count(), 8);
        // the first tick of each boundary sits above the block
        assert!(marks[0].is_vertical());
        assert_eq!((marks[0].x, marks[0].y), (115, 178));
        assert!(!marks[2].is_vertical());
    }

    #[test]
    fn test_huge_border_rejected_without_overflow() {
        for border in [u32::MAX, 2_147_483_648, 1 << 30] {
            let spec = PageSpec {
                border,
                ..PageSpec::default()
            };
            assert!(matches!(spec.validate(), Err(Error::InvalidPageSpec(_))));
        }
    }

    #[test]
    fn test_oversized_page_rejected() {
        let spec = PageSpec {
            page_width: u32::MAX,
            ..PageSpec::default()
        };
        assert!(matches!(spec.validate(), Err(Error::InvalidPageSpec(_))));
    }

    #[test]
    fn test_cell_count_overflow_rejected() {
        let grid = GridSpec::new(70_000, 70_000);
        assert_eq!(grid.cell_count(), 4_900_000_000);
        assert!(matches!(
            grid.cells(u32::MAX, u32::MAX),
            Err(Error::InvalidGridSpec(_))
        ));
    }
}
