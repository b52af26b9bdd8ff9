use clap::{Args, Parser, Subcommand};
use image::Rgba;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::geometry::{GridSpec, PageSpec};

#[derive(Parser, Debug)]
#[command(name = "proxy-sheet")]
#[command(version, about = "Cut card sheets into artworks and tile them onto printable 3x3 pages")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Show per-card details
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Cut a sheet into a grid of cards, then lay them out on pages
    Crop {
        /// Number of columns on the sheet
        columns: u32,

        /// Number of rows on the sheet
        rows: u32,

        /// Output directory (raw/, resize/ and cards/ are created inside)
        output: PathBuf,

        /// Input sheet image
        input: PathBuf,

        /// Cells to leave out, 0-based (e.g. "3-5,7")
        #[arg(value_parser = parse_index_range)]
        skip: Option<BTreeSet<u32>>,

        /// Pixels to ignore at the top and bottom of the sheet
        #[arg(long, default_value = "0")]
        margin_top: u32,

        /// Pixels to ignore at the left and right of the sheet
        #[arg(long, default_value = "0")]
        margin_left: u32,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Lay out a folder of pre-cut artworks on pages
    Join {
        /// Output directory (resize/ and cards/ are created inside)
        output: PathBuf,

        /// Folder of artwork images
        dir: PathBuf,

        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Card bounding box width in pixels
    #[arg(long, default_value = "750")]
    pub card_width: u32,

    /// Card bounding box height in pixels
    #[arg(long, default_value = "1050")]
    pub card_height: u32,

    /// Page width in pixels [default: A4 at 300 DPI]
    #[arg(long, default_value = "2480")]
    pub page_width: u32,

    /// Page height in pixels
    #[arg(long, default_value = "3508")]
    pub page_height: u32,

    /// Padding around each card inside its slot
    #[arg(long, default_value = "0")]
    pub border: u32,

    /// Length of the registration ticks (0 disables them)
    #[arg(long, default_value = "30")]
    pub mark_length: u32,

    /// Thickness of the registration ticks
    #[arg(long, default_value = "1")]
    pub mark_thickness: u32,

    /// Fill behind each card (#rrggbb or #rrggbbaa)
    #[arg(long, default_value = "#ff00ff", value_parser = parse_color)]
    pub backing_color: Rgba<u8>,

    /// Registration tick color
    #[arg(long, default_value = "#ff00ff", value_parser = parse_color)]
    pub mark_color: Rgba<u8>,

    /// Page background color
    #[arg(long, default_value = "#ffffff", value_parser = parse_color)]
    pub background_color: Rgba<u8>,
}

impl PageArgs {
    pub fn page_spec(&self) -> PageSpec {
        PageSpec {
            page_width: self.page_width,
            page_height: self.page_height,
            card_width: self.card_width,
            card_height: self.card_height,
            border: self.border,
            mark_length: self.mark_length,
            mark_thickness: self.mark_thickness,
            backing_color: self.backing_color,
            mark_color: self.mark_color,
            background_color: self.background_color,
        }
    }
}

impl Command {
    pub fn page(&self) -> &PageArgs {
        match self {
            Command::Crop { page, .. } | Command::Join { page, .. } => page,
        }
    }

    /// Grid for `crop`; `None` for `join`
    pub fn grid_spec(&self) -> Option<GridSpec> {
        match self {
            Command::Crop {
                columns,
                rows,
                skip,
                margin_top,
                margin_left,
                ..
            } => Some(
                GridSpec::new(*columns, *rows)
                    .with_margins(*margin_top, *margin_left)
                    .with_skip(skip.iter().flatten().copied()),
            ),
            Command::Join { .. } => None,
        }
    }
}

/// Parse a list like "3-5,7" into `{3, 4, 5, 7}`.
///
/// Items are a single index, `a-b` (inclusive, either direction), `a..b` (exclusive)
/// or `a..=b` (inclusive).
pub fn parse_index_range(s: &str) -> Result<BTreeSet<u32>, String> {
    let mut indices = BTreeSet::new();

    for item in s.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let parse = |part: &str| -> Result<u32, String> {
            part.trim()
                .parse()
                .map_err(|_| format!("Invalid index '{}' in '{}'", part.trim(), item))
        };

        if let Some((start, end)) = item.split_once("..=") {
            let (start, end) = (parse(start)?, parse(end)?);
            indices.extend(start.min(end)..=start.max(end));
        } else if let Some((start, end)) = item.split_once("..") {
            let (start, end) = (parse(start)?, parse(end)?);
            if start <= end {
                indices.extend(start..end);
            } else {
                indices.extend(end + 1..=start);
            }
        } else if let Some((start, end)) = item.split_once('-') {
            let (start, end) = (parse(start)?, parse(end)?);
            indices.extend(start.min(end)..=start.max(end));
        } else {
            indices.insert(parse(item)?);
        }
    }

    Ok(indices)
}

fn parse_color(s: &str) -> Result<Rgba<u8>, String> {
    let hex = s
        .strip_prefix('#')
        .ok_or_else(|| format!("Invalid color '{}', expected #rrggbb", s))?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("Invalid color '{}', expected #rrggbb or #rrggbbaa", s));
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };

    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha]))
}
