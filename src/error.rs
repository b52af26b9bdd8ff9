use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::CellRect;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("crop {rect} exceeds sheet bounds {width}x{height}")]
    OutOfBoundsCrop {
        rect: CellRect,
        width: u32,
        height: u32,
    },

    #[error("failed to decode image {path:?}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode image {path:?}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot resize degenerate image {width}x{height}")]
    DegenerateResizeInput { width: u32, height: u32 },

    #[error("invalid grid: {0}")]
    InvalidGridSpec(String),

    #[error("invalid page layout: {0}")]
    InvalidPageSpec(String),

    #[error("i/o error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
