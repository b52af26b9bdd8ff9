use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::{debug, info};

use crate::cutter::cut_sheet;
use crate::error::{Error, Result};
use crate::geometry::{GridSpec, PageSpec};
use crate::layout::compose_pages;
use crate::stage::{run_stage, FailurePolicy};
use crate::transform::resize_to_fit;

/// File names some operating systems drop into image folders
const SYSTEM_ARTIFACTS: &[&str] = &["Thumbs.db", "desktop.ini", "ehthumbs.db"];

/// Directory tree a run writes into
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Crops cut from a sheet
    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    /// Crops scaled to the card box
    pub fn resize_dir(&self) -> PathBuf {
        self.root.join("resize")
    }

    /// Finished pages
    pub fn cards_dir(&self) -> PathBuf {
        self.root.join("cards")
    }

    pub fn page_path(&self, index: usize) -> PathBuf {
        self.cards_dir().join(format!("page{}.png", index))
    }
}

pub fn load_image(path: &Path) -> Result<DynamicImage> {
    load_image_with_format(path).map(|(image, _)| image)
}

/// Decode `path`, detecting the format from its contents rather than its name
pub fn load_image_with_format(path: &Path) -> Result<(DynamicImage, ImageFormat)> {
    let decode = |source| Error::Decode {
        path: path.to_path_buf(),
        source,
    };
    let reader = ImageReader::open(path)
        .map_err(|err| decode(image::ImageError::IoError(err)))?
        .with_guessed_format()
        .map_err(|err| decode(image::ImageError::IoError(err)))?;
    let format = reader.format().unwrap_or(ImageFormat::Png);
    let image = reader.decode().map_err(decode)?;
    Ok((image, format))
}

/// File extension written for images in `format`
pub fn format_extension(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("png")
}

pub fn save_image(image: &DynamicImage, path: &Path, format: ImageFormat) -> Result<()> {
    image.save_with_format(path, format).map_err(|source| Error::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "wrote");
    Ok(())
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Image files directly inside `dir`, skipping hidden files, OS thumbnails and
/// anything the codec does not recognise. Order is unspecified.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let io_err = |source| Error::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut images = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if !entry.file_type().map_err(io_err)?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || SYSTEM_ARTIFACTS.iter().any(|artifact| *artifact == name) {
            debug!(path = %path.display(), "ignoring system file");
            continue;
        }
        if ImageFormat::from_path(&path).is_err() {
            debug!(path = %path.display(), "ignoring non-image file");
            continue;
        }
        images.push(path);
    }
    Ok(images)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Runs the cut, resize and compose stages against files on disk
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub page: PageSpec,
    pub output: OutputLayout,
}

impl Pipeline {
    pub fn new(page: PageSpec, output: OutputLayout) -> Self {
        Self { page, output }
    }

    /// Cut `sheet_path` per `grid`, then resize and compose the crops
    pub fn run_sheet(&self, sheet_path: &Path, grid: &GridSpec) -> Result<Vec<PathBuf>> {
        self.page.validate()?;
        let crops = self.cut(sheet_path, grid)?;
        self.resize_and_compose(crops)
    }

    /// Resize and compose the pre-cut artworks found in `dir`
    pub fn run_folder(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        self.page.validate()?;
        let inputs = list_images(dir)?;
        info!(dir = %dir.display(), count = inputs.len(), "found artworks");
        self.resize_and_compose(inputs)
    }

    fn resize_and_compose(&self, inputs: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
        let resized = self.resize(inputs)?;
        self.compose(resized)
    }

    /// Write one raw crop per surviving cell
    pub fn cut(&self, sheet_path: &Path, grid: &GridSpec) -> Result<Vec<PathBuf>> {
        let (sheet, format) = load_image_with_format(sheet_path)?;
        let stem = sheet_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = format_extension(format);
        info!(
            path = %sheet_path.display(),
            width = sheet.width(),
            height = sheet.height(),
            "loaded sheet"
        );

        let cards = cut_sheet(&sheet, grid, &stem)?;

        let raw_dir = self.output.raw_dir();
        create_dir(&raw_dir)?;
        run_stage("write crop", cards, FailurePolicy::FailFast, |card| {
            let path = raw_dir.join(format!("{}.{}", card.id, extension));
            save_image(&card.image, &path, format)?;
            Ok(path)
        })
    }

    /// Scale every input into the card box, keeping its file name and format
    pub fn resize(&self, inputs: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
        let resize_dir = self.output.resize_dir();
        create_dir(&resize_dir)?;
        let (card_width, card_height) = (self.page.card_width, self.page.card_height);

        run_stage("resize", inputs, FailurePolicy::FailFast, |input| {
            let (image, format) = load_image_with_format(&input)?;
            let resized = resize_to_fit(&image, card_width, card_height)?;
            let name = file_name(&input);
            info!(
                file = %name,
                width = resized.width(),
                height = resized.height(),
                "resize"
            );
            let path = resize_dir.join(name);
            save_image(&resized, &path, format)?;
            Ok(path)
        })
    }

    /// Order resized cards by file name and write one page per nine of them
    pub fn compose(&self, resized: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
        let cards_dir = self.output.cards_dir();
        create_dir(&cards_dir)?;

        let named: Vec<(String, PathBuf)> = resized
            .into_iter()
            .map(|path| (file_name(&path), path))
            .collect();

        compose_pages(
            named,
            &self.page,
            |(name, _)| name.as_str(),
            |(_, path)| load_image(path).map(|image| image.to_rgba8()),
            |index, page| {
                let path = self.output.page_path(index);
                save_image(&DynamicImage::ImageRgba8(page), &path, ImageFormat::Png)?;
                Ok(path)
            },
        )
    }
}
