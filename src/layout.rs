use image::{imageops, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geometry::{grid_position, PageSpec, CARDS_PER_PAGE, GRID_SIDE};
use crate::sort::natural_sort_by_key;
use crate::stage::{run_stage, FailurePolicy};

/// Sort items naturally by `key` and split them into pages of at most nine
pub fn paginate<T, F>(mut items: Vec<T>, key: F) -> Vec<Vec<T>>
where
    F: Fn(&T) -> &str,
{
    natural_sort_by_key(&mut items, key);

    let mut pages = Vec::with_capacity(items.len().div_ceil(CARDS_PER_PAGE));
    let mut items = items.into_iter().peekable();
    while items.peek().is_some() {
        pages.push(items.by_ref().take(CARDS_PER_PAGE).collect());
    }
    pages
}

/// Place up to nine cards on a fresh page, row-major from the top left, then draw the
/// registration marks. Missing cards leave their slots as page background.
pub fn compose_page(cards: &[RgbaImage], spec: &PageSpec) -> Result<RgbaImage> {
    spec.validate()?;
    if cards.len() > CARDS_PER_PAGE {
        return Err(Error::InvalidPageSpec(format!(
            "a page holds at most {} cards, got {}",
            CARDS_PER_PAGE,
            cards.len()
        )));
    }

    let (slot_width, slot_height) = spec.slot_size();
    let mut page = RgbaImage::from_pixel(spec.page_width, spec.page_height, spec.background_color);

    for (inner, card) in cards.iter().enumerate() {
        let (row, col) = grid_position(inner as u32, GRID_SIDE);
        let (x, y) = spec.slot_origin(inner);
        let (offset_x, offset_y) = spec.center_offset(card.width(), card.height());
        debug!(
            inner,
            row,
            col,
            x,
            y,
            width = card.width(),
            height = card.height(),
            offset_x,
            offset_y,
            "place card"
        );

        let mut backing = RgbaImage::from_pixel(slot_width, slot_height, spec.backing_color);
        imageops::overlay(&mut backing, card, i64::from(offset_x), i64::from(offset_y));
        imageops::overlay(&mut page, &backing, i64::from(x), i64::from(y));
    }

    for mark in spec.registration_marks() {
        draw_filled_rect_mut(
            &mut page,
            Rect::at(mark.x, mark.y).of_size(mark.width, mark.height),
            spec.mark_color,
        );
    }

    Ok(page)
}

/// Order every card by `key`, split into pages of nine and compose the pages in
/// parallel.
///
/// `load` turns one card into pixels and `emit` receives each finished page with its
/// 0-based index. Results come back in page order.
pub fn compose_pages<T, R, K, L, E>(
    cards: Vec<T>,
    spec: &PageSpec,
    key: K,
    load: L,
    emit: E,
) -> Result<Vec<R>>
where
    T: Send,
    R: Send,
    K: Fn(&T) -> &str,
    L: Fn(&T) -> Result<RgbaImage> + Sync + Send,
    E: Fn(usize, RgbaImage) -> Result<R> + Sync + Send,
{
    spec.validate()?;
    let chunks: Vec<(usize, Vec<T>)> = paginate(cards, key).into_iter().enumerate().collect();

    run_stage("compose", chunks, FailurePolicy::FailFast, |(index, chunk)| {
        info!(page = index, cards = chunk.len(), "layout");
        let images = chunk.iter().map(&load).collect::<Result<Vec<_>>>()?;
        emit(index, compose_page(&images, spec)?)
    })
}
