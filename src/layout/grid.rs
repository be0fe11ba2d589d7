use crate::config::GridConfig;
use crate::graph::GraphNode;
use crate::task::LayoutPin;
use serde::Serialize;
use std::collections::HashSet;

/// Placement record for grid-based widgets, in cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridItem {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub id: String,
    /// Position came from `addition.layout` and is never moved.
    pub pinned: bool,
}

impl GridItem {
    fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.x..self.x + self.w)
            .flat_map(move |cx| (self.y..self.y + self.h).map(move |cy| (cx, cy)))
    }

    pub fn overlaps(&self, other: &GridItem) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

fn max_column(config: &GridConfig) -> u32 {
    config.columns.saturating_sub(config.item_width)
}

/// Nearest cell for a pixel position, clamped so an item still fits in the grid.
pub fn pixel_to_cell(x: f64, y: f64, config: &GridConfig) -> (u32, u32) {
    let column = (x / config.cell_width).round().max(0.0) as u32;
    let row = (y / config.cell_height).round().max(0.0) as u32;
    (column.min(max_column(config)), row)
}

/// Cell named by a pin, with the same rounding and column clamp as [`pixel_to_cell`].
pub fn pin_to_cell(pin: LayoutPin, config: &GridConfig) -> (u32, u32) {
    let column = (pin.x.round().max(0.0) as u32).min(max_column(config));
    (column, pin.y.round().max(0.0) as u32)
}

pub fn cell_to_pixel(column: u32, row: u32, config: &GridConfig) -> (f64, f64) {
    (
        column as f64 * config.cell_width,
        row as f64 * config.cell_height,
    )
}

/// Grid items for laid-out nodes, pins honoured, overlaps resolved.
pub fn to_grid<'a, I>(nodes: I, config: &GridConfig) -> Vec<GridItem>
where
    I: IntoIterator<Item = &'a GraphNode>,
{
    let mut items: Vec<GridItem> = nodes
        .into_iter()
        .map(|node| {
            let (x, y, pinned) = match node.pin {
                Some(pin) => {
                    let (x, y) = pin_to_cell(pin, config);
                    (x, y, true)
                }
                None => {
                    let (x, y) = pixel_to_cell(node.x, node.y, config);
                    (x, y, false)
                }
            };
            GridItem {
                x,
                y,
                w: config.item_width,
                h: config.item_height,
                id: node.id.clone(),
                pinned,
            }
        })
        .collect();
    resolve_overlaps(&mut items, config.columns);
    items
}

/// Greedy collision pass over a per-cell occupancy set.
///
/// Pinned items claim their cells first and stay put. Every other item, in slice order,
/// slides right along its row until it fits. When nothing in the row is free it returns
/// to its original column and drops below everything already placed in those columns.
pub fn resolve_overlaps(items: &mut [GridItem], columns: u32) {
    let width = items.iter().map(|item| item.x + item.w).fold(columns, u32::max);
    let mut occupied: HashSet<(u32, u32)> = HashSet::new();
    // First row below every placed item, per column
    let mut floor: Vec<u32> = vec![0; width as usize];

    for item in items.iter().filter(|item| item.pinned) {
        claim(item, &mut occupied, &mut floor);
    }

    for item in items.iter_mut().filter(|item| !item.pinned) {
        let max_x = columns.saturating_sub(item.w);
        let home_x = item.x.min(max_x);
        match (home_x..=max_x).find(|&x| is_free(&occupied, x, item.y, item.w, item.h)) {
            Some(x) => item.x = x,
            None => {
                item.x = home_x;
                item.y = floor
                    .get(home_x as usize..(home_x + item.w) as usize)
                    .and_then(|span| span.iter().copied().max())
                    .unwrap_or(item.y)
                    .max(item.y + 1);
            }
        }
        claim(item, &mut occupied, &mut floor);
    }
}

fn is_free(occupied: &HashSet<(u32, u32)>, x: u32, y: u32, w: u32, h: u32) -> bool {
    (x..x + w).all(|cx| (y..y + h).all(|cy| !occupied.contains(&(cx, cy))))
}

fn claim(item: &GridItem, occupied: &mut HashSet<(u32, u32)>, floor: &mut [u32]) {
    occupied.extend(item.cells());
    for column in item.x..item.x + item.w {
        if let Some(bottom) = floor.get_mut(column as usize) {
            *bottom = (*bottom).max(item.y + item.h);
        }
    }
}
