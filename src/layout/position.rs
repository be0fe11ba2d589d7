use super::grid::{cell_to_pixel, pin_to_cell};
use super::{Canvas, LayoutTree};
use crate::config::{GridConfig, LayoutConfig};
use crate::graph::TaskGraph;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};

/// A tree laid out around its own origin.
struct TreeBlock {
    positions: Vec<(String, f64, f64)>,
    height: f64,
}

/// Pixel coordinates for every tree member.
///
/// Within a tree each level is a column; columns are centred against the tallest one.
/// Trees are stacked top to bottom in index order with `tree_gap` between them.
/// Pinned nodes skip stacking and sit at the pixel origin of their grid cell.
pub fn position_trees(
    graph: &TaskGraph,
    trees: &[LayoutTree],
    levels: &HashMap<String, usize>,
    config: &LayoutConfig,
    grid: &GridConfig,
) -> (HashMap<String, (f64, f64)>, Canvas) {
    // Trees are independent, so lay each out in parallel
    let blocks: Vec<TreeBlock> = trees
        .par_iter()
        .map(|tree| layout_tree(graph, tree, levels, config))
        .collect();

    let mut positions = HashMap::with_capacity(graph.len());
    let mut max_right = 0.0_f64;
    let mut max_bottom = 0.0_f64;
    let mut offset_y = config.padding;

    for block in blocks {
        if block.positions.is_empty() {
            continue;
        }
        for (name, x, y) in block.positions {
            let x = x + config.padding;
            let y = y + offset_y;
            max_right = max_right.max(x + config.node_width);
            max_bottom = max_bottom.max(y + config.node_height);
            positions.insert(name, (x, y));
        }
        offset_y += block.height + config.tree_gap;
    }

    for node in graph.nodes() {
        let Some(pin) = node.pin else {
            continue;
        };
        let (column, row) = pin_to_cell(pin, grid);
        let (x, y) = cell_to_pixel(column, row, grid);
        max_right = max_right.max(x + config.node_width);
        max_bottom = max_bottom.max(y + config.node_height);
        positions.insert(node.name.clone(), (x, y));
    }

    let canvas = if positions.is_empty() {
        Canvas::default()
    } else {
        Canvas {
            width: max_right + config.padding,
            height: max_bottom + config.padding,
        }
    };
    (positions, canvas)
}

fn layout_tree(
    graph: &TaskGraph,
    tree: &LayoutTree,
    levels: &HashMap<String, usize>,
    config: &LayoutConfig,
) -> TreeBlock {
    let mut columns: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for name in &tree.members {
        if graph.get(name).is_none_or(|node| node.pin.is_some()) {
            continue;
        }
        let level = levels.get(name).copied().unwrap_or(0);
        columns.entry(level).or_default().push(name.as_str());
    }

    let row_pitch = config.node_height + config.vertical_gap;
    let column_pitch = config.node_width + config.horizontal_gap;
    let column_height = |count: usize| {
        if count == 0 {
            0.0
        } else {
            count as f64 * config.node_height + (count - 1) as f64 * config.vertical_gap
        }
    };

    let tallest = columns.values().map(Vec::len).max().unwrap_or(0);
    let height = column_height(tallest);

    let mut positions = Vec::with_capacity(tree.members.len());
    for (level, names) in &columns {
        let top = (height - column_height(names.len())) / 2.0;
        let x = *level as f64 * column_pitch;
        for (row, name) in names.iter().enumerate() {
            positions.push((name.to_string(), x, top + row as f64 * row_pitch));
        }
    }

    TreeBlock { positions, height }
}
