use tracing::debug;

use crate::config::EngineConfig;
use crate::geom::point::Point;
use crate::geom::polygon::Ring;

/// Block footprint placed on the site plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedBlock {
    pub center: Point,
    pub width: f64,
    pub depth: f64,
}

/// Grid dimensions `(cols, rows)` used for `count` blocks.
pub fn grid_shape(count: usize) -> (usize, usize) {
    if count == 0 {
        return (0, 0);
    }
    let cols = (count as f64).sqrt().ceil() as usize;
    let rows = count.div_ceil(cols);
    (cols, rows)
}

/// Lays out `count` blocks on a grid at one scale and keeps those inside `ring`.
fn place_grid(
    count: usize,
    width: f64,
    depth: f64,
    spacing: f64,
    ring: &Ring,
    offset: f64,
) -> Vec<PlacedBlock> {
    let (cols, rows) = grid_shape(count);
    let step_x = width + spacing;
    let step_z = depth + spacing;
    let half_cols = (cols as f64 - 1.0) / 2.0;
    let half_rows = (rows as f64 - 1.0) / 2.0;

    (0..count)
        .filter_map(|idx| {
            let col = (idx % cols) as f64;
            let row = (idx / cols) as f64;
            let center = Point::new((col - half_cols) * step_x, (row - half_rows) * step_z);
            ring.contains_rect(center, width, depth, offset)
                .then_some(PlacedBlock {
                    center,
                    width,
                    depth,
                })
        })
        .collect()
}

/// Places up to `count` blocks of `width` x `depth` with `spacing` inside the site.
///
/// The grid is centered on the origin. It is tried at each of
/// `config.shrink_ratios` in turn (footprint and spacing scaled together) and
/// the first ratio that places every block, or at least
/// `config.min_cluster_blocks` of them, is returned. Smaller ratios are not
/// tried once a cluster fits. When no ratio fits a cluster the result is empty.
pub fn layout_blocks(
    count: usize,
    width: f64,
    depth: f64,
    spacing: f64,
    ring: &Ring,
    config: &EngineConfig,
) -> Vec<PlacedBlock> {
    if count == 0 {
        return vec![];
    }

    for &ratio in &config.shrink_ratios {
        let blocks = place_grid(
            count,
            width * ratio,
            depth * ratio,
            spacing * ratio,
            ring,
            config.safety_offset_m,
        );
        if blocks.len() >= count {
            debug!(count, ratio, "all blocks placed");
            return blocks;
        }
        if blocks.len() >= config.min_cluster_blocks {
            debug!(
                requested = count,
                placed = blocks.len(),
                ratio,
                "accepted partial block cluster"
            );
            return blocks;
        }
    }

    debug!(requested = count, "no block cluster fits inside the site");
    vec![]
}
