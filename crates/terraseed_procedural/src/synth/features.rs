//! # Feature Carving
//!
//! Paths, rivers, the planted object, the spawn point and landmarks.
//!
//! Every random decision reads `seeded_random01(stream, [feature, step])`
//! with explicit indices, never a shared RNG advanced by iteration, so
//! adding a path cannot shift the draws of another.

use super::grid::{GridPos, PlantedObject, TerrainType};
use crate::mapping::{PlantedObjectSpec, SynthesisKnobs};
use crate::mixer::{derive_seed, seeded_random01};

/// Most polylines a path network can have.
pub const MAX_PATHS: u32 = 4;

/// Source candidates sampled per river.
const RIVER_SOURCE_CANDIDATES: i64 = 16;

/// A river source must sit this far above the water level.
const RIVER_SOURCE_MIN_RISE: f64 = 0.1;

/// Rivers never carve below `water_level + RIVER_FLOOR_MARGIN`.
pub const RIVER_FLOOR_MARGIN: f64 = 0.005;

/// Landmark probability per cell at full landmark density.
const LANDMARK_RATE: f64 = 0.05;

/// Number of path polylines for a density.
#[must_use]
pub fn path_count(path_density: f64) -> u32 {
    let count = (path_density.clamp(0.0, 1.0) * f64::from(MAX_PATHS)).round() as u32;
    count.min(MAX_PATHS)
}

/// Border margin for features that must stay off the edge.
#[must_use]
pub fn border_margin(grid_size: usize) -> usize {
    (grid_size / 8).max(2).min(grid_size / 2)
}

/// Traces the path network. Returns a row-major mask.
///
/// Even-numbered paths run west to east, odd ones north to south. Each
/// step drifts the cross-axis offset by a seeded draw scaled by the
/// curviness; cells within the half-width of the offset are marked.
#[must_use]
pub fn trace_paths(seed: i64, knobs: &SynthesisKnobs, grid_size: usize) -> Vec<bool> {
    let mut mask = vec![false; grid_size * grid_size];
    if grid_size < 4 {
        return mask;
    }

    let stream = derive_seed(seed, "paths");
    let density = knobs.path_density.clamp(0.0, 1.0);
    let curviness = 0.4 + 1.2 * density;
    let half_width = 0.6 + 0.6 * density;
    let margin = border_margin(grid_size) as f64;
    let span = (grid_size as f64 - 2.0 * margin).max(1.0);
    let max_offset = (grid_size - 2) as f64;

    for path in 0..path_count(density) {
        let path = i64::from(path);
        let horizontal = path % 2 == 0;
        let mut offset = margin + seeded_random01(stream, &[path, -1]) * span;

        for step in 0..grid_size {
            mark_span(&mut mask, grid_size, step, offset, half_width, horizontal);
            let drift = (seeded_random01(stream, &[path, step as i64]) - 0.5) * curviness;
            offset = (offset + drift).clamp(1.0, max_offset);
        }
    }

    mask
}

fn mark_span(
    mask: &mut [bool],
    grid_size: usize,
    along: usize,
    offset: f64,
    half_width: f64,
    horizontal: bool,
) {
    let lo = (offset - half_width).floor().max(0.0) as usize;
    let hi = ((offset + half_width).ceil() as usize).min(grid_size - 1);
    for across in lo..=hi {
        if (across as f64 - offset).abs() <= half_width {
            let (x, y) = if horizontal { (along, across) } else { (across, along) };
            mask[y * grid_size + x] = true;
        }
    }
}

/// Traces rivers over an elevation field. Returns a row-major mask.
///
/// Each river starts at the highest of a fixed set of hashed candidate
/// cells and repeatedly moves to its lowest unvisited 4-neighbour (north,
/// east, south, west order breaks ties). Moving through a local minimum
/// is allowed, which keeps the channel connected. A river stops at
/// standing water, at the border, or after `2 · grid_size` steps.
#[must_use]
pub fn trace_rivers(
    seed: i64,
    knobs: &SynthesisKnobs,
    grid_size: usize,
    elevation: &[f64],
) -> Vec<bool> {
    let mut mask = vec![false; grid_size * grid_size];
    if grid_size < 4 {
        return mask;
    }

    let stream = derive_seed(seed, "rivers");
    let margin = border_margin(grid_size);
    let interior = (grid_size - 2 * margin).max(1);
    let mut visited = vec![false; grid_size * grid_size];

    for river in 0..knobs.river_count {
        let river = i64::from(river);

        let mut source: Option<(usize, f64)> = None;
        for candidate in 0..RIVER_SOURCE_CANDIDATES {
            let fx = seeded_random01(stream, &[river, candidate, 0]);
            let fy = seeded_random01(stream, &[river, candidate, 1]);
            let cx = margin + (fx * interior as f64) as usize;
            let cy = margin + (fy * interior as f64) as usize;
            let index = cy * grid_size + cx;
            let e = elevation[index];
            if source.map_or(true, |(_, best)| e > best) {
                source = Some((index, e));
            }
        }

        let Some((start, start_elevation)) = source else {
            continue;
        };
        if start_elevation < knobs.water_level + RIVER_SOURCE_MIN_RISE {
            continue;
        }

        visited.fill(false);
        let mut current = start;
        for _ in 0..grid_size * 2 {
            if elevation[current] < knobs.water_level {
                break;
            }
            mask[current] = true;
            visited[current] = true;

            let x = current % grid_size;
            let y = current / grid_size;
            if x == 0 || y == 0 || x == grid_size - 1 || y == grid_size - 1 {
                break;
            }

            let neighbors = [current - grid_size, current + 1, current + grid_size, current - 1];
            let next = neighbors
                .into_iter()
                .filter(|&n| !visited[n])
                .fold(None, |best: Option<usize>, n| match best {
                    Some(b) if elevation[b] <= elevation[n] => Some(b),
                    _ => Some(n),
                });

            match next {
                Some(n) => current = n,
                None => break,
            }
        }
    }

    mask
}

/// Elevation of a carved river cell: below its surroundings, above water.
#[inline]
#[must_use]
pub fn carve_river(elevation: f64, knobs: &SynthesisKnobs) -> f64 {
    (elevation - knobs.river_depth).max(knobs.water_level + RIVER_FLOOR_MARGIN)
}

/// Places the planted object from its fractional spec, off the border.
#[must_use]
pub fn place_object(spec: &PlantedObjectSpec, grid_size: usize) -> PlantedObject {
    let margin = border_margin(grid_size);
    let span = grid_size.saturating_sub(1 + 2 * margin) as f64;
    let place =
        |fraction: f64| (margin + (fraction.clamp(0.0, 1.0) * span).round() as usize) as u32;
    PlantedObject {
        kind: spec.kind,
        position: GridPos::new(place(spec.x), place(spec.y)),
    }
}

/// Nearest walkable cell to the centre, by square rings in row-major order.
///
/// Falls back to the centre when nothing is walkable.
#[must_use]
pub fn find_spawn(kinds: &[TerrainType], grid_size: usize) -> GridPos {
    let centre = grid_size / 2;
    for radius in 0..=centre {
        let lo_y = centre.saturating_sub(radius);
        let hi_y = (centre + radius).min(grid_size - 1);
        let lo_x = centre.saturating_sub(radius);
        let hi_x = (centre + radius).min(grid_size - 1);
        for y in lo_y..=hi_y {
            for x in lo_x..=hi_x {
                let on_ring = y.abs_diff(centre) == radius || x.abs_diff(centre) == radius;
                if on_ring && kinds[y * grid_size + x].is_walkable() {
                    return GridPos::new(x as u32, y as u32);
                }
            }
        }
    }
    GridPos::new(centre as u32, centre as u32)
}

/// Landmark positions: plain land cells passing a seeded density test.
#[must_use]
pub fn place_landmarks(
    seed: i64,
    knobs: &SynthesisKnobs,
    kinds: &[TerrainType],
    grid_size: usize,
    object: &PlantedObject,
) -> Vec<GridPos> {
    let stream = derive_seed(seed, "landmarks");
    let chance = knobs.landmark_density.clamp(0.0, 1.0) * LANDMARK_RATE;
    let mut landmarks = Vec::new();

    for y in 0..grid_size {
        for x in 0..grid_size {
            let kind = kinds[y * grid_size + x];
            let eligible = matches!(
                kind,
                TerrainType::Ground | TerrainType::Forest | TerrainType::Sand | TerrainType::Rock
            );
            let pos = GridPos::new(x as u32, y as u32);
            if eligible
                && pos != object.position
                && seeded_random01(stream, &[x as i64, y as i64]) < chance
            {
                landmarks.push(pos);
            }
        }
    }

    landmarks
}
