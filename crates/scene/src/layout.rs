//! Deterministic spatial layouts for the card pool.

use std::f64::consts::PI;

use thiserror::Error;

use crate::{CardSize, Target, Transform, Vec3, Viewport};

pub const TABLE_COLUMN_GAP: f64 = 40.0;
pub const TABLE_ROW_GAP: f64 = 20.0;
pub const SPHERE_RADIUS: f64 = 800.0;
pub const WINNER_DEPTH: f64 = 1000.0;
pub const WINNER_SLOT_GAP: f64 = 20.0;
pub const MAX_WINNERS_PER_ROW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    Table,
    Sphere,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub row_count: usize,
    pub card_size: CardSize,
    pub sphere_radius: f64,
}

impl LayoutParams {
    pub fn new(row_count: usize, card_size: CardSize) -> Self {
        Self {
            row_count,
            card_size,
            sphere_radius: SPHERE_RADIUS,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("card table is empty")]
    EmptyTable,
    #[error("all {table_len} cards already hold a winner")]
    Exhausted { table_len: usize },
}

pub fn layout(kind: LayoutKind, count: usize, params: &LayoutParams) -> Vec<Target> {
    match kind {
        LayoutKind::Table => table_layout(count, params.row_count, params.card_size),
        LayoutKind::Sphere => sphere_layout(count, params.sphere_radius),
    }
}

pub fn table_columns(count: usize, row_count: usize) -> usize {
    count.div_ceil(row_count.max(1))
}

/// Row-major grid of `row_count` rows centred on the origin.
pub fn table_layout(count: usize, row_count: usize, card_size: CardSize) -> Vec<Target> {
    if count == 0 {
        return Vec::new();
    }
    let columns = table_columns(count, row_count);
    let rows_used = count.div_ceil(columns);
    let step_x = card_size.width + TABLE_COLUMN_GAP;
    let step_y = card_size.height + TABLE_ROW_GAP;
    let mid_col = (columns as f64 - 1.0) / 2.0;
    let mid_row = (rows_used as f64 - 1.0) / 2.0;

    (0..count)
        .map(|index| {
            let row = (index / columns) as f64;
            let col = (index % columns) as f64;
            Transform::at(Vec3::new(
                (col - mid_col) * step_x,
                (mid_row - row) * step_y,
                0.0,
            ))
        })
        .collect()
}

/// Golden-angle spiral over the sphere. Every card faces away from the centre.
pub fn sphere_layout(count: usize, radius: f64) -> Vec<Target> {
    let golden_angle = PI * (3.0 - 5f64.sqrt());
    (0..count)
        .map(|index| {
            let y = 1.0 - 2.0 * (index as f64 + 0.5) / count as f64;
            let ring = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden_angle * index as f64;
            let direction = Vec3::new(theta.cos() * ring, y, theta.sin() * ring);
            Transform {
                position: direction.scale(radius),
                rotation: facing(direction),
            }
        })
        .collect()
}

/// Yaw/pitch that points a card's +z axis along `direction`.
fn facing(direction: Vec3) -> Vec3 {
    let yaw = direction.x.atan2(direction.z);
    let pitch = -direction.y.clamp(-1.0, 1.0).asin();
    Vec3::new(pitch, yaw, 0.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WinnerSlot {
    pub target: Target,
    pub scale: f64,
}

/// Slot for the `index`-th of `total` simultaneous winners. Winners tile into
/// rows of at most [`MAX_WINNERS_PER_ROW`], each row centred, the block
/// centred in the viewport and scaled down until it fits.
pub fn winner_slot(index: usize, total: usize, card_size: CardSize, viewport: Viewport) -> WinnerSlot {
    let total = total.max(1);
    let index = index.min(total - 1);
    let per_row = total.min(MAX_WINNERS_PER_ROW);
    let rows = total.div_ceil(per_row);

    let cell_w = card_size.width + WINNER_SLOT_GAP;
    let cell_h = card_size.height + WINNER_SLOT_GAP;
    let preferred: f64 = match total {
        1 => 2.0,
        2..=MAX_WINNERS_PER_ROW => 1.5,
        _ => 1.0,
    };
    let fit_w = viewport.width * 0.9 / (per_row as f64 * cell_w);
    let fit_h = viewport.height * 0.9 / (rows as f64 * cell_h);
    let scale = preferred.min(fit_w).min(fit_h).max(0.1);

    let row = index / per_row;
    let col = index % per_row;
    let in_row = if row + 1 == rows {
        total - row * per_row
    } else {
        per_row
    };
    let x = (col as f64 - (in_row as f64 - 1.0) / 2.0) * cell_w * scale;
    let y = ((rows as f64 - 1.0) / 2.0 - row as f64) * cell_h * scale;

    WinnerSlot {
        target: Transform::at(Vec3::new(x, y, WINNER_DEPTH)),
        scale,
    }
}

/// Picks the card that will carry a winner. The start slot is a hash of
/// `seed` (the person id) and collisions probe linearly, so the same person
/// against the same taken set always lands on the same card.
pub fn select_card(taken: &[usize], table_len: usize, seed: u64) -> Result<usize, LayoutError> {
    if table_len == 0 {
        return Err(LayoutError::EmptyTable);
    }
    let start = (splitmix64(seed) % table_len as u64) as usize;
    (0..table_len)
        .map(|offset| (start + offset) % table_len)
        .find(|card| !taken.contains(card))
        .ok_or(LayoutError::Exhausted { table_len })
}

fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
#[path = "tests/layout_tests.rs"]
mod tests;
