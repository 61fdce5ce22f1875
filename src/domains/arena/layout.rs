//! Obstacle layout records and the compact text format used to submit them:
//! `"x,y,D,id;x,y,D,id;..."` where `D` is one of `T`, `B`, `L`, `R`.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::ArenaSpec;
use super::obstacle::{Facing, ObstacleId};
use crate::common::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleRecord {
    pub x: i64,
    pub y: i64,
    pub facing: Facing,
    pub id: ObstacleId,
}

pub fn parse_layout(input: &str) -> DomainResult<Vec<ObstacleRecord>> {
    input
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_record)
        .collect()
}

fn parse_record(entry: &str) -> DomainResult<ObstacleRecord> {
    let fields: Vec<&str> = entry.split(',').map(str::trim).collect();
    if fields.len() != 4 {
        return Err(DomainError::InvalidLayout {
            reason: format!("expected 'x,y,facing,id' but got '{}'", entry),
        });
    }
    let number = |field: &str, what: &str| -> DomainResult<i64> {
        field.parse::<i64>().map_err(|_| DomainError::InvalidLayout {
            reason: format!("{} '{}' in '{}' is not an integer", what, field, entry),
        })
    };
    let x = number(fields[0], "x")?;
    let y = number(fields[1], "y")?;
    let facing = fields[2].parse::<Facing>()?;
    let id = fields[3].parse::<ObstacleId>().map_err(|_| DomainError::InvalidLayout {
        reason: format!("id '{}' in '{}' is not a non-negative integer", fields[3], entry),
    })?;
    Ok(ObstacleRecord { x, y, facing, id })
}

pub fn format_layout(records: &[ObstacleRecord]) -> String {
    records
        .iter()
        .map(|r| format!("{},{},{},{}", r.x, r.y, r.facing, r.id))
        .collect::<Vec<_>>()
        .join(";")
}

/// Draws `count` obstacles on distinct cell centres whose footprints keep at
/// least one safety square apart. Returns fewer records if the arena runs out
/// of room after a bounded number of attempts, and none when the arena has
/// no interior cells.
pub fn random_layout<R: Rng>(rng: &mut R, spec: &ArenaSpec, count: usize) -> Vec<ObstacleRecord> {
    let cols = (spec.width / spec.cell_size) as i64;
    let rows = (spec.height / spec.cell_size) as i64;
    let cell = spec.cell_size as i64;
    if cols < 3 || rows < 3 || cell <= 0 {
        return Vec::new();
    }
    let spacing = 2.0 * spec.obstacle_clearance;
    let facings = [Facing::Top, Facing::Bottom, Facing::Left, Facing::Right];

    let mut records: Vec<ObstacleRecord> = Vec::with_capacity(count);
    let mut attempts = 0;
    while records.len() < count && attempts < count * 200 {
        attempts += 1;
        let x = rng.gen_range(1..cols - 1) * cell + cell / 2;
        let y = rng.gen_range(1..rows - 1) * cell + cell / 2;
        let crowded = records.iter().any(|r| {
            ((r.x - x) as f64).abs() < spacing && ((r.y - y) as f64).abs() < spacing
        });
        if crowded {
            continue;
        }
        let facing = *facings.choose(rng).unwrap_or(&Facing::Top);
        records.push(ObstacleRecord {
            x,
            y,
            facing,
            id: records.len() as ObstacleId + 1,
        });
    }
    records
}
