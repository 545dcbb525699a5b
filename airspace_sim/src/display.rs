//! Textual views of a snapshot: position listing and radar grid.

use airspace_core::{AircraftId, AircraftRecord};
use std::fmt::Write as _;

/// Radar grid edge length in cells (one unit per cell).
pub const GRID_SIZE: usize = 20;

/// Radar symbol: `0-9`, then `A-Z` for ids 10..36, `*` otherwise.
pub fn radar_symbol(id: AircraftId) -> char {
    match id.0 {
        0..=9 => char::from(b'0' + id.0 as u8),
        10..=35 => char::from(b'A' + (id.0 - 10) as u8),
        _ => '*',
    }
}

/// The periodic "current positions" dump of active aircraft.
pub fn render_positions(records: &[AircraftRecord]) -> String {
    let mut out = String::from("\nCurrent Aircraft Positions:\n");
    for r in records.iter().filter(|r| r.active) {
        let _ = writeln!(
            out,
            "Aircraft {}: X={:.2}, Y={:.2}, Z={:.2}",
            r.id, r.position.x, r.position.y, r.position.z
        );
    }
    out
}

/// Listing plus a `GRID_SIZE`×`GRID_SIZE` grid of active aircraft.
///
/// Aircraft outside the grid are listed but not drawn; when two share
/// a cell the first one in slot order keeps it.
pub fn render_radar(records: &[AircraftRecord]) -> String {
    let mut grid = [['.'; GRID_SIZE]; GRID_SIZE];
    let mut out = String::from("\nAircraft Positions on Radar:\n\nActive aircraft on radar:\n");

    for r in records.iter().filter(|r| r.active) {
        let _ = writeln!(
            out,
            "ID {} at ({:.2}, {:.2}, {:.2}) speed ({:.2}, {:.2}, {:.2})",
            r.id, r.position.x, r.position.y, r.position.z, r.velocity.x, r.velocity.y, r.velocity.z
        );

        let (gx, gy) = (r.position.x.floor(), r.position.y.floor());
        if gx < 0.0 || gy < 0.0 || gx >= GRID_SIZE as f32 || gy >= GRID_SIZE as f32 {
            continue;
        }

        let cell = &mut grid[gy as usize][gx as usize];
        if *cell == '.' {
            *cell = radar_symbol(r.id);
        }
    }

    out.push_str("\nRadar Grid:\n");
    for row in &grid {
        let line: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn record(id: i32, x: f32, y: f32) -> AircraftRecord {
        AircraftRecord::new(AircraftId(id), Vector3::new(x, y, 1.0), Vector3::zeros())
    }

    #[test]
    fn test_radar_symbol() {
        assert_eq!(radar_symbol(AircraftId(0)), '0');
        assert_eq!(radar_symbol(AircraftId(9)), '9');
        assert_eq!(radar_symbol(AircraftId(10)), 'A');
        assert_eq!(radar_symbol(AircraftId(35)), 'Z');
        assert_eq!(radar_symbol(AircraftId(36)), '*');
        assert_eq!(radar_symbol(AircraftId(-1)), '*');
    }

    #[test]
    fn test_render_positions_skips_retired() {
        let mut retired = record(2, 5.0, 5.0);
        retired.active = false;

        let text = render_positions(&[record(1, 1.0, 2.0), retired]);
        assert!(text.contains("Aircraft 1: X=1.00, Y=2.00, Z=1.00"));
        assert!(!text.contains("Aircraft 2"));
    }

    #[test]
    fn test_render_radar_grid() {
        let records = [record(1, 3.4, 0.2), record(2, 3.9, 0.9), record(3, 25.0, 1.0)];
        let text = render_radar(&records);

        let grid: Vec<&str> = text
            .lines()
            .skip_while(|l| !l.starts_with("Radar Grid"))
            .skip(1)
            .collect();
        assert_eq!(grid.len(), GRID_SIZE);

        // Row 0, column 3: aircraft 1 keeps the shared cell
        assert_eq!(grid[0].split(' ').nth(3), Some("1"));
        assert!(!grid.iter().any(|row| row.contains('2') || row.contains('3')));

        // Off-grid aircraft is still listed
        assert!(text.contains("ID 3 at (25.00, 1.00, 1.00)"));
    }
}
