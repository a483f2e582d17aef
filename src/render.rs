use rayon::prelude::*;

use crate::belief::Belief;
use crate::grid::Grid;
use crate::motion::Position;
use crate::terrain::{Environment, Terrain};

/// Pixels per grid cell.
pub const CELL: usize = 20;
const MARKER: usize = 10;

const SAND: [u8; 4] = [0xff, 0xff, 0xaa, 255];
const GRASS: [u8; 4] = [0xaa, 0xff, 0xaa, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];
const RED: [u8; 4] = [255, 0, 0, 255];

/// Marker drawn over the true position.
#[derive(Clone, Copy, Debug)]
pub struct Marker {
    pub position: Position,
    pub correct: bool,
}

/// Image size in pixels for a grid of `w` x `h` cells.
pub fn image_size(w: usize, h: usize) -> (usize, usize) {
    (w * CELL, h * CELL)
}

pub fn terrain_color(t: Terrain) -> [u8; 4] {
    match t {
        Terrain::Sand => SAND,
        Terrain::Grass => GRASS,
    }
}

/// Heat colour: hue slides from 200 (cold) to 0 (certain).
pub fn probability_color(p: f64) -> [u8; 4] {
    let hue = 200.0 - (p * 200.0).floor();
    hsl_to_rgba(hue, 0.8, 0.6)
}

fn hsl_to_rgba(hue: f64, s: f64, l: f64) -> [u8; 4] {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b), 255]
}

/// Terrain map with the true position marked: black when the last reading
/// was truthful, red otherwise.
pub fn render_environment(env: &Environment, marker: Option<Marker>) -> Vec<u8> {
    rasterize(&env.labels.map(terrain_color), marker)
}

pub fn render_belief(belief: &Belief) -> Vec<u8> {
    rasterize(&belief.grid.map(probability_color), None)
}

fn rasterize(colors: &Grid<[u8; 4]>, marker: Option<Marker>) -> Vec<u8> {
    let (pw, ph) = image_size(colors.w, colors.h);
    let mut rgba = vec![0u8; pw * ph * 4];

    rgba.par_chunks_mut(pw * 4)
        .enumerate()
        .for_each(|(py, row)| {
            let cy = py / CELL;
            for px in 0..pw {
                let cx = px / CELL;
                let border = px == 0 || py == 0 || px == pw - 1 || py == ph - 1;
                let color = if border {
                    BLACK
                } else {
                    match marker {
                        Some(m) if in_marker(m.position, px, py) => {
                            if m.correct { BLACK } else { RED }
                        }
                        _ => colors.get(cx as i64, cy as i64),
                    }
                };
                row[px * 4..px * 4 + 4].copy_from_slice(&color);
            }
        });

    rgba
}

fn in_marker(pos: Position, px: usize, py: usize) -> bool {
    let inset = (CELL - MARKER) / 2;
    let (x0, y0) = (pos.x * CELL + inset, pos.y * CELL + inset);
    (x0..x0 + MARKER).contains(&px) && (y0..y0 + MARKER).contains(&py)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(rgba: &[u8], w: usize, x: usize, y: usize) -> [u8; 4] {
        let i = (y * w + x) * 4;
        [rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]]
    }

    #[test]
    fn heat_endpoints() {
        // hsl(200, 80%, 60%) and hsl(0, 80%, 60%)
        assert_eq!(probability_color(0.0), [71, 180, 235, 255]);
        assert_eq!(probability_color(1.0), [235, 71, 71, 255]);
    }

    #[test]
    fn environment_cells_and_marker() {
        let labels = Grid::from_vec(2, 1, vec![Terrain::Sand, Terrain::Grass]).unwrap();
        let env = Environment::from_labels(labels);
        let marker = Marker {
            position: Position::new(1, 0),
            correct: false,
        };
        let rgba = render_environment(&env, Some(marker));
        let (w, h) = image_size(2, 1);
        assert_eq!(rgba.len(), w * h * 4);
        assert_eq!(pixel(&rgba, w, 0, 0), BLACK);
        assert_eq!(pixel(&rgba, w, 3, 3), SAND);
        assert_eq!(pixel(&rgba, w, 22, 2), GRASS);
        assert_eq!(pixel(&rgba, w, 30, 10), RED);
    }

    #[test]
    fn belief_has_one_color_per_cell() {
        let rgba = render_belief(&Belief::uniform(3, 3));
        let (w, _) = image_size(3, 3);
        assert_eq!(pixel(&rgba, w, 5, 5), pixel(&rgba, w, 45, 45));
    }
}
