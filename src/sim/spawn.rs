//! Spawn point search
//!
//! Scan concentric rectangular rings outward from the centre of a window and
//! take the empty cell nearest the centre on the first ring that has one. The
//! innermost ring is the degenerate strip left over when the window is not
//! square, so every ring reaches the window edges on the same round.

use glam::IVec2;

/// Cells on the border of the `size` rectangle with lower-left `corner`
fn ring_cells(corner: IVec2, size: IVec2) -> Vec<IVec2> {
    let mut cells = Vec::new();
    if size.x <= 0 || size.y <= 0 {
        return cells;
    }
    let (x0, y0) = (corner.x, corner.y);
    let (x1, y1) = (corner.x + size.x - 1, corner.y + size.y - 1);

    cells.extend((x0..=x1).map(|x| IVec2::new(x, y0)));
    if y1 > y0 {
        cells.extend((x0..=x1).map(|x| IVec2::new(x, y1)));
    }
    for y in y0 + 1..y1 {
        cells.push(IVec2::new(x0, y));
        if x1 > x0 {
            cells.push(IVec2::new(x1, y));
        }
    }
    cells
}

/// Empty cell closest to the centre of a `size` window, in window-local
/// coordinates, or `None` if every cell is occupied
pub fn find_empty_spot(size: IVec2, is_empty: impl Fn(IVec2) -> bool) -> Option<IVec2> {
    let (cols, rows) = (size.x, size.y);
    if cols <= 0 || rows <= 0 {
        return None;
    }

    let mut ring = if rows <= cols {
        IVec2::new(cols - rows + rows % 2, rows % 2)
    } else {
        IVec2::new(cols % 2, rows - cols + cols % 2)
    };
    let mut corner = size / 2 - ring / 2;
    let centre = size / 2;

    while ring.x <= cols && ring.y <= rows {
        let best = ring_cells(corner, ring)
            .into_iter()
            .filter(|p| is_empty(*p))
            .min_by_key(|p| (*p - centre).length_squared());
        if best.is_some() {
            return best;
        }
        ring += IVec2::splat(2);
        corner -= IVec2::ONE;
    }
    None
}
