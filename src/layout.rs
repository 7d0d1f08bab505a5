//! Conversion of declared column widths into `genpdf` column weights.
//!
//! `genpdf` tables only know relative weights, so star, auto and fixed widths
//! are first resolved to points against the available line width and then
//! scaled to integer weights.

use crate::model::ColumnWidth;
use crate::table::Cell;

/// Average glyph advance relative to the font size, used to estimate the
/// width of `auto` columns.
const AVERAGE_GLYPH_WIDTH: f64 = 0.5;

/// Horizontal cell padding in points added to `auto` columns.
const AUTO_COLUMN_PADDING: f64 = 8.0;

/// Weight units per point.
const WEIGHT_SCALE: f64 = 10.0;

/// Estimated width of an `auto` column in points.
fn auto_width(column: usize, body: &[Vec<Cell>], font_size: f64) -> f64 {
    let longest = body
        .iter()
        .filter_map(|row| row.get(column))
        .map(|cell| cell.text().chars().count())
        .max()
        .unwrap_or(0);
    longest as f64 * font_size * AVERAGE_GLYPH_WIDTH + AUTO_COLUMN_PADDING
}

/// Resolves the declared widths to points for a line of `available` points.
pub fn resolve_widths(
    widths: &[ColumnWidth],
    body: &[Vec<Cell>],
    available: f64,
    font_size: f64,
) -> Vec<f64> {
    let mut resolved: Vec<Option<f64>> = widths
        .iter()
        .enumerate()
        .map(|(column, width)| match width {
            ColumnWidth::Fixed(points) => Some(*points),
            ColumnWidth::Auto => Some(auto_width(column, body, font_size).min(available)),
            ColumnWidth::Star => None,
        })
        .collect();

    let taken: f64 = resolved.iter().flatten().sum();
    let stars = resolved.iter().filter(|width| width.is_none()).count();
    if stars > 0 {
        let share = ((available - taken) / stars as f64).max(font_size * 2.0);
        for width in resolved.iter_mut().filter(|width| width.is_none()) {
            *width = Some(share);
        }
    }

    resolved.into_iter().map(|width| width.unwrap_or_default()).collect()
}

/// Converts the declared widths into relative weights for `genpdf`.
pub fn column_weights(
    widths: &[ColumnWidth],
    body: &[Vec<Cell>],
    available: f64,
    font_size: f64,
) -> Vec<usize> {
    resolve_widths(widths, body, available, font_size)
        .into_iter()
        .map(|points| ((points * WEIGHT_SCALE).round() as usize).max(1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_share_the_remaining_width() {
        let widths = [ColumnWidth::Fixed(100.0), ColumnWidth::Star, ColumnWidth::Star];
        let resolved = resolve_widths(&widths, &[], 500.0, 12.0);
        assert_eq!(resolved, vec![100.0, 200.0, 200.0]);
    }

    #[test]
    fn auto_columns_follow_the_longest_cell() {
        let body = vec![
            vec![Cell::from("short")],
            vec![Cell::from("a much longer value")],
        ];
        let resolved = resolve_widths(&[ColumnWidth::Auto], &body, 500.0, 10.0);
        assert_eq!(resolved, vec![19.0 * 10.0 * 0.5 + 8.0]);
    }

    #[test]
    fn weights_are_never_zero() {
        let widths = [ColumnWidth::Fixed(0.0), ColumnWidth::Star];
        let weights = column_weights(&widths, &[], 100.0, 12.0);
        assert_eq!(weights, vec![1, 1000]);
    }

    #[test]
    fn overfull_tables_keep_a_minimum_star_width() {
        let widths = [ColumnWidth::Fixed(400.0), ColumnWidth::Star];
        let resolved = resolve_widths(&widths, &[], 300.0, 10.0);
        assert_eq!(resolved, vec![400.0, 20.0]);
    }
}
