use crate::aggregate::Aggregate;
use crate::normalize::NormalizedAggregate;
use crate::Key;
use std::collections::HashMap;

/// A sparse entry that can be placed into a [`PivotGrid`].
pub trait PivotCell {
    type Measure: Copy;

    fn row_key(&self) -> &Key;
    fn col_key(&self) -> &Key;
    fn measure(&self) -> Self::Measure;
}

impl PivotCell for Aggregate {
    type Measure = usize;

    fn row_key(&self) -> &Key {
        &self.group
    }

    fn col_key(&self) -> &Key {
        &self.category
    }

    fn measure(&self) -> usize {
        self.count
    }
}

impl PivotCell for NormalizedAggregate {
    type Measure = f64;

    fn row_key(&self) -> &Key {
        &self.group
    }

    fn col_key(&self) -> &Key {
        &self.category
    }

    fn measure(&self) -> f64 {
        self.percent
    }
}

/// A dense row-major matrix over explicit row and column domains.
#[derive(Clone, Debug, PartialEq)]
pub struct PivotGrid<T> {
    row_domain: Vec<Key>,
    col_domain: Vec<Key>,
    cells: Vec<T>,
}

/// Place sparse entries into a dense grid of shape `row_domain.len() x col_domain.len()`.
///
/// Cells without an entry hold `fill`. Entries whose row or column key is not in the supplied
/// domain cannot be placed and are skipped. If two entries share coordinates the later one wins.
pub fn materialize<C: PivotCell>(
    entries: &[C],
    row_domain: &[Key],
    col_domain: &[Key],
    fill: C::Measure,
) -> PivotGrid<C::Measure> {
    let row_index: HashMap<&Key, usize> = row_domain.iter().enumerate().map(|(i, k)| (k, i)).collect();
    let col_index: HashMap<&Key, usize> = col_domain.iter().enumerate().map(|(i, k)| (k, i)).collect();

    let width = col_domain.len();
    let mut cells = vec![fill; row_domain.len() * width];
    let mut skipped = 0usize;

    for entry in entries {
        match (row_index.get(entry.row_key()), col_index.get(entry.col_key())) {
            (Some(&r), Some(&c)) => cells[r * width + c] = entry.measure(),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        log::debug!("materialize: {skipped} entries fell outside the pivot domains");
    }

    PivotGrid {
        row_domain: row_domain.to_vec(),
        col_domain: col_domain.to_vec(),
        cells,
    }
}

impl<T: Copy> PivotGrid<T> {
    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_domain.len(), self.col_domain.len())
    }

    pub fn row_labels(&self) -> &[Key] {
        &self.row_domain
    }

    pub fn col_labels(&self) -> &[Key] {
        &self.col_domain
    }

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row >= self.row_domain.len() || col >= self.col_domain.len() {
            return None;
        }
        self.cells.get(row * self.col_domain.len() + col).copied()
    }

    /// Look a cell up by its row and column keys.
    pub fn value(&self, row: &str, col: &str) -> Option<T> {
        let r = self.row_domain.iter().position(|k| k.as_ref() == row)?;
        let c = self.col_domain.iter().position(|k| k.as_ref() == col)?;
        self.get(r, c)
    }

    pub fn row(&self, row: usize) -> Option<&[T]> {
        let width = self.col_domain.len();
        if row >= self.row_domain.len() {
            return None;
        }
        Some(&self.cells[row * width..(row + 1) * width])
    }

    /// `(row label, row cells)` pairs in row order.
    pub fn rows(&self) -> impl Iterator<Item = (&Key, &[T])> + '_ {
        let width = self.col_domain.len();
        self.row_domain.iter().enumerate().map(move |(i, label)| {
            let start = i * width;
            (label, &self.cells[start..start + width])
        })
    }

    pub fn map<U>(&self, f: impl Fn(T) -> U) -> PivotGrid<U> {
        PivotGrid {
            row_domain: self.row_domain.clone(),
            col_domain: self.col_domain.clone(),
            cells: self.cells.iter().copied().map(f).collect(),
        }
    }

    /// Header-first string table: `[corner, col labels...]` followed by one row per row label.
    pub fn to_string_rows(&self, corner: &str, format: impl Fn(T) -> String) -> Vec<Vec<String>> {
        let mut out = Vec::with_capacity(self.row_domain.len() + 1);
        let mut header = Vec::with_capacity(self.col_domain.len() + 1);
        header.push(corner.to_string());
        header.extend(self.col_domain.iter().map(|k| k.to_string()));
        out.push(header);

        for (label, cells) in self.rows() {
            let mut line = Vec::with_capacity(cells.len() + 1);
            line.push(label.to_string());
            line.extend(cells.iter().copied().map(&format));
            out.push(line);
        }
        out
    }
}

impl<T: Copy + PartialOrd> PivotGrid<T> {
    pub fn max_value(&self) -> Option<T> {
        self.cells
            .iter()
            .copied()
            .fold(None, |acc, v| match acc {
                Some(m) if m >= v => Some(m),
                _ => Some(v),
            })
    }
}

impl PivotGrid<usize> {
    pub fn row_totals(&self) -> Vec<usize> {
        self.rows().map(|(_, cells)| cells.iter().sum()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn domain(keys: &[&str]) -> Vec<Key> {
        keys.iter().map(|k| Arc::from(*k)).collect()
    }

    #[test]
    fn entries_outside_the_domain_are_skipped() {
        let entries = vec![Aggregate::new("A", "X", 2), Aggregate::new("Z", "X", 9)];
        let grid = materialize(&entries, &domain(&["A"]), &domain(&["X", "Y"]), 0);
        assert_eq!(grid.shape(), (1, 2));
        assert_eq!(grid.row(0), Some(&[2usize, 0][..]));
    }

    #[test]
    fn empty_domains_produce_an_empty_grid() {
        let grid = materialize::<Aggregate>(&[], &[], &domain(&["X"]), 0);
        assert_eq!(grid.shape(), (0, 1));
        assert_eq!(grid.max_value(), None);
        assert_eq!(grid.get(0, 0), None);
    }

    #[test]
    fn string_rows_put_the_header_first() {
        let entries = vec![Aggregate::new("A", "X", 1), Aggregate::new("B", "Y", 3)];
        let grid = materialize(&entries, &domain(&["A", "B"]), &domain(&["X", "Y"]), 0);
        assert_eq!(
            grid.to_string_rows("ethnicity", |v| v.to_string()),
            vec![
                vec!["ethnicity".to_string(), "X".to_string(), "Y".to_string()],
                vec!["A".to_string(), "1".to_string(), "0".to_string()],
                vec!["B".to_string(), "0".to_string(), "3".to_string()],
            ]
        );
        assert_eq!(grid.row_totals(), vec![1, 3]);
        assert_eq!(grid.max_value(), Some(3));
    }
}
