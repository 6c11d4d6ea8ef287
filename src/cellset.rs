#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellSet {
    cells: Vec<u64>,
}

impl CellSet {
    pub fn new(cells: impl IntoIterator<Item = u64>) -> Self {
        let mut cells: Vec<u64> = cells.into_iter().collect();
        cells.sort_unstable();
        cells.dedup();
        Self { cells }
    }

    pub fn has(&self, cell: u64) -> bool {
        self.cells.binary_search(&cell).is_ok()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.cells.iter().copied()
    }
}

impl FromIterator<u64> for CellSet {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        CellSet::new(iter)
    }
}
