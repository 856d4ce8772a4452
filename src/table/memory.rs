use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use super::{CellRange, RowStyle, TableStore};
use crate::errors::StoreError;

/// One call issued against a [`MemoryTableStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Read(CellRange),
    Write(CellRange),
    Append { rows: usize },
    Format(CellRange, RowStyle),
}

impl StoreOp {
    /// Read-only calls do not count against the write budget.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, StoreOp::Read(_))
    }
}

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<Vec<String>>,
    styles: BTreeMap<usize, RowStyle>,
    ops: Vec<StoreOp>,
    /// Mutations left before every further one fails.
    fail_after: Option<usize>,
}

/// Table store held in process memory. Records every call it receives.
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    inner: Mutex<Inner>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                rows,
                ..Inner::default()
            }),
        }
    }

    /// Let `n` more mutations succeed, then fail all later ones.
    pub async fn fail_after(&self, n: usize) {
        self.inner.lock().await.fail_after = Some(n);
    }

    pub async fn heal(&self) {
        self.inner.lock().await.fail_after = None;
    }

    pub async fn rows(&self) -> Vec<Vec<String>> {
        self.inner.lock().await.rows.clone()
    }

    pub async fn style_of(&self, row: usize) -> Option<RowStyle> {
        self.inner.lock().await.styles.get(&row).copied()
    }

    pub async fn ops(&self) -> Vec<StoreOp> {
        self.inner.lock().await.ops.clone()
    }

    pub async fn clear_ops(&self) {
        self.inner.lock().await.ops.clear();
    }
}

impl Inner {
    fn admit(&mut self, op: StoreOp) -> Result<(), StoreError> {
        if let Some(left) = self.fail_after.as_mut() {
            if *left == 0 {
                return Err(StoreError::Unexpected(format!("injected failure on {op:?}")));
            }
            *left -= 1;
        }
        self.ops.push(op);
        Ok(())
    }

    fn last_filled_row(&self) -> usize {
        self.rows
            .iter()
            .rposition(|r| r.iter().any(|c| !c.trim().is_empty()))
            .map_or(0, |i| i + 1)
    }

    fn put_row(&mut self, row: usize, cells: &[String]) {
        if self.rows.len() < row {
            self.rows.resize(row, Vec::new());
        }
        let target = &mut self.rows[row - 1];
        if target.len() < cells.len() {
            target.resize(cells.len(), String::new());
        }
        target[..cells.len()].clone_from_slice(cells);
    }
}

fn check_range(range: &CellRange) -> Result<(), StoreError> {
    if range.start_row == 0 || range.end_row.is_some_and(|end| end < range.start_row) {
        return Err(StoreError::InvalidRange(range.to_string()));
    }
    Ok(())
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn read_range(&self, range: CellRange) -> Result<Vec<Vec<String>>, StoreError> {
        check_range(&range)?;
        let mut inner = self.inner.lock().await;
        inner.ops.push(StoreOp::Read(range));

        let start = range.start_row - 1;
        let end = range
            .end_row
            .unwrap_or(inner.rows.len())
            .min(inner.rows.len());
        if start >= end {
            return Ok(Vec::new());
        }

        let rows = inner.rows[start..end]
            .iter()
            .map(|r| match range.width {
                Some(w) => r.iter().take(w).cloned().collect(),
                None => r.clone(),
            })
            .collect();
        Ok(rows)
    }

    async fn write_range(&self, range: CellRange, rows: &[Vec<String>]) -> Result<(), StoreError> {
        check_range(&range)?;
        if range.row_count().is_some_and(|n| n != rows.len()) {
            return Err(StoreError::InvalidRange(format!(
                "{range} given {} rows",
                rows.len()
            )));
        }

        let mut inner = self.inner.lock().await;
        inner.admit(StoreOp::Write(range))?;
        for (i, cells) in rows.iter().enumerate() {
            inner.put_row(range.start_row + i, cells);
        }
        Ok(())
    }

    async fn append_rows(&self, rows: &[Vec<String>]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.admit(StoreOp::Append { rows: rows.len() })?;
        let first = inner.last_filled_row() + 1;
        for (i, cells) in rows.iter().enumerate() {
            inner.put_row(first + i, cells);
        }
        Ok(())
    }

    async fn format_range(&self, range: CellRange, style: RowStyle) -> Result<(), StoreError> {
        check_range(&range)?;
        let end = range
            .end_row
            .ok_or_else(|| StoreError::InvalidRange(format!("{range} is open-ended")))?;

        let mut inner = self.inner.lock().await;
        inner.admit(StoreOp::Format(range, style))?;
        for row in range.start_row..=end {
            inner.styles.insert(row, style);
        }
        Ok(())
    }
}
