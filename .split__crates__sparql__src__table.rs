//! `Table`: an ordered-column sequence of solution rows.
//!
//! Every cell holds a term's canonical lexical form (`<iri>`, `_:label`,
//! `"lex"...`) or the empty string for an unbound column — the same
//! convention `store::Graph::enumerate` already uses for its rows, so a
//! pattern solution can be joined into a table without re-encoding.

use std::collections::HashMap;

/// A sequence of solution rows over a fixed, named set of columns.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// An empty table with no columns and a single empty row — the join
    /// identity, used as the starting point of a plain group's evaluation.
    pub fn unit() -> Self {
        Table {
            columns: Vec::new(),
            rows: vec![Vec::new()],
        }
    }

    /// A table with no rows at all — the union/projection identity.
    pub fn empty(columns: Vec<String>) -> Self {
        Table { columns, rows: Vec::new() }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Table { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: &[String], name: &str) -> Option<String> {
        self.column_index(name).map(|i| row[i].clone()).filter(|v| !v.is_empty())
    }

    /// Ensures `name` is a column and fills it with `value` in every row
    /// that doesn't already have one — used to bind a `GRAPH ?g` variable
    /// or a CONSTRUCT/VALUES constant column onto an existing table.
    pub fn bind_constant(&self, name: &str, value: &str) -> Table {
        let mut table = self.clone();
        let idx = table.ensure_column(name);
        for row in &mut table.rows {
            if row[idx].is_empty() {
                row[idx] = value.to_string();
            }
        }
        table
    }

    /// Appends a new column (initialized to empty in every existing row)
    /// unless it is already present, returning its index either way.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(i) = self.column_index(name) {
            return i;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.columns.len() - 1
    }

    /// Natural join on every column name shared between `self` and
    /// `other`: rows are combined when the shared columns agree, and the
    /// result carries the union of both column sets.
    pub fn join(&self, other: &Table) -> Table {
        let shared: Vec<(usize, usize)> = self
            .columns
            .iter()
            .enumerate()
            .filter_map(|(li, name)| other.column_index(name).map(|ri| (li, ri)))
            .collect();
        let mut columns = self.columns.clone();
        let mut right_only = Vec::new();
        for (i, name) in other.columns.iter().enumerate() {
            if self.column_index(name).is_none() {
                right_only.push(i);
                columns.push(name.clone());
            }
        }
        let mut rows = Vec::new();
        for left in &self.rows {
            for right in &other.rows {
                if shared.iter().all(|&(li, ri)| compatible(&left[li], &right[ri])) {
                    let mut merged = left.clone();
                    for &(li, ri) in &shared {
                        if merged[li].is_empty() {
                            merged[li] = right[ri].clone();
                        }
                    }
                    for &ri in &right_only {
                        merged.push(right[ri].clone());
                    }
                    rows.push(merged);
                }
            }
        }
        Table { columns, rows }
    }

    /// Left outer join (`OPTIONAL`): unmatched left rows survive once, with
    /// empty strings filled in for every right-only column.
    pub fn left_join(&self, other: &Table) -> Table {
        let joined = self.join(other);
        let mut columns = joined.columns.clone();
        for name in &other.columns {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        let shared: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter_map(|(li, name)| other.column_index(name).map(|_| li))
            .collect();
        let mut rows = joined.rows;
        for left in &self.rows {
            let matched = other.rows.iter().any(|right| {
                shared.iter().all(|&li| {
                    let name = &self.columns[li];
                    let rv = other.get(right, name).unwrap_or_default();
                    compatible(&left[li], &rv)
                })
            });
            if !matched {
                let mut padded = left.clone();
                padded.resize(columns.len(), String::new());
                rows.push(padded);
            }
        }
        Table { columns, rows }
    }

    /// Anti-join (`MINUS`): drops rows from `self` that agree with some row
    /// of `other` on every column name the two tables share. Per SPARQL
    /// semantics, rows sharing no column name at all are never removed.
    pub fn minus(&self, other: &Table) -> Table {
        let shared: Vec<(usize, usize)> = self
            .columns
            .iter()
            .enumerate()
            .filter_map(|(li, name)| other.column_index(name).map(|ri| (li, ri)))
            .collect();
        if shared.is_empty() {
            return self.clone();
        }
        let rows = self
            .rows
            .iter()
            .filter(|left| !other.rows.iter().any(|right| shared.iter().all(|&(li, ri)| compatible(&left[li], &right[ri]))))
            .cloned()
            .collect();
        Table { columns: self.columns.clone(), rows }
    }

    /// Outer union, column-wise aligned by name; a column present in only
    /// one side is filled with empty strings on the other.
    pub fn union(&self, other: &Table) -> Table {
        let mut columns = self.columns.clone();
        for name in &other.columns {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        let mut rows = Vec::with_capacity(self.rows.len() + other.rows.len());
        for (table, src_columns) in [(self, &self.columns), (other, &other.columns)] {
            for row in &table.rows {
                let mut out = vec![String::new(); columns.len()];
                for (i, name) in src_columns.iter().enumerate() {
                    let target = columns.iter().position(|c| c == name).unwrap();
                    out[target] = row[i].clone();
                }
                rows.push(out);
            }
        }
        Table { columns, rows }
    }

    pub fn project(&self, names: &[String]) -> Table {
        let indices: Vec<Option<usize>> = names.iter().map(|n| self.column_index(n)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|idx| idx.map(|i| row[i].clone()).unwrap_or_default()).collect())
            .collect();
        Table { columns: names.to_vec(), rows }
    }

    /// Deduplicates rows by their composite group key, keeping first
    /// occurrence order.
    pub fn distinct(&self) -> Table {
        let mut seen = std::collections::HashSet::new();
        let rows = self
            .rows
            .iter()
            .filter(|row| seen.insert(composite_key(row)))
            .cloned()
            .collect();
        Table { columns: self.columns.clone(), rows }
    }

    pub fn limit_offset(&self, limit: i64, offset: i64) -> Table {
        let offset = offset.max(0) as usize;
        let skipped: Vec<Vec<String>> = self.rows.iter().skip(offset).cloned().collect();
        let rows = if limit < 0 { skipped } else { skipped.into_iter().take(limit as usize).collect() };
        Table { columns: self.columns.clone(), rows }
    }

    /// Groups rows by the composite key of `group_vars`, preserving the
    /// order each key was first seen.
    pub fn group_by(&self, group_vars: &[String]) -> Vec<(Vec<String>, Table)> {
        if group_vars.is_empty() {
            return vec![(Vec::new(), self.clone())];
        }
        let indices: Vec<usize> = group_vars.iter().filter_map(|n| self.column_index(n)).collect();
        let mut order = Vec::new();
        let mut groups: HashMap<String, Vec<Vec<String>>> = HashMap::new();
        for row in &self.rows {
            let key_values: Vec<String> = indices.iter().map(|&i| row[i].clone()).collect();
            let key = composite_key(&key_values);
            if !groups.contains_key(&key) {
                order.push((key.clone(), key_values));
            }
            groups.entry(key).or_default().push(row.clone());
        }
        order
            .into_iter()
            .map(|(key, values)| (values, Table { columns: self.columns.clone(), rows: groups.remove(&key).unwrap_or_default() }))
            .collect()
    }
}

fn compatible(left: &str, right: &str) -> bool {
    left.is_empty() || right.is_empty() || left == right
}

/// Classifies a canonical cell value into SPARQL's term-equality bucket:
/// 0 unbound, 1 blank, 2 IRI, 3 literal.
fn term_kind(cell: &str) -> u8 {
    if cell.is_empty() {
        0
    } else if cell.starts_with("_:") {
        1
    } else if cell.starts_with('<') {
        2
    } else {
        3
    }
}

/// The `"|{kind} {value}|…"` composite key used for DISTINCT and GROUP BY.
pub fn composite_key(row: &[String]) -> String {
    let mut key = String::new();
    for cell in row {
        key.push('|');
        key.push_str(&term_kind(cell).to_string());
        key.push(' ');
        key.push_str(cell);
        key.push('|');
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_rows(
            columns.iter().map(|s| s.to_string()).collect(),
            rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect(),
        )
    }

    #[test]
    fn join_matches_on_shared_columns() {
        let left = t(&["s"], &[&["<a>"], &["<b>"]]);
        let right = t(&["s", "o"], &[&["<a>", "<x>"]]);
        let joined = left.join(&right);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined.columns(), &["s".to_string(), "o".to_string()]);
    }

    #[test]
    fn left_join_pads_unmatched_rows() {
        let left = t(&["s"], &[&["<a>"], &["<b>"]]);
        let right = t(&["s", "m"], &[&["<a>", "\"x\""]]);
        let joined = left.left_join(&right);
        assert_eq!(joined.len(), 2);
        let b_row = joined.rows().iter().find(|r| r[0] == "<b>").unwrap();
        assert_eq!(b_row[1], "");
    }

    #[test]
    fn minus_drops_rows_sharing_all_common_columns() {
        let left = t(&["s"], &[&["<a>"], &["<b>"]]);
        let right = t(&["s"], &[&["<a>"]]);
        let result = left.minus(&right);
        assert_eq!(result.rows(), &[vec!["<b>".to_string()]]);
    }

    #[test]
    fn union_aligns_by_column_name() {
        let left = t(&["s"], &[&["<a>"]]);
        let right = t(&["o"], &[&["<b>"]]);
        let result = left.union(&right);
        assert_eq!(result.len(), 2);
        assert_eq!(result.columns().len(), 2);
    }

    #[test]
    fn distinct_keeps_first_occurrence_order() {
        let rows = t(&["s"], &[&["<a>"], &["<a>"], &["<b>"]]);
        assert_eq!(rows.distinct().len(), 2);
    }

    #[test]
    fn group_by_partitions_rows_by_key() {
        let rows = t(&["a", "n"], &[&["20", "x"], &["20", "y"], &["30", "z"]]);
        let groups = rows.group_by(&["a".to_string()]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].1.len(), 1);
    }

    #[test]
    fn composite_key_distinguishes_term_kinds() {
        assert_ne!(composite_key(&["".to_string()]), composite_key(&["\"\"".to_string()]));
    }
}


