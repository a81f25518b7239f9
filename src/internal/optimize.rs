//! Minimum-cost bipartite assignment (Kuhn-Munkres).
#![allow(clippy::needless_range_loop)]

use nalgebra::DMatrix;

/// A matched `(row, col)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub row_idx: usize,
    pub col_idx: usize,
}

/// Result of [`linear_sum_assignment`].
#[derive(Debug, Clone, Default)]
pub struct AssignmentResult {
    /// Accepted pairs, ordered by row.
    pub assignments: Vec<Assignment>,
    /// Rows left without a column.
    pub unmatched_rows: Vec<usize>,
    /// Columns left without a row.
    pub unmatched_cols: Vec<usize>,
}

/// Solve the linear sum assignment problem.
///
/// Non-finite entries are forbidden pairs: they are never returned.
/// Among the remaining pairs the solver first maximises the number of
/// assigned rows, then minimises the total cost. Pairs costing more than
/// `max_cost` are dropped from the result afterwards.
pub fn linear_sum_assignment(cost_matrix: &DMatrix<f64>, max_cost: f64) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.shape();
    if num_rows == 0 || num_cols == 0 {
        return AssignmentResult {
            assignments: Vec::new(),
            unmatched_rows: (0..num_rows).collect(),
            unmatched_cols: (0..num_cols).collect(),
        };
    }

    let n = num_rows.max(num_cols);

    // Forbidden pairs get a cost larger than any complete finite assignment
    let max_abs = cost_matrix
        .iter()
        .filter(|c| c.is_finite())
        .fold(0.0_f64, |acc, c| acc.max(c.abs()));
    let forbidden = (max_abs + 1.0) * (n as f64 + 1.0);

    // Pad to square; dummy cells cost nothing
    let mut cost = vec![vec![0.0; n]; n];
    for i in 0..num_rows {
        for j in 0..num_cols {
            let c = cost_matrix[(i, j)];
            cost[i][j] = if c.is_finite() { c } else { forbidden };
        }
    }

    let row_to_col = hungarian(&cost);

    let mut assignments = Vec::new();
    let mut matched_rows = vec![false; num_rows];
    let mut matched_cols = vec![false; num_cols];

    for (row_idx, &col_idx) in row_to_col.iter().enumerate().take(num_rows) {
        if col_idx >= num_cols {
            continue;
        }
        let c = cost_matrix[(row_idx, col_idx)];
        if c.is_finite() && c <= max_cost {
            assignments.push(Assignment { row_idx, col_idx });
            matched_rows[row_idx] = true;
            matched_cols[col_idx] = true;
        }
    }

    AssignmentResult {
        assignments,
        unmatched_rows: (0..num_rows).filter(|&i| !matched_rows[i]).collect(),
        unmatched_cols: (0..num_cols).filter(|&j| !matched_cols[j]).collect(),
    }
}

/// Shortest augmenting path with row/column potentials, O(n^3).
///
/// `cost` must be square with finite entries. Returns `result[row] = col`.
fn hungarian(cost: &[Vec<f64>]) -> Vec<usize> {
    let n = cost.len();
    // 1-based potentials; index 0 is the virtual start column
    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; n + 1];
    let mut col_owner = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for row in 1..=n {
        col_owner[0] = row;
        let mut j0 = 0;
        let mut min_v = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = col_owner[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;

            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if reduced < min_v[j] {
                    min_v[j] = reduced;
                    way[j] = j0;
                }
                if min_v[j] < delta {
                    delta = min_v[j];
                    j1 = j;
                }
            }

            for j in 0..=n {
                if used[j] {
                    u[col_owner[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_v[j] -= delta;
                }
            }

            j0 = j1;
            if col_owner[j0] == 0 {
                break;
            }
        }

        // Flip the augmenting path
        loop {
            let j1 = way[j0];
            col_owner[j0] = col_owner[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut row_to_col = vec![0; n];
    for j in 1..=n {
        if col_owner[j] != 0 {
            row_to_col[col_owner[j] - 1] = j - 1;
        }
    }
    row_to_col
}
