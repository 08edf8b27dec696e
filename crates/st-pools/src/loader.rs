use ndarray::{Array2, Axis};
use std::fs;
use std::path::Path;

use st_types::{PoolError, PoolResult};

/// Recorded inputs, primary outputs and safety outputs.
pub type Tables = (Array2<f64>, Array2<f64>, Array2<f64>);

/// Load a whitespace-delimited numeric table as a 2-D array.
///
/// Every non-empty line is one row; text after `#` is ignored. All rows must
/// have the same number of columns.
pub fn load_table<P: AsRef<Path>>(path: P) -> PoolResult<Array2<f64>> {
    let path = path.as_ref();
    tracing::debug!("Loading table from: {}", path.display());

    let content = fs::read_to_string(path).map_err(|e| PoolError::Load {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_table(&content).map_err(|message| PoolError::Load {
        path: path.display().to_string(),
        message,
    })
}

fn parse_table(content: &str) -> Result<Array2<f64>, String> {
    let mut values = Vec::new();
    let mut n_cols: Option<usize> = None;
    let mut n_rows = 0;

    for (line_num, line) in content.lines().enumerate() {
        let data = line.split('#').next().unwrap_or("").trim();
        if data.is_empty() {
            continue;
        }
        let row = data
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|e| {
                    format!("could not parse '{}' at line {}: {}", token, line_num + 1, e)
                })
            })
            .collect::<Result<Vec<f64>, String>>()?;

        match n_cols {
            None => n_cols = Some(row.len()),
            Some(expected) if expected != row.len() => {
                return Err(format!(
                    "line {} has {} columns, expected {}",
                    line_num + 1,
                    row.len(),
                    expected
                ));
            }
            Some(_) => {}
        }
        values.extend(row);
        n_rows += 1;
    }

    let n_cols = n_cols.ok_or_else(|| "table is empty".to_string())?;
    Array2::from_shape_vec((n_rows, n_cols), values).map_err(|e| e.to_string())
}

/// Load the three parallel tables of a recorded dataset.
///
/// Row `i` of each table describes the same experiment, so the row counts
/// must agree.
pub fn load_data<P: AsRef<Path>>(x_path: P, y_path: P, z_path: P) -> PoolResult<Tables> {
    let x = load_table(&x_path)?;
    let y = load_table(&y_path)?;
    let z = load_table(&z_path)?;

    if x.len_of(Axis(0)) != y.len_of(Axis(0)) || x.len_of(Axis(0)) != z.len_of(Axis(0)) {
        return Err(PoolError::Load {
            path: x_path.as_ref().display().to_string(),
            message: format!(
                "row counts differ: x has {}, y has {}, z has {}",
                x.nrows(),
                y.nrows(),
                z.nrows()
            ),
        });
    }

    tracing::info!(
        "Loaded dataset with {} rows from {}",
        x.nrows(),
        x_path.as_ref().display()
    );
    Ok((x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn table_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_whitespace_and_comments() {
        let table = parse_table("# header\n1.0  2.0\t3.0\n\n4 5 6 # trailing\n").unwrap();
        assert_eq!(table, array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    }

    #[test]
    fn single_line_is_one_row() {
        let table = parse_table("0.5 0.25\n").unwrap();
        assert_eq!(table.dim(), (1, 2));
    }

    #[test]
    fn single_column_stays_a_column() {
        let table = parse_table("1\n2\n3\n").unwrap();
        assert_eq!(table.dim(), (3, 1));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = parse_table("1 2\n3\n").unwrap_err();
        assert!(err.contains("line 2"), "{err}");
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = parse_table("1 two\n").unwrap_err();
        assert!(err.contains("'two'"), "{err}");
    }

    #[test]
    fn load_data_keeps_rows_aligned() {
        let x = table_file("0.1 0.2\n0.3 0.4\n");
        let y = table_file("1.0\n2.0\n");
        let z = table_file("0.5 0.6\n0.7 0.8\n");
        let (xs, ys, zs) = load_data(x.path(), y.path(), z.path()).unwrap();
        assert_eq!(xs.row(1), array![0.3, 0.4]);
        assert_eq!(ys[[1, 0]], 2.0);
        assert_eq!(zs.row(1), array![0.7, 0.8]);
    }

    #[test]
    fn load_data_rejects_misaligned_tables() {
        let x = table_file("0.1 0.2\n0.3 0.4\n");
        let y = table_file("1.0\n");
        let z = table_file("0.5\n0.7\n");
        let result = load_data(x.path(), y.path(), z.path());
        assert!(matches!(result, Err(PoolError::Load { .. })));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let result = load_table("/definitely/not/here.txt");
        assert!(matches!(result, Err(PoolError::Load { .. })));
    }
}
