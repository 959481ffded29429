//! Cleaning and transform steps over polars [`DataFrame`]s.

use polars::prelude::{
    col, lit, when, DataFrame, DataType, Expr, IntoLazy, Literal, PolarsError,
    SortMultipleOptions, NULL,
};
use std::cmp::Ordering;
use thiserror::Error;

/// Cell contents that are read as missing values, in addition to empty fields.
pub const MISSING_MARKERS: [&str; 11] = [
    "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "<NA>", "#N/A", "-nan",
];

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("invalid bins: {0}")]
    InvalidBins(String),

    #[error("dataframe error: {0}")]
    Polars(#[from] PolarsError),
}

pub type DatasetResult<T> = Result<T, DatasetError>;

/// Fixed bucket edges and the label assigned to each bucket.
///
/// Buckets are left-exclusive and right-inclusive: with edges `[a, b, c]` a value `v` gets the
/// first label when `a < v <= b` and the second when `b < v <= c`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bins {
    edges: Vec<f64>,
    labels: Vec<i64>,
}

impl Bins {
    pub fn new(edges: Vec<f64>, labels: Vec<i64>) -> DatasetResult<Self> {
        if edges.len() < 2 {
            return Err(DatasetError::InvalidBins("at least two edges are required".into()));
        }
        if edges.windows(2).any(|pair| pair[0].partial_cmp(&pair[1]) != Some(Ordering::Less)) {
            return Err(DatasetError::InvalidBins("edges must increase monotonically".into()));
        }
        if labels.len() != edges.len() - 1 {
            return Err(DatasetError::InvalidBins(format!(
                "expected {} labels, got {}", edges.len() - 1, labels.len(),
            )));
        }
        Ok(Self { edges, labels })
    }

    /// An expression that labels the values of `source`. Values that are not numeric or fall
    /// outside every bucket get a null label.
    pub fn label_expr(&self, source: &str) -> Expr {
        let value = col(source).cast(DataType::Float64);
        self.edges
            .windows(2)
            .zip(&self.labels)
            .rev()
            .fold(lit(NULL).cast(DataType::Int64), |otherwise, (edge, &label)| {
                when(value.clone().gt(lit(edge[0])).and(value.clone().lt_eq(lit(edge[1]))))
                    .then(lit(label))
                    .otherwise(otherwise)
            })
    }
}

/// Removes every row that holds a null in any column.
pub fn drop_missing(dataset: &DataFrame) -> DatasetResult<DataFrame> {
    Ok(dataset.drop_nulls::<String>(None)?)
}

/// Adds `new_column` holding the bucket label of `source` for every row. Rows are never
/// removed. An existing column with the same name is replaced.
pub fn cut(
    dataset: &DataFrame,
    source: &str,
    new_column: &str,
    bins: &Bins,
) -> DatasetResult<DataFrame> {
    Ok(dataset
        .clone()
        .lazy()
        .with_column(bins.label_expr(source).alias(new_column))
        .collect()?)
}

/// Sorts by `column`. The sort is stable and nulls go last in either direction.
pub fn sort_by(dataset: &DataFrame, column: &str, ascending: bool) -> DatasetResult<DataFrame> {
    let options = SortMultipleOptions::default()
        .with_order_descending(!ascending)
        .with_nulls_last(true)
        .with_maintain_order(true);
    Ok(dataset.sort([column], options)?)
}

/// Returns the rows where `column` equals `value`.
pub fn filter_eq<L: Literal>(dataset: &DataFrame, column: &str, value: L) -> DatasetResult<DataFrame> {
    Ok(dataset.clone().lazy().filter(col(column).eq(lit(value))).collect()?)
}

/// Returns a single-row frame with the mean of each numeric column over the rows where `column`
/// equals `value`. Nulls are skipped and non-numeric columns are left out.
pub fn mean_by_filter<L: Literal>(
    dataset: &DataFrame,
    column: &str,
    value: L,
) -> DatasetResult<DataFrame> {
    let means: Vec<Expr> = dataset
        .get_columns()
        .iter()
        .filter(|column| matches!(
            column.dtype(),
            DataType::Int32 | DataType::Int64 | DataType::UInt32 | DataType::UInt64
                | DataType::Float32 | DataType::Float64
        ))
        .map(|column| col(column.name().clone()).mean())
        .collect();
    Ok(dataset
        .clone()
        .lazy()
        .filter(col(column).eq(lit(value)))
        .select(means)
        .collect()?)
}
