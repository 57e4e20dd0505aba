use crate::error::{PivotError, PivotResult};
use serde::{Deserialize, Serialize};

/// An ordered set of labeled half-open numeric bins.
///
/// `edges` holds N+1 strictly increasing boundaries that define N bins
/// `[edges[0], edges[1]), [edges[1], edges[2]), ..., [edges[N-1], edges[N])`. A value equal to a
/// boundary belongs to the bin that starts at it; a value outside `[edges[0], edges[N])` (or NaN)
/// is [`PivotError::OutOfRange`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBucketScheme", into = "RawBucketScheme")]
pub struct BucketScheme {
    edges: Vec<f64>,
    labels: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBucketScheme {
    edges: Vec<f64>,
    labels: Vec<String>,
}

impl TryFrom<RawBucketScheme> for BucketScheme {
    type Error = PivotError;

    fn try_from(raw: RawBucketScheme) -> PivotResult<Self> {
        BucketScheme::new(raw.edges, raw.labels)
    }
}

impl From<BucketScheme> for RawBucketScheme {
    fn from(scheme: BucketScheme) -> Self {
        RawBucketScheme {
            edges: scheme.edges,
            labels: scheme.labels,
        }
    }
}

impl BucketScheme {
    pub fn new<S: Into<String>>(edges: Vec<f64>, labels: Vec<S>) -> PivotResult<Self> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if edges.len() < 2 {
            return Err(PivotError::InvalidScheme(format!(
                "need at least two edges, got {}",
                edges.len()
            )));
        }
        if let Some(edge) = edges.iter().find(|e| !e.is_finite()) {
            return Err(PivotError::InvalidScheme(format!(
                "edge {edge} is not finite"
            )));
        }
        if let Some(pair) = edges.windows(2).find(|w| w[0] >= w[1]) {
            return Err(PivotError::InvalidScheme(format!(
                "edges must be strictly increasing ({} >= {})",
                pair[0], pair[1]
            )));
        }
        if labels.len() != edges.len() - 1 {
            return Err(PivotError::InvalidScheme(format!(
                "{} edges define {} bins but {} labels were given",
                edges.len(),
                edges.len() - 1,
                labels.len()
            )));
        }
        Ok(Self { edges, labels })
    }

    /// Twenty-year age bands: `[0,20) [20,40) [40,60) [60,80) [80,100)`.
    pub fn twenty_year_bands() -> Self {
        Self {
            edges: vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0],
            labels: ["0-20", "21-40", "41-60", "61-80", "81+"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    /// Life-stage age bands: `[0,18) [18,30) [30,45) [45,60) [60,75) [75,100)`.
    pub fn life_stages() -> Self {
        Self {
            edges: vec![0.0, 18.0, 30.0, 45.0, 60.0, 75.0, 100.0],
            labels: ["0-17", "18-29", "30-44", "45-59", "60-74", "75+"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn bin_count(&self) -> usize {
        self.labels.len()
    }

    /// Lower (inclusive) and upper (exclusive) bounds of the whole scheme.
    pub fn range(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }

    pub fn bucket_index(&self, value: f64) -> PivotResult<usize> {
        let (lo, hi) = self.range();
        // Written so that NaN fails the range check as well.
        if !(value >= lo && value < hi) {
            return Err(PivotError::OutOfRange { value });
        }
        // Number of edges <= value, minus one, is the index of the bin starting at or below it.
        let idx = self.edges.partition_point(|edge| *edge <= value) - 1;
        Ok(idx)
    }

    pub fn label_for(&self, value: f64) -> PivotResult<&str> {
        self.bucket_index(value).map(|idx| self.labels[idx].as_str())
    }
}
