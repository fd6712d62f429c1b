use serde::{Deserialize, Serialize};

/// Histogram buckets, half-open. Anything before 1900 (including years before
/// 1600) lands in the first bucket and anything from 2000 on in the last.
const BUCKETS: [(&str, i32); 5] = [
    ("1600-1900", 1900),
    ("1900-1950", 1950),
    ("1950-1980", 1980),
    ("1980-2000", 2000),
    ("2000-2025", i32::MAX),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCount {
    pub period: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalStats {
    pub average: i64,
    pub min: i32,
    pub max: i32,
    pub time_span: i32,
    pub distribution: Vec<PeriodCount>,
}

impl TemporalStats {
    pub fn time_span_label(&self) -> String {
        format!("{} years", self.time_span)
    }

    pub fn range_label(&self) -> String {
        format!("{} - {}", self.min, self.max)
    }

    pub fn count_for(&self, period: &str) -> usize {
        self.distribution
            .iter()
            .find(|bucket| bucket.period == period)
            .map(|bucket| bucket.count)
            .unwrap_or(0)
    }
}

pub fn analyze_temporal(years: &[i32]) -> Option<TemporalStats> {
    let min = *years.iter().min()?;
    let max = *years.iter().max()?;
    let sum: i64 = years.iter().map(|&year| i64::from(year)).sum();
    // Half-up rounding, so .5 averages go to the later year.
    let average = (sum as f64 / years.len() as f64 + 0.5).floor() as i64;

    Some(TemporalStats {
        average,
        min,
        max,
        time_span: max - min,
        distribution: categorize_years(years),
    })
}

pub fn categorize_years(years: &[i32]) -> Vec<PeriodCount> {
    let mut counts = [0usize; BUCKETS.len()];
    for &year in years {
        let slot = BUCKETS
            .iter()
            .position(|(_, upper)| year < *upper)
            .unwrap_or(BUCKETS.len() - 1);
        counts[slot] += 1;
    }
    BUCKETS
        .iter()
        .zip(counts)
        .map(|((period, _), count)| PeriodCount {
            period: period.to_string(),
            count,
        })
        .collect()
}
