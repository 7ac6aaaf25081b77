//! Skip-null reductions over hourly samples
//!
//! Every reduction reports `None` when it saw no usable sample; a missing
//! value never turns into a zero.

use crate::types::Timestamp;

/// Reduction applied to a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reduction {
    Avg,
    Sum,
}

/// Accumulator for calculating one reduction over many samples
#[derive(Debug, Clone)]
pub struct Accumulator {
    reduction: Reduction,
    total: f64,
    count: usize,
}

impl Accumulator {
    pub fn new(reduction: Reduction) -> Self {
        Self {
            reduction,
            total: 0.0,
            count: 0,
        }
    }

    /// Add a sample; nulls and non-finite values are skipped
    pub fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.total += v;
            self.count += 1;
        }
    }

    pub fn result(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }

        let value = match self.reduction {
            Reduction::Avg => self.total / self.count as f64,
            Reduction::Sum => self.total,
        };
        value.is_finite().then_some(value)
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

fn reduce<'a, I>(reduction: Reduction, values: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a Option<f64>>,
{
    let mut acc = Accumulator::new(reduction);
    for value in values {
        acc.add(*value);
    }
    acc.result()
}

/// Mean of the non-null values
pub fn average(values: &[Option<f64>]) -> Option<f64> {
    reduce(Reduction::Avg, values)
}

/// Sum of the non-null values; `None` if every value is null
pub fn sum(values: &[Option<f64>]) -> Option<f64> {
    reduce(Reduction::Sum, values)
}

/// Reduce the values at `indices`, ignoring indices past the end of `values`
pub fn reduce_at(reduction: Reduction, values: &[Option<f64>], indices: &[usize]) -> Option<f64> {
    reduce(reduction, indices.iter().filter_map(|&i| values.get(i)))
}

/// Positions whose timestamp lies in `[sunrise, sunset]`
pub fn daylight_indices(
    timestamps: &[Timestamp],
    sunrise: Option<Timestamp>,
    sunset: Option<Timestamp>,
) -> Vec<usize> {
    let (Some(sunrise), Some(sunset)) = (sunrise, sunset) else {
        return Vec::new();
    };

    timestamps
        .iter()
        .enumerate()
        .filter(|&(_, &ts)| ts >= sunrise && ts <= sunset)
        .map(|(i, _)| i)
        .collect()
}

fn daylight_reduce(
    reduction: Reduction,
    values: &[Option<f64>],
    timestamps: &[Timestamp],
    sunrise: Option<Timestamp>,
    sunset: Option<Timestamp>,
) -> Option<f64> {
    // Without a one-to-one alignment there is no way to tell which sample
    // belongs to which hour.
    if values.len() != timestamps.len() {
        return None;
    }
    let indices = daylight_indices(timestamps, sunrise, sunset);
    if indices.is_empty() {
        return None;
    }
    reduce_at(reduction, values, &indices)
}

pub fn daylight_average(
    values: &[Option<f64>],
    timestamps: &[Timestamp],
    sunrise: Option<Timestamp>,
    sunset: Option<Timestamp>,
) -> Option<f64> {
    daylight_reduce(Reduction::Avg, values, timestamps, sunrise, sunset)
}

pub fn daylight_sum(
    values: &[Option<f64>],
    timestamps: &[Timestamp],
    sunrise: Option<Timestamp>,
    sunset: Option<Timestamp>,
) -> Option<f64> {
    daylight_reduce(Reduction::Sum, values, timestamps, sunrise, sunset)
}
