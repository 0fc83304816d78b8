use crate::core::units::{hour_of_day, SECONDS_PER_HOUR};
use crate::errors::InputError;
use serde::{Deserialize, Serialize};

/// A run of equally spaced timesteps starting at a Unix timestamp.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct SimulationTime {
    #[serde(rename = "start")]
    start_timestamp: i64,
    #[serde(rename = "step")]
    step_seconds: u32,
    total_steps: usize,
}

impl SimulationTime {
    pub fn new(start_timestamp: i64, step_seconds: u32, total_steps: usize) -> Self {
        Self {
            start_timestamp,
            step_seconds,
            total_steps,
        }
    }

    pub fn hourly(start_timestamp: i64, total_steps: usize) -> Self {
        Self::new(start_timestamp, SECONDS_PER_HOUR, total_steps)
    }

    /// Derive the simulation time from an explicit timestamp series, checking that the series
    /// is non-empty and advances by exactly `step_seconds` between samples.
    pub(crate) fn from_timestamps(timestamps: &[i64], step_seconds: u32) -> Result<Self, InputError> {
        if step_seconds == 0 {
            return Err(InputError::NonPositiveTimestep);
        }
        let start_timestamp = *timestamps
            .first()
            .ok_or(InputError::Empty { series: "timestamps" })?;
        for (index, pair) in timestamps.windows(2).enumerate() {
            let actual = pair[1].saturating_sub(pair[0]);
            if actual != step_seconds as i64 {
                return Err(InputError::IrregularTimestep {
                    index: index + 1,
                    expected: step_seconds as i64,
                    actual,
                });
            }
        }
        // the last step must end at a representable time
        let end = (timestamps.len() as i64)
            .checked_mul(step_seconds as i64)
            .and_then(|span| start_timestamp.checked_add(span));
        if end.is_none() {
            return Err(InputError::TimestampOutOfRange {
                timestamp: timestamps[timestamps.len() - 1],
            });
        }

        Ok(Self::new(start_timestamp, step_seconds, timestamps.len()))
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn step_seconds(&self) -> u32 {
        self.step_seconds
    }

    pub fn step_hours(&self) -> f64 {
        self.step_seconds as f64 / SECONDS_PER_HOUR as f64
    }

    pub fn start_timestamp(&self) -> i64 {
        self.start_timestamp
    }

    /// Timestamps at the start of each step.
    pub fn timestamps(&self) -> Vec<i64> {
        self.iter().map(|it| it.timestamp).collect()
    }

    /// Timestamps of every sample point, i.e. the start of each step plus the end of the last.
    pub fn sample_timestamps(&self) -> Vec<i64> {
        (0..=self.total_steps)
            .map(|i| self.start_timestamp + (i as i64) * self.step_seconds as i64)
            .collect()
    }

    pub fn iter(&self) -> SimulationTimeIterator {
        SimulationTimeIterator {
            current_index: 0,
            simulation_time: *self,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SimulationTimeIterator {
    current_index: usize,
    simulation_time: SimulationTime,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationTimeIteration {
    pub index: usize,
    pub timestamp: i64,
    pub step_seconds: u32,
}

impl SimulationTimeIteration {
    pub fn hour_of_day(&self) -> u32 {
        hour_of_day(self.timestamp)
    }

    pub fn step_hours(&self) -> f64 {
        self.step_seconds as f64 / SECONDS_PER_HOUR as f64
    }
}

impl Iterator for SimulationTimeIterator {
    type Item = SimulationTimeIteration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_index >= self.simulation_time.total_steps {
            return None;
        }
        let index = self.current_index;
        self.current_index += 1;

        Some(SimulationTimeIteration {
            index,
            timestamp: self.simulation_time.start_timestamp
                + (index as i64) * self.simulation_time.step_seconds as i64,
            step_seconds: self.simulation_time.step_seconds,
        })
    }
}
