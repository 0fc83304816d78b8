use crate::core::units::HOURS_PER_DAY;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use strum::{Display, EnumString};

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumString, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Season {
    #[default]
    Summer,
    Winter,
}

impl Season {
    /// Daily mean and half-range of outdoor temperature, in deg C
    fn outdoor_profile(&self) -> (f64, f64) {
        match self {
            Season::Summer => (28., 8.),
            Season::Winter => (15., 6.),
        }
    }
}

/// Hourly forecasts for when the caller has none of their own: a sinusoidal outdoor temperature,
/// an office occupancy pattern and a three-band time-of-use tariff.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DefaultForecasts {
    pub weather: Vec<f64>,
    pub occupancy: Vec<f64>,
    pub prices: Vec<f64>,
}

impl DefaultForecasts {
    pub fn generate(hours: usize, current_hour: u32, season: Season) -> Self {
        let (base, amplitude) = season.outdoor_profile();
        let hours_of_day = (0..hours)
            .map(|h| (current_hour as usize + h) as u32 % HOURS_PER_DAY)
            .collect::<Vec<_>>();

        Self {
            weather: hours_of_day
                .iter()
                .map(|&hour| base + amplitude * ((hour as f64 - 6.) * PI / 12.).sin())
                .collect(),
            occupancy: hours_of_day.iter().map(|&hour| office_occupancy(hour)).collect(),
            prices: hours_of_day.iter().map(|&hour| tariff_price(hour)).collect(),
        }
    }
}

fn office_occupancy(hour: u32) -> f64 {
    match hour {
        8..=17 => 50.,
        7 | 18 | 19 => 20.,
        _ => 0.,
    }
}

/// Price in EUR/kWh for the peak, shoulder and off-peak bands.
fn tariff_price(hour: u32) -> f64 {
    match hour {
        10..=13 | 18..=21 => 0.25,
        8..=9 | 14..=17 | 22..=23 => 0.18,
        _ => 0.10,
    }
}
