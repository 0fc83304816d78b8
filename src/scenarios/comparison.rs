use crate::core::thermal::result::SimulationResult;
use crate::core::units::{HOURS_PER_YEAR, SECONDS_PER_HOUR};
use crate::scenarios::config::ScenarioConfig;
use chrono::{DateTime, SecondsFormat};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Grid carbon intensity applied to energy savings, in kg CO2 per kWh
pub const CARBON_FACTOR_KG_PER_KWH: f64 = 0.25;

const ADOPTION_SAVINGS_PERCENT: f64 = 10.;
const PARTIAL_ADOPTION_SAVINGS_PERCENT: f64 = 5.;
/// Relative change in peak power worth flagging for demand charges
const PEAK_CHANGE_FRACTION: f64 = 0.2;

/// One chartable sample of a simulation trajectory.
///
/// The power and comfort values are those of the step that ended at this sample, so the first
/// point reports zero for both.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TimelinePoint {
    /// RFC 3339, UTC
    pub timestamp: String,
    pub temperature: f64,
    pub energy_cumulative_kwh: f64,
    pub hvac_power_kw: f64,
    pub comfort_violation: f64,
}

pub fn timeline(result: &SimulationResult) -> Vec<TimelinePoint> {
    result
        .sample_times
        .iter()
        .zip(&result.interior_temps)
        .zip(&result.cumulative_energy_kwh)
        .enumerate()
        .map(|(i, ((&timestamp, &temperature), &energy_cumulative_kwh))| {
            let previous_step = i.checked_sub(1);
            let of_previous_step =
                |series: &[f64]| previous_step.and_then(|k| series.get(k).copied()).unwrap_or(0.);
            TimelinePoint {
                timestamp: format_timestamp(timestamp),
                temperature,
                energy_cumulative_kwh,
                hvac_power_kw: of_previous_step(&result.hvac_power_kw),
                comfort_violation: of_previous_step(&result.comfort_violation),
            }
        })
        .collect()
}

fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|datetime| datetime.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| timestamp.to_string())
}

/// Baseline against scenario, reduced to savings figures, chart series and advice.
///
/// Savings are baseline minus scenario, so positive values are improvements. `comfort_impact`
/// is scenario comfort minus baseline comfort, so positive is also better.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ScenarioComparison {
    pub scenario_id: String,
    pub scenario_name: String,
    pub scenario_type: String,
    pub building_id: String,
    pub duration_hours: f64,
    pub baseline_energy_kwh: f64,
    pub scenario_energy_kwh: f64,
    pub energy_savings_kwh: f64,
    pub energy_savings_percent: f64,
    pub baseline_cost_eur: f64,
    pub scenario_cost_eur: f64,
    pub cost_savings_eur: f64,
    pub carbon_savings_kg: f64,
    pub baseline_comfort_score: f64,
    pub scenario_comfort_score: f64,
    pub comfort_impact: f64,
    pub baseline_peak_power_kw: f64,
    pub scenario_peak_power_kw: f64,
    pub baseline_timeline: Vec<TimelinePoint>,
    pub scenario_timeline: Vec<TimelinePoint>,
    pub recommendations: Vec<String>,
}

impl ScenarioComparison {
    pub fn new(
        config: &ScenarioConfig,
        building_id: &str,
        baseline: &SimulationResult,
        scenario: &SimulationResult,
    ) -> Self {
        let energy_savings_kwh = baseline.total_energy_kwh - scenario.total_energy_kwh;
        let energy_savings_percent = if baseline.total_energy_kwh > 0. {
            energy_savings_kwh / baseline.total_energy_kwh * 100.
        } else {
            0.
        };
        let duration_hours =
            baseline.total_steps() as f64 * baseline.timestep_seconds as f64 / SECONDS_PER_HOUR as f64;

        let mut comparison = Self {
            scenario_id: config.id.clone(),
            scenario_name: config.name.clone(),
            scenario_type: config.scenario_type().to_string(),
            building_id: building_id.to_string(),
            duration_hours,
            baseline_energy_kwh: baseline.total_energy_kwh,
            scenario_energy_kwh: scenario.total_energy_kwh,
            energy_savings_kwh,
            energy_savings_percent,
            baseline_cost_eur: baseline.total_cost_eur,
            scenario_cost_eur: scenario.total_cost_eur,
            cost_savings_eur: baseline.total_cost_eur - scenario.total_cost_eur,
            carbon_savings_kg: energy_savings_kwh * CARBON_FACTOR_KG_PER_KWH,
            baseline_comfort_score: baseline.avg_comfort_score,
            scenario_comfort_score: scenario.avg_comfort_score,
            comfort_impact: scenario.avg_comfort_score - baseline.avg_comfort_score,
            baseline_peak_power_kw: baseline.peak_power_kw,
            scenario_peak_power_kw: scenario.peak_power_kw,
            baseline_timeline: timeline(baseline),
            scenario_timeline: timeline(scenario),
            recommendations: vec![],
        };
        comparison.recommendations = comparison.recommend();

        comparison
    }

    /// Advice for the operator. Always yields at least one line.
    pub fn recommend(&self) -> Vec<String> {
        let savings = self.energy_savings_percent;
        let comfort = self.comfort_impact;
        let mut recommendations = vec![];

        if savings > ADOPTION_SAVINGS_PERCENT && comfort >= 0. {
            recommendations.push(format!(
                "This scenario saves {savings:.0}% energy without reducing comfort. Recommend implementation."
            ));
        } else if savings > PARTIAL_ADOPTION_SAVINGS_PERCENT && comfort < 0. {
            recommendations.push(format!(
                "Energy savings of {savings:.0}% are available but the comfort score drops by {:.0} points. \
                 Consider applying it only during unoccupied hours.",
                comfort.abs()
            ));
        }

        if savings < 0. {
            recommendations.push(format!(
                "This scenario increases energy consumption by {:.0}%. Use it for capacity planning and stress testing.",
                savings.abs()
            ));
        }

        let (baseline_peak, scenario_peak) = (self.baseline_peak_power_kw, self.scenario_peak_power_kw);
        if scenario_peak > baseline_peak * (1. + PEAK_CHANGE_FRACTION) {
            recommendations.push(format!(
                "Peak demand rises from {baseline_peak:.0} kW to {scenario_peak:.0} kW. Watch utility demand charges."
            ));
        } else if baseline_peak > 0. && scenario_peak < baseline_peak * (1. - PEAK_CHANGE_FRACTION) {
            recommendations.push(format!(
                "Peak demand falls by {:.0}%, with potential demand charge savings.",
                (1. - scenario_peak / baseline_peak) * 100.
            ));
        }

        if savings > 0. && self.duration_hours > 0. {
            let annual_savings = self.cost_savings_eur * HOURS_PER_YEAR as f64 / self.duration_hours;
            recommendations.push(format!(
                "Projected annual savings: €{} ({savings:.0}% of baseline).",
                thousands(annual_savings)
            ));
        }

        if recommendations.is_empty() {
            recommendations.push("Run additional scenarios to compare options.".to_string());
        }

        recommendations
    }
}

/// Whole euros with comma thousands separators, e.g. `-12,345`.
fn thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk))
        .join(",");
    if rounded < 0. {
        format!("-{grouped}")
    } else {
        grouped
    }
}
