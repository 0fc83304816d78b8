use crate::core::units::HOURS_PER_DAY;
use crate::errors::ConfigurationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use serde_valid::Validate;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The closed set of what-if transformation families.
#[derive(
    Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, Hash, IntoStaticStr, PartialEq,
)]
#[strum(serialize_all = "snake_case")]
pub enum ScenarioType {
    SetpointChange,
    OccupancyPattern,
    WeatherForecast,
    DemandResponse,
    EquipmentEfficiency,
}

impl ScenarioType {
    pub fn parse(tag: &str) -> Result<Self, ConfigurationError> {
        Self::from_str(tag).map_err(|_| ConfigurationError::UnknownScenarioType(tag.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Shift the setpoint during chosen hours of the day, optionally alternating it to emulate a
/// wider deadband.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct SetpointChange {
    pub delta_temp: f64,
    pub hours: Vec<u32>,
    #[validate(minimum = 0.)]
    pub deadband_expansion: f64,
}

/// Scale occupancy and relax the setpoint wherever the building is close to empty.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct OccupancyPattern {
    #[validate(minimum = 0.)]
    pub occupancy_factor: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_temp: Option<f64>,
    /// Hours before occupants arrive during which the baseline setpoint is kept
    pub pre_condition_hours: u32,
}

impl Default for OccupancyPattern {
    fn default() -> Self {
        Self {
            occupancy_factor: 1.,
            min_temp: None,
            max_temp: None,
            pre_condition_hours: 0,
        }
    }
}

/// Shift or pin outdoor temperature and scale solar irradiance.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherForecast {
    pub temp_delta: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_set: Option<f64>,
    #[validate(minimum = 0.)]
    pub solar_factor: f64,
}

impl Default for WeatherForecast {
    fn default() -> Self {
        Self {
            temp_delta: 0.,
            temp_set: None,
            solar_factor: 1.,
        }
    }
}

/// Pre-condition ahead of a peak window and relax the setpoint through it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct DemandResponse {
    #[validate(minimum = 0.)]
    #[validate(maximum = 100.)]
    pub reduction_percent: f64,
    /// Explicit peak hours; when absent the event runs for `duration_hours` from 14:00
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_hours: Option<Vec<u32>>,
    pub pre_cool_hours: Vec<u32>,
    pub pre_cool_delta: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(maximum = 24)]
    pub duration_hours: Option<u32>,
    /// Hours after the peak window during which half of the peak bias is kept
    #[validate(maximum = 24)]
    pub recovery_hours: u32,
}

pub const DEFAULT_EVENT_START_HOUR: u32 = 14;
const DEFAULT_PEAK_HOURS: [u32; 4] = [14, 15, 16, 17];

impl Default for DemandResponse {
    fn default() -> Self {
        Self {
            reduction_percent: 0.,
            peak_hours: None,
            pre_cool_hours: vec![],
            pre_cool_delta: -2.,
            duration_hours: None,
            recovery_hours: 0,
        }
    }
}

impl DemandResponse {
    pub fn effective_peak_hours(&self) -> Vec<u32> {
        match (&self.peak_hours, self.duration_hours) {
            (Some(hours), _) => hours.clone(),
            (None, Some(duration)) => (0..duration)
                .map(|offset| (DEFAULT_EVENT_START_HOUR + offset) % HOURS_PER_DAY)
                .collect(),
            (None, None) => DEFAULT_PEAK_HOURS.to_vec(),
        }
    }

    /// Hours of the day that follow the peak window for `recovery_hours` hours.
    ///
    /// The window ends at the last listed peak hour whose successor is not a peak hour, so an
    /// event running past midnight recovers after its final hour rather than after 23:00.
    pub fn recovery_window(&self) -> Vec<u32> {
        let peak_hours = self.effective_peak_hours();
        let window_end = peak_hours
            .iter()
            .rev()
            .find(|&&hour| !peak_hours.contains(&((hour + 1) % HOURS_PER_DAY)));
        match window_end {
            Some(&last) if self.recovery_hours > 0 => (1..=self.recovery_hours)
                .map(|offset| (last + offset) % HOURS_PER_DAY)
                .filter(|hour| !peak_hours.contains(hour))
                .collect(),
            _ => vec![],
        }
    }
}

/// Scale the heating and cooling COP of the building down (wear) or up (upgrade).
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct EquipmentEfficiency {
    #[validate(minimum = 0.)]
    #[validate(exclusive_maximum = 100.)]
    pub cop_reduction_percent: f64,
    #[validate(minimum = 0.)]
    pub cop_increase_percent: f64,
}

impl EquipmentEfficiency {
    pub fn cop_factor(&self) -> f64 {
        if self.cop_reduction_percent > 0. {
            1. - self.cop_reduction_percent / 100.
        } else {
            1. + self.cop_increase_percent / 100.
        }
    }
}

/// Parameters of one scenario, shaped by its family.
#[derive(Clone, Debug, PartialEq)]
pub enum ScenarioParameters {
    SetpointChange(SetpointChange),
    OccupancyPattern(OccupancyPattern),
    WeatherForecast(WeatherForecast),
    DemandResponse(DemandResponse),
    EquipmentEfficiency(EquipmentEfficiency),
}

impl ScenarioParameters {
    pub fn scenario_type(&self) -> ScenarioType {
        match self {
            ScenarioParameters::SetpointChange(_) => ScenarioType::SetpointChange,
            ScenarioParameters::OccupancyPattern(_) => ScenarioType::OccupancyPattern,
            ScenarioParameters::WeatherForecast(_) => ScenarioType::WeatherForecast,
            ScenarioParameters::DemandResponse(_) => ScenarioType::DemandResponse,
            ScenarioParameters::EquipmentEfficiency(_) => ScenarioType::EquipmentEfficiency,
        }
    }

    /// Interpret a loosely typed parameter bag for the given family. Unknown keys, wrong types
    /// and out-of-range values are rejected.
    pub fn from_value(scenario_type: ScenarioType, value: Value) -> Result<Self, ConfigurationError> {
        let value = match value {
            Value::Null => json!({}),
            other => other,
        };
        let parameters = match scenario_type {
            ScenarioType::SetpointChange => Self::SetpointChange(parse_bag(scenario_type, value)?),
            ScenarioType::OccupancyPattern => Self::OccupancyPattern(parse_bag(scenario_type, value)?),
            ScenarioType::WeatherForecast => Self::WeatherForecast(parse_bag(scenario_type, value)?),
            ScenarioType::DemandResponse => Self::DemandResponse(parse_bag(scenario_type, value)?),
            ScenarioType::EquipmentEfficiency => {
                Self::EquipmentEfficiency(parse_bag(scenario_type, value)?)
            }
        };
        parameters.check_hours()?;

        Ok(parameters)
    }

    pub fn to_value(&self) -> Value {
        let value = match self {
            ScenarioParameters::SetpointChange(p) => serde_json::to_value(p),
            ScenarioParameters::OccupancyPattern(p) => serde_json::to_value(p),
            ScenarioParameters::WeatherForecast(p) => serde_json::to_value(p),
            ScenarioParameters::DemandResponse(p) => serde_json::to_value(p),
            ScenarioParameters::EquipmentEfficiency(p) => serde_json::to_value(p),
        };
        value.unwrap_or_default()
    }

    fn check_hours(&self) -> Result<(), ConfigurationError> {
        let hours: Vec<&u32> = match self {
            ScenarioParameters::SetpointChange(p) => p.hours.iter().collect(),
            ScenarioParameters::DemandResponse(p) => p
                .pre_cool_hours
                .iter()
                .chain(p.peak_hours.iter().flatten())
                .collect(),
            _ => vec![],
        };
        match hours.into_iter().find(|&&hour| hour >= HOURS_PER_DAY) {
            Some(hour) => Err(ConfigurationError::InvalidScenarioParameters {
                scenario_type: self.scenario_type().as_str(),
                reason: format!("hour {hour} is not an hour of the day (0-23)"),
            }),
            None => Ok(()),
        }
    }
}

fn parse_bag<T: DeserializeOwned + Validate>(
    scenario_type: ScenarioType,
    value: Value,
) -> Result<T, ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidScenarioParameters {
        scenario_type: scenario_type.as_str(),
        reason,
    };
    let parameters: T = serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
    parameters.validate().map_err(|e| invalid(e.to_string()))?;

    Ok(parameters)
}

/// A named scenario: what to change, and how it is presented.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "RawScenarioConfig", into = "RawScenarioConfig")]
pub struct ScenarioConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    pub parameters: ScenarioParameters,
    pub icon: String,
    /// Rough savings figure for display only
    pub estimated_savings_percent: f64,
}

impl ScenarioConfig {
    pub fn scenario_type(&self) -> ScenarioType {
        self.parameters.scenario_type()
    }

    /// An unnamed scenario built from a type tag and a parameter bag supplied at request time.
    pub fn custom(scenario_type: &str, parameters: Value) -> Result<Self, ConfigurationError> {
        let scenario_type = ScenarioType::parse(scenario_type)?;
        Ok(Self {
            id: "custom".into(),
            name: "Custom Scenario".into(),
            description: "User-defined scenario".into(),
            parameters: ScenarioParameters::from_value(scenario_type, parameters)?,
            icon: DEFAULT_ICON.into(),
            estimated_savings_percent: 0.,
        })
    }
}

const DEFAULT_ICON: &str = "settings";

fn default_icon() -> String {
    DEFAULT_ICON.into()
}

/// Wire form of [`ScenarioConfig`], with the family as a string tag and an untyped parameter bag.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawScenarioConfig {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    scenario_type: String,
    #[serde(default)]
    parameters: Value,
    #[serde(default = "default_icon")]
    icon: String,
    #[serde(default)]
    estimated_savings_percent: f64,
}

impl TryFrom<RawScenarioConfig> for ScenarioConfig {
    type Error = ConfigurationError;

    fn try_from(raw: RawScenarioConfig) -> Result<Self, Self::Error> {
        let scenario_type = ScenarioType::parse(&raw.scenario_type)?;
        Ok(Self {
            id: raw.id,
            name: raw.name,
            description: raw.description,
            parameters: ScenarioParameters::from_value(scenario_type, raw.parameters)?,
            icon: raw.icon,
            estimated_savings_percent: raw.estimated_savings_percent,
        })
    }
}

impl From<ScenarioConfig> for RawScenarioConfig {
    fn from(config: ScenarioConfig) -> Self {
        Self {
            scenario_type: config.scenario_type().to_string(),
            parameters: config.parameters.to_value(),
            id: config.id,
            name: config.name,
            description: config.description,
            icon: config.icon,
            estimated_savings_percent: config.estimated_savings_percent,
        }
    }
}

fn preset(
    id: &str,
    name: &str,
    description: &str,
    parameters: ScenarioParameters,
    icon: &str,
    estimated_savings_percent: f64,
) -> ScenarioConfig {
    ScenarioConfig {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        parameters,
        icon: icon.into(),
        estimated_savings_percent,
    }
}

/// The built-in scenario catalogue. Negative estimates mean increased consumption.
pub fn preset_scenarios() -> Vec<ScenarioConfig> {
    vec![
        preset(
            "setpoint-cooling-2c",
            "Summer Cooling +2°C",
            "Raise the cooling setpoint by 2°C from 12:00 to 18:00 to cut cooling load with little comfort impact.",
            ScenarioParameters::SetpointChange(SetpointChange {
                delta_temp: 2.,
                hours: (12..18).collect(),
                ..Default::default()
            }),
            "thermometer",
            15.,
        ),
        preset(
            "setpoint-night-setback",
            "Night Setback -3°C",
            "Lower the heating setpoint by 3°C from 22:00 to 06:00 while the building is empty.",
            ScenarioParameters::SetpointChange(SetpointChange {
                delta_temp: -3.,
                hours: vec![22, 23, 0, 1, 2, 3, 4, 5],
                ..Default::default()
            }),
            "moon",
            20.,
        ),
        preset(
            "setpoint-wider-deadband",
            "Wider Comfort Band (±2°C)",
            "Let the temperature drift further from setpoint to reduce HVAC cycling.",
            ScenarioParameters::SetpointChange(SetpointChange {
                deadband_expansion: 1.,
                ..Default::default()
            }),
            "sliders",
            10.,
        ),
        preset(
            "occupancy-wfh-50",
            "50% Work From Home",
            "Hybrid working at half occupancy, with lower internal gains and setback when nearly empty.",
            ScenarioParameters::OccupancyPattern(OccupancyPattern {
                occupancy_factor: 0.5,
                ..Default::default()
            }),
            "users",
            25.,
        ),
        preset(
            "occupancy-weekend",
            "Weekend Mode",
            "Minimal (10%) weekend occupancy with deep setback, pre-conditioning two hours ahead of arrival.",
            ScenarioParameters::OccupancyPattern(OccupancyPattern {
                occupancy_factor: 0.1,
                pre_condition_hours: 2,
                ..Default::default()
            }),
            "calendar",
            35.,
        ),
        preset(
            "occupancy-holiday",
            "Holiday Shutdown",
            "Empty building held only between 15°C and 28°C for an extended holiday.",
            ScenarioParameters::OccupancyPattern(OccupancyPattern {
                occupancy_factor: 0.,
                min_temp: Some(15.),
                max_temp: Some(28.),
                ..Default::default()
            }),
            "plane",
            80.,
        ),
        preset(
            "weather-heatwave",
            "Heat Wave (+5°C)",
            "An extreme hot day, to test cooling capacity and energy impact.",
            ScenarioParameters::WeatherForecast(WeatherForecast {
                temp_delta: 5.,
                ..Default::default()
            }),
            "sun",
            -30.,
        ),
        preset(
            "weather-coldsnap",
            "Cold Snap (-5°C)",
            "An extreme cold day, to test heating capacity and energy impact.",
            ScenarioParameters::WeatherForecast(WeatherForecast {
                temp_delta: -5.,
                ..Default::default()
            }),
            "snowflake",
            -25.,
        ),
        preset(
            "weather-mild",
            "Mild Day (±0°C, Low Solar)",
            "A steady 22°C day with little sun, showing the potential for natural ventilation.",
            ScenarioParameters::WeatherForecast(WeatherForecast {
                temp_set: Some(22.),
                solar_factor: 0.3,
                ..Default::default()
            }),
            "cloud",
            40.,
        ),
        preset(
            "dr-peak-shaving",
            "Peak Shaving (14:00-18:00)",
            "Cut HVAC load 30% through the tariff peak by pre-cooling beforehand and coasting through it.",
            ScenarioParameters::DemandResponse(DemandResponse {
                reduction_percent: 30.,
                peak_hours: Some(vec![14, 15, 16, 17]),
                pre_cool_hours: vec![12, 13],
                pre_cool_delta: -2.,
                ..Default::default()
            }),
            "zap",
            20.,
        ),
        preset(
            "dr-grid-signal",
            "Grid Flexibility Event",
            "Answer a grid operator request to halve consumption for two hours, then recover.",
            ScenarioParameters::DemandResponse(DemandResponse {
                reduction_percent: 50.,
                duration_hours: Some(2),
                recovery_hours: 1,
                ..Default::default()
            }),
            "radio-tower",
            15.,
        ),
        preset(
            "equipment-aged-cop",
            "Aged Equipment (COP -20%)",
            "Degraded plant, showing the value of preventive maintenance.",
            ScenarioParameters::EquipmentEfficiency(EquipmentEfficiency {
                cop_reduction_percent: 20.,
                ..Default::default()
            }),
            "wrench",
            -25.,
        ),
        preset(
            "equipment-upgrade",
            "Equipment Upgrade (COP +30%)",
            "High-efficiency plant, to size the return on a capital upgrade.",
            ScenarioParameters::EquipmentEfficiency(EquipmentEfficiency {
                cop_increase_percent: 30.,
                ..Default::default()
            }),
            "trending-up",
            23.,
        ),
    ]
}

pub fn preset_by_id(scenario_id: &str) -> Result<ScenarioConfig, ConfigurationError> {
    preset_scenarios()
        .into_iter()
        .find(|scenario| scenario.id == scenario_id)
        .ok_or_else(|| ConfigurationError::UnknownPreset(scenario_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use strum::IntoEnumIterator;

    #[rstest]
    fn should_parse_every_family_tag() {
        for scenario_type in ScenarioType::iter() {
            assert_eq!(ScenarioType::parse(scenario_type.as_str()), Ok(scenario_type));
        }
        assert_eq!(
            ScenarioType::parse("schedule_optimization"),
            Err(ConfigurationError::UnknownScenarioType(
                "schedule_optimization".into()
            ))
        );
    }

    #[rstest]
    fn should_have_unique_preset_ids() {
        let presets = preset_scenarios();
        assert_eq!(presets.len(), 13);
        assert!(presets.iter().map(|p| &p.id).all_unique());
        assert_eq!(
            preset_by_id("dr-peak-shaving").unwrap().scenario_type(),
            ScenarioType::DemandResponse
        );
        assert_eq!(
            preset_by_id("nope"),
            Err(ConfigurationError::UnknownPreset("nope".into()))
        );
    }

    #[rstest]
    fn should_deserialize_tagged_config() {
        let config: ScenarioConfig = serde_json::from_value(json!({
            "id": "hot",
            "name": "Hot",
            "scenario_type": "weather_forecast",
            "parameters": {"temp_delta": 3.0}
        }))
        .unwrap();

        assert_eq!(
            config.parameters,
            ScenarioParameters::WeatherForecast(WeatherForecast {
                temp_delta: 3.,
                ..Default::default()
            })
        );
        assert_eq!(config.icon, "settings");
    }

    #[rstest]
    fn should_reject_unknown_type_and_bad_bags() {
        let unknown = serde_json::from_value::<ScenarioConfig>(json!({
            "id": "x", "name": "x", "scenario_type": "teleport"
        }));
        assert!(unknown.unwrap_err().to_string().contains("teleport"));

        assert!(matches!(
            ScenarioConfig::custom("setpoint_change", json!({"delta": 1.0})),
            Err(ConfigurationError::InvalidScenarioParameters {
                scenario_type: "setpoint_change",
                ..
            })
        ));
        assert!(matches!(
            ScenarioConfig::custom("demand_response", json!({"reduction_percent": 140})),
            Err(ConfigurationError::InvalidScenarioParameters { .. })
        ));
        assert!(matches!(
            ScenarioConfig::custom("setpoint_change", json!({"hours": [25]})),
            Err(ConfigurationError::InvalidScenarioParameters { .. })
        ));
    }

    #[rstest]
    #[case(json!({"duration_hours": 4_294_967_295u32}))]
    #[case(json!({"duration_hours": 25}))]
    #[case(json!({"recovery_hours": 4_294_967_295u32}))]
    fn should_reject_demand_response_windows_longer_than_a_day(#[case] parameters: Value) {
        assert!(matches!(
            ScenarioConfig::custom("demand_response", parameters),
            Err(ConfigurationError::InvalidScenarioParameters { .. })
        ));
    }

    #[rstest]
    fn should_serialize_back_to_tagged_form() {
        let value = serde_json::to_value(preset_by_id("equipment-upgrade").unwrap()).unwrap();
        assert_eq!(value["scenario_type"], "equipment_efficiency");
        assert_eq!(value["parameters"]["cop_increase_percent"], 30.0);
    }

    #[rstest]
    #[case(DemandResponse::default(), vec![14, 15, 16, 17], vec![])]
    #[case(
        DemandResponse { duration_hours: Some(2), recovery_hours: 1, ..Default::default() },
        vec![14, 15],
        vec![16]
    )]
    #[case(
        DemandResponse { peak_hours: Some(vec![22, 23]), recovery_hours: 2, ..Default::default() },
        vec![22, 23],
        vec![0, 1]
    )]
    #[case(
        DemandResponse { peak_hours: Some(vec![22, 23, 0, 1]), recovery_hours: 2, ..Default::default() },
        vec![22, 23, 0, 1],
        vec![2, 3]
    )]
    #[case(
        DemandResponse { duration_hours: Some(12), recovery_hours: 1, ..Default::default() },
        vec![14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 0, 1],
        vec![2]
    )]
    #[case(
        DemandResponse { duration_hours: Some(24), recovery_hours: 3, ..Default::default() },
        (14..38).map(|hour| hour % 24).collect(),
        vec![]
    )]
    fn should_resolve_demand_response_windows(
        #[case] parameters: DemandResponse,
        #[case] peak_hours: Vec<u32>,
        #[case] recovery: Vec<u32>,
    ) {
        assert_eq!(parameters.effective_peak_hours(), peak_hours);
        assert_eq!(parameters.recovery_window(), recovery);
    }
}
