use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;

/// Lumped 2R2C parameters for a building, plus the equipment figures needed to turn thermal
/// power into electricity.
///
/// * `c_i` - interior (air and furniture) thermal capacitance, in J/K
/// * `c_w` - envelope thermal capacitance, in J/K
/// * `r_iw` - resistance between interior and envelope, in K/W
/// * `r_we` - resistance between envelope and outdoor air, in K/W
/// * `a_solar` - effective solar aperture, in m2
/// * `cop_cool` / `cop_heat` - coefficients of performance of the HVAC plant
/// * `hvac_capacity_kw` - maximum thermal output of the HVAC plant, in kW
/// * `floor_area_m2` - conditioned floor area, in m2
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ThermalParameters {
    #[validate(exclusive_minimum = 0.)]
    pub c_i: f64,
    #[validate(exclusive_minimum = 0.)]
    pub c_w: f64,
    #[validate(exclusive_minimum = 0.)]
    pub r_iw: f64,
    #[validate(exclusive_minimum = 0.)]
    pub r_we: f64,
    #[validate(minimum = 0.)]
    pub a_solar: f64,
    #[validate(exclusive_minimum = 0.)]
    pub cop_cool: f64,
    #[validate(exclusive_minimum = 0.)]
    pub cop_heat: f64,
    #[validate(minimum = 0.)]
    pub hvac_capacity_kw: f64,
    #[validate(exclusive_minimum = 0.)]
    pub floor_area_m2: f64,
    #[validate(minimum = 1)]
    pub n_floors: u32,
}

impl Default for ThermalParameters {
    fn default() -> Self {
        Self {
            c_i: 5e6,
            c_w: 5e7,
            r_iw: 0.002,
            r_we: 0.001,
            a_solar: 100.0,
            cop_cool: 3.5,
            cop_heat: 4.0,
            hvac_capacity_kw: 100.0,
            floor_area_m2: 4500.0,
            n_floors: 5,
        }
    }
}

impl ThermalParameters {
    pub(crate) fn checked(&self) -> Result<&Self, ConfigurationError> {
        self.validate()
            .map_err(|errors| ConfigurationError::invalid_parameters("thermal parameters", errors))?;
        Ok(self)
    }

    /// Total resistance on the path from interior air to outdoor air, in K/W
    pub fn r_total(&self) -> f64 {
        self.r_iw + self.r_we
    }

    /// Copy of these parameters with both COPs multiplied by `factor`.
    pub fn with_cop_scaled(&self, factor: f64) -> Self {
        Self {
            cop_cool: self.cop_cool * factor,
            cop_heat: self.cop_heat * factor,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::*;

    #[rstest]
    fn should_accept_default_parameters() {
        assert!(ThermalParameters::default().checked().is_ok());
    }

    #[rstest]
    fn should_reject_non_positive_resistance() {
        let parameters = ThermalParameters {
            r_we: 0.,
            ..Default::default()
        };
        assert!(matches!(
            parameters.checked(),
            Err(ConfigurationError::InvalidParameters { .. })
        ));
    }

    #[rstest]
    fn should_scale_both_cops_without_touching_physics() {
        let parameters = ThermalParameters::default().with_cop_scaled(0.8);
        assert_relative_eq!(parameters.cop_cool, 2.8);
        assert_relative_eq!(parameters.cop_heat, 3.2);
        assert_eq!(parameters.c_i, ThermalParameters::default().c_i);
    }

    #[rstest]
    fn should_deserialize_partial_parameters_over_defaults() {
        let parameters: ThermalParameters =
            serde_json::from_str(r#"{"c_i": 6e6, "hvac_capacity_kw": 150.0}"#).unwrap();
        assert_eq!(parameters.c_i, 6e6);
        assert_eq!(parameters.hvac_capacity_kw, 150.0);
        assert_eq!(parameters.floor_area_m2, 4500.0);
    }
}
