use crate::core::thermal::parameters::ThermalParameters;

/// Sensible heat given off by one occupant, in W
pub const OCCUPANT_SENSIBLE_GAIN_W: f64 = 100.0;
const EQUIPMENT_POWER_DENSITY_W_PER_M2: f64 = 10.0;
const LIGHTING_POWER_DENSITY_W_PER_M2: f64 = 10.0;

/// Fraction of design equipment load switched on at a given hour of the day.
fn equipment_fraction(hour: u32) -> f64 {
    match hour {
        8..=18 => 1.0,
        6..=20 => 0.5,
        _ => 0.2,
    }
}

/// Fraction of design lighting load switched on at a given hour of the day.
fn lighting_fraction(hour: u32, occupied: bool) -> f64 {
    match hour {
        7..=19 if occupied => 0.8,
        7..=19 => 0.3,
        _ => 0.1,
    }
}

/// Fraction of incident solar let through the aperture; blinds come down around solar noon.
pub fn shading_factor(hour: u32) -> f64 {
    match hour {
        11..=15 => 0.5,
        _ => 0.8,
    }
}

/// Heat gains into the building held constant over one timestep.
///
/// * `internal_w` - occupants, equipment and lighting, delivered to the interior node, in W
/// * `solar_w` - solar gain through the aperture, delivered to the envelope node, in W
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepGains {
    pub internal_w: f64,
    pub solar_w: f64,
}

impl StepGains {
    /// Arguments:
    /// * `parameters` - the building the gains are for
    /// * `hour` - hour of the day, 0 to 23
    /// * `occupancy` - number of occupants present
    /// * `irradiance` - incident solar irradiance, in W/m2
    pub fn for_hour(parameters: &ThermalParameters, hour: u32, occupancy: f64, irradiance: f64) -> Self {
        let occupant_w = occupancy.max(0.) * OCCUPANT_SENSIBLE_GAIN_W;
        let equipment_w =
            EQUIPMENT_POWER_DENSITY_W_PER_M2 * parameters.floor_area_m2 * equipment_fraction(hour);
        let lighting_w = LIGHTING_POWER_DENSITY_W_PER_M2
            * parameters.floor_area_m2
            * lighting_fraction(hour, occupancy > 0.);

        Self {
            internal_w: occupant_w + equipment_w + lighting_w,
            solar_w: irradiance.max(0.) * parameters.a_solar * shading_factor(hour),
        }
    }
}
