pub const JOULES_PER_KILOWATT_HOUR: u32 = 3_600_000;
pub const WATTS_PER_KILOWATT: u32 = 1_000;
pub const SECONDS_PER_MINUTE: u32 = 60;
pub const SECONDS_PER_HOUR: u32 = 3_600;
pub const HOURS_PER_DAY: u32 = 24;
pub const SECONDS_PER_DAY: u32 = SECONDS_PER_HOUR * HOURS_PER_DAY;
pub const HOURS_PER_YEAR: u32 = 8_760;

pub(crate) fn watts_to_kilowatts(power_w: f64) -> f64 {
    power_w / WATTS_PER_KILOWATT as f64
}

pub(crate) fn joules_to_kilowatt_hours(energy_j: f64) -> f64 {
    energy_j / JOULES_PER_KILOWATT_HOUR as f64
}

/// Hour of the day (0-23, UTC) that a Unix timestamp falls in.
pub(crate) fn hour_of_day(timestamp: i64) -> u32 {
    (timestamp.rem_euclid(SECONDS_PER_DAY as i64) / SECONDS_PER_HOUR as i64) as u32
}

/// Electrical energy in kWh needed to deliver the given thermal energies.
///
/// Heating and cooling are passed separately (both as non-negative joules) because each side
/// of the heat pump has its own coefficient of performance.
pub fn electrical_energy_kwh(heating_j: f64, cooling_j: f64, cop_heat: f64, cop_cool: f64) -> f64 {
    joules_to_kilowatt_hours(heating_j) / cop_heat + joules_to_kilowatt_hours(cooling_j) / cop_cool
}

/// Electrical power in kW for a signed thermal power in kW (positive heating, negative cooling).
pub fn electrical_power_kw(thermal_kw: f64, cop_heat: f64, cop_cool: f64) -> f64 {
    if thermal_kw > 0. {
        thermal_kw / cop_heat
    } else {
        thermal_kw.abs() / cop_cool
    }
}
