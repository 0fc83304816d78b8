use crate::core::mpc::MpcResult;
use crate::core::thermal::result::SimulationResult;
use crate::scenarios::comparison::timeline;
use anyhow::anyhow;
use csv::WriterBuilder;
use formatx::formatx;
use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;

pub trait Output: Debug {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write>;
    /// Whether this output can be considered a no-op and therefore that any code that only writes to the output can be skipped.
    fn is_noop(&self) -> bool {
        false
    }
}

/// Writes each location key to its own file in `directory_path`, named by filling the `{}` in
/// `file_template` with the key.
#[derive(Debug)]
pub struct FileOutput {
    directory_path: PathBuf,
    file_template: String,
}

impl FileOutput {
    pub fn new(directory_path: PathBuf, file_template: String) -> Self {
        Self {
            directory_path,
            file_template,
        }
    }
}

impl Output for FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        let file_name = formatx!(&self.file_template, location_key)
            .map_err(|e| anyhow!("Invalid output file template '{}': {e:?}", self.file_template))?;
        Ok(BufWriter::new(File::create(self.directory_path.join(file_name))?))
    }
}

impl Output for &FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        <FileOutput as Output>::writer_for_location_key(self, location_key)
    }
}

/// An output that goes to nowhere/ a "sink"/ /dev/null.
#[derive(Debug, Default)]
pub struct SinkOutput;

impl Output for SinkOutput {
    fn writer_for_location_key(&self, _location_key: &str) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        true
    }
}

/// One row per timestep, with the state at the end of the step.
pub fn write_simulation_csv(
    output: &impl Output,
    location_key: &str,
    result: &SimulationResult,
) -> anyhow::Result<()> {
    if output.is_noop() {
        return Ok(());
    }
    debug!(location_key, "Writing simulation results");
    let writer = output.writer_for_location_key(location_key)?;
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.write_record([
        "Timestep",
        "Time",
        "Interior temperature",
        "Envelope temperature",
        "HVAC power",
        "Energy",
        "Cumulative energy",
        "Comfort violation",
        "HVAC state",
    ])?;
    writer.write_record([
        "[count]", "[UTC]", "[degC]", "[degC]", "[kW]", "[kWh]", "[kWh]", "[K]", "",
    ])?;

    // timeline point k + 1 closes step k
    for (step, point) in timeline(result).iter().skip(1).enumerate() {
        writer.write_record([
            step.to_string(),
            point.timestamp.clone(),
            point.temperature.to_string(),
            result.envelope_temps[step + 1].to_string(),
            point.hvac_power_kw.to_string(),
            result.step_energy_kwh[step].to_string(),
            point.energy_cumulative_kwh.to_string(),
            point.comfort_violation.to_string(),
            result.realized_modes[step].to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}

/// The optimizer's per-step schedule.
pub fn write_schedule_csv(output: &impl Output, location_key: &str, result: &MpcResult) -> anyhow::Result<()> {
    if output.is_noop() {
        return Ok(());
    }
    debug!(location_key, "Writing optimized schedule");
    let writer = output.writer_for_location_key(location_key)?;
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.write_record([
        "Step",
        "Hour",
        "Setpoint",
        "Predicted temperature",
        "Predicted power",
        "Electricity price",
        "Occupancy",
        "Outdoor temperature",
    ])?;
    writer.write_record(["[count]", "[h]", "[degC]", "[degC]", "[kW]", "[EUR/kWh]", "[people]", "[degC]"])?;
    for entry in &result.schedule {
        writer.write_record([
            entry.step.to_string(),
            entry.hour.to_string(),
            entry.setpoint.to_string(),
            entry.predicted_temp.to_string(),
            entry.predicted_power_kw.to_string(),
            entry.electricity_price.to_string(),
            entry.occupancy.to_string(),
            entry.outdoor_temp.to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}
