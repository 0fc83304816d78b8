use crate::core::thermal::model::ThermalModel;
use crate::core::thermal::parameters::ThermalParameters;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parameter sets for known buildings, keyed by building id.
///
/// Built once at start-up and only read afterwards. Lookups for ids that are not registered
/// resolve to [`ThermalParameters::default`] so that hypothetical buildings can still be
/// simulated.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BuildingRegistry {
    buildings: IndexMap<String, ThermalParameters>,
}

impl Default for BuildingRegistry {
    fn default() -> Self {
        Self::reference_buildings()
    }
}

impl BuildingRegistry {
    pub fn new(buildings: IndexMap<String, ThermalParameters>) -> Self {
        Self { buildings }
    }

    pub fn empty() -> Self {
        Self::new(IndexMap::new())
    }

    /// The three reference office blocks.
    pub fn reference_buildings() -> Self {
        let block = |c_i: f64, a_solar: f64, hvac_capacity_kw: f64, floor_area_m2: f64, n_floors: u32| {
            ThermalParameters {
                c_i,
                c_w: c_i * 10.,
                r_iw: 0.002,
                r_we: 0.001,
                a_solar,
                hvac_capacity_kw,
                floor_area_m2,
                n_floors,
                ..Default::default()
            }
        };

        Self::new(IndexMap::from([
            ("pleiades-a".to_string(), block(6e6, 120., 150., 4_500., 5)),
            ("pleiades-b".to_string(), block(4e6, 70., 80., 2_500., 2)),
            ("pleiades-c".to_string(), block(2e6, 40., 40., 1_200., 1)),
        ]))
    }

    pub fn contains(&self, building_id: &str) -> bool {
        self.buildings.contains_key(building_id)
    }

    pub fn building_ids(&self) -> impl Iterator<Item = &str> {
        self.buildings.keys().map(String::as_str)
    }

    pub fn parameters_for(&self, building_id: &str) -> ThermalParameters {
        match self.buildings.get(building_id) {
            Some(parameters) => *parameters,
            None => {
                debug!(building_id, "Unknown building, using default thermal parameters");
                ThermalParameters::default()
            }
        }
    }

    pub fn model_for(&self, building_id: &str) -> ThermalModel {
        ThermalModel::new(self.parameters_for(building_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn registry() -> BuildingRegistry {
        BuildingRegistry::default()
    }

    #[rstest]
    fn should_hold_reference_buildings_in_order(registry: BuildingRegistry) {
        assert_eq!(
            registry.building_ids().collect::<Vec<_>>(),
            vec!["pleiades-a", "pleiades-b", "pleiades-c"]
        );
        let parameters = registry.parameters_for("pleiades-b");
        assert_eq!(parameters.c_w, 4e7);
        assert_eq!(parameters.hvac_capacity_kw, 80.);
        assert_eq!(parameters.n_floors, 2);
        assert_eq!(parameters.cop_heat, 4.);
    }

    #[rstest]
    fn should_fall_back_to_defaults_for_unknown_building(registry: BuildingRegistry) {
        assert!(!registry.contains("hypothetical"));
        assert_eq!(
            registry.parameters_for("hypothetical"),
            ThermalParameters::default()
        );
    }

    #[rstest]
    fn should_deserialize_from_map() {
        let registry: BuildingRegistry =
            serde_json::from_str(r#"{"annex": {"hvac_capacity_kw": 20.0}}"#).unwrap();
        assert!(registry.contains("annex"));
        assert_eq!(registry.parameters_for("annex").hvac_capacity_kw, 20.);
        assert!(!registry.model_for("annex").is_calibrated());
    }
}
