//! Scenario configuration: the serde-deserializable description of a
//! scenario, and the `build` step that turns it into the concrete module
//! configs the engine constructs from.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    airborne::{AirborneParamBlock, AirborneSpreadConfig},
    event::{ContactType, TraceDirection},
    modules::{
        ClinicalDetectionConfig, DiseaseModelConfig, NaturalHistoryBlock, RingDestructionConfig,
        TraceExamConfig, TraceZoneFocusConfig,
    },
    ports::distribution::DistributionSpec,
    production_type::{ProductionTypeId, ProductionTypeRegistry},
    scheduler::{
        ResourceSchedulerConfig,
        capacity::CapacityChart,
        priority::{PriorityAxisOrder, TimeWaitingPriority},
    },
    zone::ZoneDefinition,
};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExitConditions {
    pub stop_on_first_detection: bool,
    pub stop_on_disease_extinction: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneDefinitionSpec {
    pub name: String,
    pub radius_km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirborneParamSpec {
    pub from_production_type: String,
    pub to_production_type: String,
    pub prob_spread_1km: f64,
    pub wind_dir_start: f64,
    pub wind_dir_end: f64,
    pub max_spread_km: f64,
    pub delay_mean_days: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingDestructionSpec {
    pub from_production_types: Vec<String>,
    pub to_production_types: Vec<String>,
    pub radius_km: f64,
    pub priority: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceExamSpec {
    pub contact_type: ContactType,
    pub direction: TraceDirection,
    pub production_types: Vec<String>,
    pub reason: String,
    pub detection_multiplier: f64,
    pub test_if_no_signs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceZoneFocusSpec {
    pub contact_type: ContactType,
    pub direction: TraceDirection,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaturalHistorySpec {
    pub production_type: String,
    pub latent: DistributionSpec,
    pub subclinical: DistributionSpec,
    pub clinical: DistributionSpec,
    pub immune: DistributionSpec,
}

/// The parameter-file schema: scenario-level settings plus one spec struct
/// per configurable module, all keyed by production-type name rather than
/// the interned id the engine uses internally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub production_types: Vec<String>,
    pub num_iterations: u64,
    pub max_days: u32,
    pub rng_seed: u64,
    pub riverton_variant: bool,
    #[serde(default)]
    pub exit_conditions: ExitConditions,
    #[serde(default)]
    pub zones: Vec<ZoneDefinitionSpec>,

    pub destruction_capacity: Vec<(i64, u32)>,
    pub vaccination_capacity: Vec<(i64, u32)>,
    pub program_delay: u32,
    pub vaccination_program_threshold: u32,
    pub destruction_axis_order: PriorityAxisOrder,
    pub destruction_time_waiting: TimeWaitingPriority,
    pub vaccination_axis_order: PriorityAxisOrder,
    pub vaccination_time_waiting: TimeWaitingPriority,

    #[serde(default)]
    pub airborne: Vec<AirborneParamSpec>,
    #[serde(default)]
    pub ring_destruction: Vec<RingDestructionSpec>,
    #[serde(default)]
    pub trace_exam: Vec<TraceExamSpec>,
    #[serde(default)]
    pub trace_zone_focus: Vec<TraceZoneFocusSpec>,

    #[serde(default)]
    pub clinical_detection_reason: Option<String>,
    #[serde(default)]
    pub prob_report_vs_time_clinical: HashMap<String, f64>,

    pub natural_history: Vec<NaturalHistorySpec>,
}

/// Every concrete module config, built from a [`ScenarioFile`] plus the
/// production-type registry it implies.
pub struct BuiltScenario {
    pub production_types: ProductionTypeRegistry,
    pub num_iterations: u64,
    pub max_days: u32,
    pub rng_seed: u64,
    pub riverton_variant: bool,
    pub exit_conditions: ExitConditions,
    pub zones: Vec<ZoneDefinition>,
    pub scheduler: ResourceSchedulerConfig,
    pub airborne: AirborneSpreadConfig,
    pub ring_destruction: Vec<RingDestructionConfig>,
    pub trace_exam: Vec<TraceExamConfig>,
    pub trace_zone_focus: Vec<TraceZoneFocusConfig>,
    pub clinical_detection: ClinicalDetectionConfig,
    pub disease_model: DiseaseModelConfig,
}

impl ScenarioFile {
    fn resolve(&self, registry: &ProductionTypeRegistry, name: &str) -> crate::error::SimResult<ProductionTypeId> {
        registry
            .id_of(name)
            .ok_or_else(|| crate::error::SimError::Scenario(format!("unknown production type `{name}`")))
    }

    fn resolve_set(
        &self,
        registry: &ProductionTypeRegistry,
        names: &[String],
    ) -> crate::error::SimResult<HashSet<ProductionTypeId>> {
        names.iter().map(|n| self.resolve(registry, n)).collect()
    }

    pub fn build(&self) -> crate::error::SimResult<BuiltScenario> {
        let registry = ProductionTypeRegistry::new(self.production_types.clone());

        let zones = self
            .zones
            .iter()
            .enumerate()
            .map(|(i, z)| ZoneDefinition {
                id: (i as u16).into(),
                name: z.name.clone(),
                radius_km: z.radius_km,
            })
            .collect();

        let scheduler = ResourceSchedulerConfig {
            n_production_types: registry.len(),
            destruction_capacity: CapacityChart::new(self.destruction_capacity.clone()),
            vaccination_capacity: CapacityChart::new(self.vaccination_capacity.clone()),
            program_delay: self.program_delay,
            vaccination_program_threshold: self.vaccination_program_threshold,
            destruction_axis_order: self.destruction_axis_order,
            destruction_time_waiting: self.destruction_time_waiting,
            vaccination_axis_order: self.vaccination_axis_order,
            vaccination_time_waiting: self.vaccination_time_waiting,
        };

        let mut airborne_params = HashMap::new();
        for spec in &self.airborne {
            let from = self.resolve(&registry, &spec.from_production_type)?;
            let to = self.resolve(&registry, &spec.to_production_type)?;
            airborne_params.insert(
                (from, to),
                AirborneParamBlock {
                    prob_spread_1km: spec.prob_spread_1km,
                    wind_dir_start: spec.wind_dir_start,
                    wind_dir_end: spec.wind_dir_end,
                    max_spread_km: spec.max_spread_km,
                    delay_mean_days: spec.delay_mean_days,
                },
            );
        }
        let airborne = AirborneSpreadConfig {
            params: airborne_params,
            riverton_variant: self.riverton_variant,
        };

        let ring_destruction = self
            .ring_destruction
            .iter()
            .map(|spec| {
                Ok(RingDestructionConfig {
                    from_types: self.resolve_set(&registry, &spec.from_production_types)?,
                    to_types: self.resolve_set(&registry, &spec.to_production_types)?,
                    radius_km: spec.radius_km,
                    priority: spec.priority,
                    reason: spec.reason.clone(),
                    riverton_variant: self.riverton_variant,
                })
            })
            .collect::<crate::error::SimResult<Vec<_>>>()?;

        let trace_exam = self
            .trace_exam
            .iter()
            .map(|spec| {
                Ok(TraceExamConfig {
                    contact_type: spec.contact_type,
                    direction: spec.direction,
                    production_types: self.resolve_set(&registry, &spec.production_types)?,
                    reason: spec.reason.clone(),
                    detection_multiplier: spec.detection_multiplier,
                    test_if_no_signs: spec.test_if_no_signs,
                })
            })
            .collect::<crate::error::SimResult<Vec<_>>>()?;

        let trace_zone_focus = self
            .trace_zone_focus
            .iter()
            .map(|spec| TraceZoneFocusConfig {
                contact_type: spec.contact_type,
                direction: spec.direction,
                reason: spec.reason.clone(),
            })
            .collect();

        let mut prob_report = HashMap::new();
        for (name, prob) in &self.prob_report_vs_time_clinical {
            prob_report.insert(self.resolve(&registry, name)?, *prob);
        }
        let clinical_detection = ClinicalDetectionConfig {
            prob_report_vs_time_clinical: prob_report,
            reason: self
                .clinical_detection_reason
                .clone()
                .unwrap_or_else(|| crate::reason::well_known::DETECTION.to_string()),
        };

        let mut natural_history = HashMap::new();
        for spec in &self.natural_history {
            let production_type = self.resolve(&registry, &spec.production_type)?;
            natural_history.insert(
                production_type,
                NaturalHistoryBlock {
                    latent_days: spec.latent.build(),
                    subclinical_days: spec.subclinical.build(),
                    clinical_days: spec.clinical.build(),
                    immune_days: spec.immune.build(),
                },
            );
        }
        let disease_model = DiseaseModelConfig {
            natural_history,
            riverton_variant: self.riverton_variant,
        };

        Ok(BuiltScenario {
            production_types: registry,
            num_iterations: self.num_iterations,
            max_days: self.max_days,
            rng_seed: self.rng_seed,
            riverton_variant: self.riverton_variant,
            exit_conditions: self.exit_conditions,
            zones,
            scheduler,
            airborne,
            ring_destruction,
            trace_exam,
            trace_zone_focus,
            clinical_detection,
            disease_model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_scenario() -> ScenarioFile {
        ScenarioFile {
            production_types: vec!["cattle".into(), "pigs".into()],
            num_iterations: 10,
            max_days: 30,
            rng_seed: 42,
            riverton_variant: false,
            exit_conditions: ExitConditions::default(),
            zones: vec![ZoneDefinitionSpec { name: "surveillance".into(), radius_km: 10.0 }],
            destruction_capacity: vec![(0, 5)],
            vaccination_capacity: vec![(0, 0)],
            program_delay: 2,
            vaccination_program_threshold: 3,
            destruction_axis_order: PriorityAxisOrder::ProductionTypeOuter,
            destruction_time_waiting: TimeWaitingPriority::First,
            vaccination_axis_order: PriorityAxisOrder::ProductionTypeOuter,
            vaccination_time_waiting: TimeWaitingPriority::First,
            airborne: vec![],
            ring_destruction: vec![RingDestructionSpec {
                from_production_types: vec!["cattle".into()],
                to_production_types: vec!["cattle".into(), "pigs".into()],
                radius_km: 3.0,
                priority: 1,
                reason: "Ring".into(),
            }],
            trace_exam: vec![],
            trace_zone_focus: vec![],
            clinical_detection_reason: None,
            prob_report_vs_time_clinical: HashMap::new(),
            natural_history: vec![NaturalHistorySpec {
                production_type: "cattle".into(),
                latent: DistributionSpec::PointMass { days: 2 },
                subclinical: DistributionSpec::PointMass { days: 1 },
                clinical: DistributionSpec::PointMass { days: 3 },
                immune: DistributionSpec::PointMass { days: 30 },
            }],
        }
    }

    #[test]
    fn builds_production_type_ids_from_names_in_declaration_order() {
        let scenario = minimal_scenario().build().unwrap();
        assert_eq!(scenario.production_types.len(), 2);
        assert_eq!(scenario.production_types.name(ProductionTypeId(0)), "cattle");
        assert_eq!(scenario.production_types.name(ProductionTypeId(1)), "pigs");
        assert_eq!(scenario.ring_destruction.len(), 1);
        assert!(scenario.ring_destruction[0].from_types.contains(&ProductionTypeId(0)));
        assert!(scenario.ring_destruction[0].to_types.contains(&ProductionTypeId(1)));
    }

    #[test]
    fn unknown_production_type_name_is_a_scenario_error() {
        let mut file = minimal_scenario();
        file.ring_destruction[0].from_production_types = vec!["goats".into()];
        let err = file.build().unwrap_err();
        assert!(matches!(err, crate::error::SimError::Scenario(_)));
    }

    #[test]
    fn defaults_clinical_detection_reason_to_the_well_known_constant() {
        let scenario = minimal_scenario().build().unwrap();
        assert_eq!(scenario.clinical_detection.reason, crate::reason::well_known::DETECTION);
    }

    #[test]
    fn num_iterations_and_max_days_pass_through_unchanged() {
        let scenario = minimal_scenario().build().unwrap();
        assert_eq!(scenario.num_iterations, 10);
        assert_eq!(scenario.max_days, 30);
        assert_eq!(scenario.rng_seed, 42);
    }
}
