//! Airborne spread: the spatial-kernel exposure generator with a delayed-
//! infection rotating buffer.

pub mod ring;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::SimResult,
    event::{ContactType, Event, EventTagSet, types::EventTag},
    module::{Module, ModuleContext},
    ports::{DelayDistribution, RandomNumberGenerator, SizeDistribution},
    production_type::ProductionTypeId,
};

use ring::DelayRing;

/// Per (source production type, target production type) spread parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AirborneParamBlock {
    pub prob_spread_1km: f64,
    /// Degrees `[0, 360)`. `wind_dir_start > wind_dir_end` means the
    /// downwind arc crosses 0°.
    pub wind_dir_start: f64,
    pub wind_dir_end: f64,
    /// `< 2` km means this source/target pair is effectively disabled.
    pub max_spread_km: f64,
    /// Mean of the geometric delay distribution, in days. `0.0` samples a
    /// constant zero delay (point-mass).
    pub delay_mean_days: f64,
}

impl AirborneParamBlock {
    fn is_enabled(&self) -> bool {
        self.max_spread_km >= 2.0
    }

    fn build_delay_distribution(&self) -> Box<dyn DelayDistribution> {
        if self.delay_mean_days <= 0.0 {
            Box::new(crate::ports::distribution::PointMass(0))
        } else {
            Box::new(crate::ports::distribution::Geometric {
                mean: self.delay_mean_days,
            })
        }
    }

    /// `true` if the compass heading from source to target falls within the
    /// downwind arc, accounting for the 0° crossing case.
    fn heading_in_arc(&self, heading: f64) -> bool {
        if self.wind_dir_start <= self.wind_dir_end {
            (self.wind_dir_start..=self.wind_dir_end).contains(&heading)
        } else {
            heading >= self.wind_dir_start || heading <= self.wind_dir_end
        }
    }
}

pub struct AirborneSpreadConfig {
    pub params: HashMap<(ProductionTypeId, ProductionTypeId), AirborneParamBlock>,
    pub riverton_variant: bool,
}

/// Spatial-kernel exposure generator. One instance per scenario, internally
/// keyed by source/target production-type pair.
pub struct AirborneSpread {
    params: HashMap<(ProductionTypeId, ProductionTypeId), AirborneParamBlock>,
    delay_distributions: HashMap<(ProductionTypeId, ProductionTypeId), Box<dyn DelayDistribution>>,
    size_distribution: Box<dyn SizeDistribution>,
    riverton_variant: bool,
    herd_size_factor: Vec<f64>,
    ring: DelayRing,
    /// Buffered `AttemptToInfect` count, tracked separately from the ring's
    /// total pending count: `has_pending_infections` considers infections
    /// only, not the (also-delayable) `Exposure` events.
    pending_infections: usize,
}

impl AirborneSpread {
    pub fn new(config: AirborneSpreadConfig, size_distribution: Box<dyn SizeDistribution>) -> Self {
        let delay_distributions = config
            .params
            .iter()
            .map(|(&key, block)| (key, block.build_delay_distribution()))
            .collect();
        Self {
            params: config.params,
            delay_distributions,
            size_distribution,
            riverton_variant: config.riverton_variant,
            herd_size_factor: Vec::new(),
            ring: DelayRing::new(),
            pending_infections: 0,
        }
    }

    fn recompute_herd_size_factor(&mut self, herds: &crate::herd::HerdList) {
        self.herd_size_factor = herds
            .iter()
            .map(|h| 2.0 * self.size_distribution.cdf(h.size.0))
            .collect();
    }

    /// Routes a buffered effect to the outgoing queue immediately (`delay <=
    /// 0`) or into the delay ring.
    fn route(&mut self, delay: i32, event: Event, out_queue: &mut crate::event::EventQueue) {
        if delay <= 0 {
            out_queue.enqueue(event);
        } else {
            if matches!(event, Event::AttemptToInfect { .. }) {
                self.pending_infections += 1;
            }
            self.ring.push(delay as u32, event);
        }
    }

    fn daily_spread(&mut self, day: u32, ctx: &mut ModuleContext) -> SimResult<()> {
        let ids: Vec<_> = ctx.herds.ids().collect();
        for &source_id in &ids {
            let source = ctx.herds.get(source_id).clone();
            if !source.status.is_infectious() {
                continue;
            }
            for &target_id in &ids {
                if target_id == source_id {
                    continue;
                }
                let target = ctx.herds.get(target_id).clone();
                let Some(block) = self
                    .params
                    .get(&(source.production_type, target.production_type))
                    .copied()
                else {
                    continue;
                };
                if !block.is_enabled() {
                    continue;
                }
                if target.status.is_absorbing(self.riverton_variant) {
                    continue;
                }
                let distance = source.position.distance_km(&target.position);
                if distance > block.max_spread_km {
                    continue;
                }
                let heading = source.position.heading_to(&target.position);
                if !block.heading_in_arc(heading) {
                    continue;
                }

                let denom = (block.max_spread_km - 1.0).max(f64::EPSILON);
                let distance_factor = ((block.max_spread_km - distance) / denom).clamp(0.0, 1.0);
                let hsf_source = self.herd_size_factor.get(source_id.0 as usize).copied().unwrap_or(0.0);
                let hsf_target = self.herd_size_factor.get(target_id.0 as usize).copied().unwrap_or(0.0);
                let probability = (hsf_source
                    * source.prevalence.0
                    * distance_factor
                    * block.prob_spread_1km
                    * hsf_target)
                    .clamp(0.0, 1.0);

                let r = ctx.rng.u01();
                let adequate = r < probability;

                let delay_distribution = self
                    .delay_distributions
                    .get(&(source.production_type, target.production_type))
                    .expect("param block exists implies delay distribution exists");
                let delay = delay_distribution.sample(ctx.rng);
                let effective_day = (day as i32 + delay).max(0) as u32;

                self.route(
                    delay,
                    Event::Exposure {
                        source: source_id,
                        target: target_id,
                        day: effective_day,
                        contact_type: ContactType::AirborneSpread,
                        traceable: false,
                        adequate,
                        delay,
                    },
                    ctx.out_queue,
                );

                if adequate && target.status.is_susceptible() {
                    self.route(
                        delay,
                        Event::AttemptToInfect {
                            source: source_id,
                            target: target_id,
                            day: effective_day,
                            contact_type: ContactType::AirborneSpread,
                            r#override: None,
                        },
                        ctx.out_queue,
                    );
                }
            }
        }
        Ok(())
    }
}

impl Module for AirborneSpread {
    fn name(&self) -> &str {
        "airborne-spread"
    }

    fn events_listened_for(&self) -> EventTagSet {
        EventTagSet::from_tags([EventTag::BeforeEachSimulation, EventTag::NewDay])
    }

    fn run(&mut self, event: &Event, ctx: &mut ModuleContext) -> SimResult<()> {
        match event {
            Event::BeforeEachSimulation => {
                self.recompute_herd_size_factor(ctx.herds);
                self.ring.clear();
                self.pending_infections = 0;
            }
            Event::NewDay { day } => {
                for released in self.ring.advance() {
                    if matches!(released, Event::AttemptToInfect { .. }) {
                        self.pending_infections = self.pending_infections.saturating_sub(1);
                    }
                    ctx.out_queue.enqueue(released);
                }
                self.daily_spread(*day, ctx)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.ring.clear();
        self.herd_size_factor.clear();
        self.pending_infections = 0;
    }

    fn has_pending_infections(&self) -> bool {
        self.pending_infections > 0
    }
}
