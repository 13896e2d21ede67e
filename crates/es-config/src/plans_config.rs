use crate::{ConfigError, ConfigErrorResult};

use es_core::Plan;

use serde::Deserialize;

/// Monthly allowance of one plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PlanLimits {
    pub scans: u64,
    pub tokens: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlansConfig {
    pub free: PlanLimits,
    pub pro: PlanLimits,
    pub team: PlanLimits,
}

impl Default for PlansConfig {
    fn default() -> Self {
        Self {
            free: PlanLimits {
                scans: 5,
                tokens: 100_000,
            },
            pro: PlanLimits {
                scans: 50,
                tokens: 1_000_000,
            },
            team: PlanLimits {
                scans: 999_999,
                tokens: 10_000_000,
            },
        }
    }
}

impl PlansConfig {
    pub fn limits(&self, plan: Plan) -> PlanLimits {
        match plan {
            Plan::Free => self.free,
            Plan::Pro => self.pro,
            Plan::Team => self.team,
        }
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        for (name, limits) in [("free", self.free), ("pro", self.pro), ("team", self.team)] {
            if limits.scans == 0 || limits.tokens == 0 {
                return Err(ConfigError::config(format!(
                    "plans.{name} limits must be positive, got scans={} tokens={}",
                    limits.scans, limits.tokens
                )));
            }
        }
        Ok(())
    }
}
