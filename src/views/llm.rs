//! Language model rate, cost and throttling figures.

use crate::snapshot::LlmModel;
use serde::Serialize;

/// Fraction of the request limit above which a model counts as throttled.
pub const THROTTLE_THRESHOLD: f64 = 0.8;

const MINUTES_PER_DAY: f64 = 60.0 * 24.0;
// Assumed split of traffic between prompt and completion tokens.
const INPUT_SHARE: f64 = 0.3;
const OUTPUT_SHARE: f64 = 0.7;

/// Tokens per minute across all models.
pub fn token_rate(models: &[LlmModel]) -> f64 {
    models.iter().map(|m| m.tpm).sum()
}

pub fn request_rate(models: &[LlmModel]) -> f64 {
    models.iter().map(|m| m.rpm).sum()
}

/// Remaining prepaid credits; models without a balance count as zero.
pub fn total_credits(models: &[LlmModel]) -> f64 {
    models.iter().filter_map(|m| m.credits).sum()
}

/// Daily spend if the current token rate were sustained for a day.
pub fn estimated_daily_cost(model: &LlmModel) -> f64 {
    let tokens_per_day_k = model.tpm / 1000.0 * MINUTES_PER_DAY;
    model.cost_per_1k_input.unwrap_or(0.0) * tokens_per_day_k * INPUT_SHARE
        + model.cost_per_1k_output.unwrap_or(0.0) * tokens_per_day_k * OUTPUT_SHARE
}

pub fn total_daily_cost(models: &[LlmModel]) -> f64 {
    models.iter().map(estimated_daily_cost).sum()
}

/// A model is throttled above 80% of its request limit. A model without a
/// limit never is.
pub fn is_throttled(model: &LlmModel) -> bool {
    model.rpm_max > 0.0 && model.rpm / model.rpm_max > THROTTLE_THRESHOLD
}

pub fn throttled_count(models: &[LlmModel]) -> usize {
    models.iter().filter(|m| is_throttled(m)).count()
}

/// `used / max` as a percentage clamped to 0..=100; 0 when there is no limit.
pub fn utilisation(used: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    (used / max * 100.0).clamp(0.0, 100.0)
}

/// One row of the model table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelUsage {
    pub model: String,
    pub provider: String,
    pub tpm: f64,
    pub rpm: f64,
    pub tpm_percent: f64,
    pub rpm_percent: f64,
    pub credits: Option<f64>,
    pub daily_cost: f64,
    pub throttled: bool,
}

pub fn model_usage(models: &[LlmModel]) -> Vec<ModelUsage> {
    models
        .iter()
        .map(|m| ModelUsage {
            model: m.model.clone(),
            provider: m.provider.clone(),
            tpm: m.tpm,
            rpm: m.rpm,
            tpm_percent: utilisation(m.tpm, m.tpm_max),
            rpm_percent: utilisation(m.rpm, m.rpm_max),
            credits: m.credits,
            daily_cost: estimated_daily_cost(m),
            throttled: is_throttled(m),
        })
        .collect()
}

/// Aggregate figures for the model page header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LlmTotals {
    pub token_rate: f64,
    pub request_rate: f64,
    pub total_credits: f64,
    pub daily_cost: f64,
    pub throttled: usize,
    pub models: usize,
}

impl LlmTotals {
    pub fn from_models(models: &[LlmModel]) -> Self {
        Self {
            token_rate: token_rate(models),
            request_rate: request_rate(models),
            total_credits: total_credits(models),
            daily_cost: total_daily_cost(models),
            throttled: throttled_count(models),
            models: models.len(),
        }
    }
}
