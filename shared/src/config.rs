use std::io::Read;

use toml::{Table, Value};

use crate::{get_reader, LoadError};

pub const DEFAULT_VIOLATION_TOLERANCE: f64 = 1e-6;

/// How the lower bound `L` of the integer L-shaped cut is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LowerBound {
    /// Shipment cost is never negative for a validated instance.
    Zero,
    /// Every customer served by its cheapest facility.
    Computed,
    Fixed(f64),
}

#[derive(Debug, Clone)]
pub struct DecompositionConfig {
    /// A cut is only added when the subproblem objective exceeds `eta` by more than this.
    pub violation_tolerance: f64,
    pub lower_bound: LowerBound,
    /// Fall back to the exact subproblem at incumbents that pass the relaxed check.
    pub integer_cuts: bool,
    pub root_cut_rounds: usize,
    pub max_master_iterations: usize,
    pub threads: i32,
    /// Seconds, applied to every master solve.
    pub time_limit: Option<f64>,
    /// Write the initial master model to this file (LP format) before solving.
    pub master_model_output: Option<String>,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        DecompositionConfig {
            violation_tolerance: DEFAULT_VIOLATION_TOLERANCE,
            lower_bound: LowerBound::Zero,
            integer_cuts: true,
            root_cut_rounds: 20,
            max_master_iterations: 10_000,
            threads: 1,
            time_limit: None,
            master_model_output: None,
        }
    }
}

impl DecompositionConfig {
    pub fn load(path: &str) -> Result<DecompositionConfig, LoadError> {
        let mut config_toml = String::new();

        let mut file = get_reader(path)?;
        file.read_to_string(&mut config_toml)?;

        DecompositionConfig::parse(&config_toml)
    }

    /// Missing keys keep their default value.
    pub fn parse(config_toml: &str) -> Result<DecompositionConfig, LoadError> {
        let parsed_config: Table = toml::from_str(config_toml)?;
        let mut config = DecompositionConfig::default();

        if let Some(value) = parsed_config.get("violation_tolerance") {
            config.violation_tolerance = as_number(value, "violation_tolerance")?;
            if !(config.violation_tolerance >= 0.0) {
                return Err(LoadError::Invalid(
                    "violation_tolerance must not be negative".to_string(),
                ));
            }
        }

        if let Some(value) = parsed_config.get("lower_bound") {
            config.lower_bound = match value {
                Value::String(rule) if rule == "zero" => LowerBound::Zero,
                Value::String(rule) if rule == "computed" => LowerBound::Computed,
                Value::String(rule) => {
                    return Err(LoadError::Parse(format!("unknown lower_bound rule '{}'", rule)))
                }
                other => LowerBound::Fixed(as_number(other, "lower_bound")?),
            };
        }

        if let Some(value) = parsed_config.get("integer_cuts") {
            config.integer_cuts = value
                .as_bool()
                .ok_or_else(|| LoadError::Parse("integer_cuts must be a boolean".to_string()))?;
        }

        if let Some(value) = parsed_config.get("root_cut_rounds") {
            config.root_cut_rounds = as_count(value, "root_cut_rounds")?;
        }

        if let Some(value) = parsed_config.get("max_master_iterations") {
            config.max_master_iterations = as_count(value, "max_master_iterations")?;
        }

        if let Some(value) = parsed_config.get("threads") {
            config.threads = as_count(value, "threads")? as i32;
        }

        if let Some(value) = parsed_config.get("time_limit") {
            config.time_limit = Some(as_number(value, "time_limit")?);
        }

        if let Some(value) = parsed_config.get("master_model_output") {
            config.master_model_output = Some(
                value
                    .as_str()
                    .ok_or_else(|| LoadError::Parse("master_model_output must be a path".to_string()))?
                    .to_string(),
            );
        }

        Ok(config)
    }
}

fn as_number(value: &Value, key: &str) -> Result<f64, LoadError> {
    match value {
        Value::Float(v) => Ok(*v),
        Value::Integer(v) => Ok(*v as f64),
        _ => Err(LoadError::Parse(format!("{} must be a number", key))),
    }
}

fn as_count(value: &Value, key: &str) -> Result<usize, LoadError> {
    value
        .as_integer()
        .filter(|v| *v >= 0)
        .map(|v| v as usize)
        .ok_or_else(|| LoadError::Parse(format!("{} must be a non-negative integer", key)))
}
