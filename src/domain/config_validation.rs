//! Configuration validation and assembly.
//!
//! Every value is checked before the first bar is simulated. Values that
//! fail to parse are errors, never silently replaced by defaults.

use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::backtest::{BacktestConfig, DEFAULT_STARTING_CASH};
use crate::domain::error::BacktestError;
use crate::domain::metrics::Frequency;
use crate::domain::strategy::{
    DecisionRule, Strategy, DEFAULT_BAND_PERIOD, DEFAULT_DEVIATION_FACTOR, DEFAULT_FAST_PERIOD,
    DEFAULT_OVERBOUGHT, DEFAULT_OVERSOLD, DEFAULT_RSI_PERIOD, DEFAULT_SLOW_PERIOD,
};
use crate::ports::config_port::ConfigPort;

pub const BACKTEST_SECTION: &str = "backtest";
const STRATEGY_SECTION: &str = "strategy";

/// Read `[backtest]`, applying defaults for absent keys.
pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, BacktestError> {
    let starting_cash = parse_or(config, BACKTEST_SECTION, "starting_cash", DEFAULT_STARTING_CASH)?;
    let risk_free_rate = parse_or(config, BACKTEST_SECTION, "risk_free_rate", 0.0)?;
    let frequency = match value(config, BACKTEST_SECTION, "frequency") {
        Some(raw) => Frequency::from_str(&raw)
            .map_err(|reason| BacktestError::invalid(BACKTEST_SECTION, "frequency", reason))?,
        None => Frequency::default(),
    };

    let bt = BacktestConfig {
        starting_cash,
        frequency,
        risk_free_rate,
    };
    bt.validate()?;
    Ok(bt)
}

/// `[backtest] data_file`, if configured.
pub fn data_file(config: &dyn ConfigPort) -> Option<PathBuf> {
    value(config, BACKTEST_SECTION, "data_file").map(PathBuf::from)
}

/// Sections describing a strategy: `strategy` or `strategy.<name>`.
pub fn strategy_sections(config: &dyn ConfigPort) -> Vec<String> {
    config
        .sections()
        .into_iter()
        .filter(|s| {
            s == STRATEGY_SECTION
                || s.strip_prefix(STRATEGY_SECTION)
                    .and_then(|rest| rest.strip_prefix('.'))
                    .is_some_and(|name| !name.is_empty())
        })
        .collect()
}

/// Build every configured strategy, or the three defaults when none is
/// configured.
pub fn build_strategies(config: &dyn ConfigPort) -> Result<Vec<Strategy>, BacktestError> {
    let sections = strategy_sections(config);
    if sections.is_empty() {
        log::info!("no strategy sections configured, running defaults");
        return Ok(Strategy::defaults());
    }
    let mut strategies: Vec<Strategy> = Vec::with_capacity(sections.len());
    for section in &sections {
        let strategy = build_strategy(config, section)?;
        if let Some(clash) = strategies.iter().find(|s| s.slug() == strategy.slug()) {
            return Err(BacktestError::invalid(
                section,
                "name",
                format!(
                    "'{}' and '{}' both report as '{}'",
                    clash.name,
                    strategy.name,
                    strategy.slug()
                ),
            ));
        }
        strategies.push(strategy);
    }
    Ok(strategies)
}

pub fn build_strategy(config: &dyn ConfigPort, section: &str) -> Result<Strategy, BacktestError> {
    let kind = value(config, section, "kind").ok_or_else(|| BacktestError::ConfigMissing {
        section: section.to_string(),
        key: "kind".to_string(),
    })?;

    let rule = match kind.to_lowercase().as_str() {
        "threshold-reversion" => DecisionRule::ThresholdReversion {
            period: parse_or(config, section, "period", DEFAULT_RSI_PERIOD)?,
            oversold: parse_or(config, section, "oversold", DEFAULT_OVERSOLD)?,
            overbought: parse_or(config, section, "overbought", DEFAULT_OVERBOUGHT)?,
        },
        "band-breakout" => DecisionRule::BandBreakout {
            period: parse_or(config, section, "period", DEFAULT_BAND_PERIOD)?,
            deviation_factor: parse_or(
                config,
                section,
                "deviation_factor",
                DEFAULT_DEVIATION_FACTOR,
            )?,
        },
        "crossover" => DecisionRule::Crossover {
            fast_period: parse_or(config, section, "fast_period", DEFAULT_FAST_PERIOD)?,
            slow_period: parse_or(config, section, "slow_period", DEFAULT_SLOW_PERIOD)?,
        },
        other => {
            return Err(BacktestError::invalid(
                section,
                "kind",
                format!(
                    "unknown kind '{}', expected threshold-reversion, band-breakout or crossover",
                    other
                ),
            ));
        }
    };
    rule.validate(section)?;

    let name = value(config, section, "name").unwrap_or_else(|| default_name(section, &rule));
    Ok(Strategy::new(name, rule))
}

fn default_name(section: &str, rule: &DecisionRule) -> String {
    if let Some(name) = section
        .strip_prefix(STRATEGY_SECTION)
        .and_then(|rest| rest.strip_prefix('.'))
    {
        return name.to_string();
    }
    match rule {
        DecisionRule::ThresholdReversion { .. } => Strategy::rsi().name,
        DecisionRule::BandBreakout { .. } => Strategy::bollinger_bands().name,
        DecisionRule::Crossover { .. } => Strategy::moving_average_crossover().name,
    }
}

/// Non-empty value, trimmed.
fn value(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, BacktestError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value(config, section, key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e| {
            BacktestError::invalid(section, key, format!("cannot parse '{}': {}", raw, e))
        }),
    }
}
