//! Integration tests for the backtest engine.
//!
//! Tests cover:
//! - End-to-end runs over hand-built series with known fills
//! - Warm-up behaviour and cash-constrained rejections
//! - Multi-strategy runs and reproducibility
//! - Portfolio invariants under random price paths (proptest)

mod common;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use barsim::domain::backtest::{run_backtest, run_many, BacktestConfig};
use barsim::domain::metrics::Frequency;
use barsim::domain::portfolio::RejectReason;
use barsim::domain::position::TradeState;
use barsim::domain::strategy::{DecisionRule, Strategy};
use common::*;
use proptest::prelude::*;

fn fast_crossover() -> Strategy {
    Strategy::new(
        "Fast Cross",
        DecisionRule::Crossover {
            fast_period: 1,
            slow_period: 2,
        },
    )
}

// Buy at 100 on bar 3, sell at 110 on bar 5.
const ROUND_TRIP: [f64; 6] = [105.0, 104.0, 99.0, 100.0, 120.0, 110.0];

mod end_to_end {
    use super::*;

    #[test]
    fn single_round_trip_matches_hand_calculation() {
        let bars = bars_from_closes(&ROUND_TRIP);
        let result = run_backtest(&bars, &fast_crossover(), &BacktestConfig::default()).unwrap();
        let report = &result.report;

        assert_eq!(result.portfolio.trades.len(), 1);
        let trade = &result.portfolio.trades[0];
        assert_eq!(trade.entry_bar, 3);
        assert_eq!(trade.size, 1000);
        assert_abs_diff_eq!(trade.entry_price, 100.0);
        match trade.state {
            TradeState::Closed {
                exit_bar,
                exit_price,
                pnl,
                ..
            } => {
                assert_eq!(exit_bar, 5);
                assert_abs_diff_eq!(exit_price, 110.0);
                assert_abs_diff_eq!(pnl, 10_000.0);
            }
            TradeState::Open => panic!("trade should be closed"),
        }

        assert_abs_diff_eq!(result.portfolio.cash, 110_000.0);
        assert!(result.portfolio.is_flat());
        assert_abs_diff_eq!(report.starting_value, 100_000.0);
        assert_abs_diff_eq!(report.final_value, 110_000.0);
        assert_abs_diff_eq!(report.total_return, 10.0, epsilon = 1e-9);
        assert_eq!(report.total_trades, 1);
        assert_eq!(report.wins, 1);
        assert_eq!(report.losses, 0);
        assert_abs_diff_eq!(report.win_rate, 1.0);
        assert_eq!(report.bars, 6);
        assert_eq!(report.rejected_orders, 0);
    }

    #[test]
    fn equity_curve_marks_position_to_market() {
        let bars = bars_from_closes(&ROUND_TRIP);
        let result = run_backtest(&bars, &fast_crossover(), &BacktestConfig::default()).unwrap();
        let equity = result.portfolio.equity_values();

        assert_eq!(
            equity,
            vec![100_000.0, 100_000.0, 100_000.0, 100_000.0, 100_000.0, 120_000.0, 110_000.0]
        );
        assert_eq!(result.portfolio.equity_curve[0].date, None);
        assert_eq!(result.portfolio.equity_curve[6].date, Some(bars[5].date));
    }

    #[test]
    fn drawdown_and_annual_return() {
        let bars = bars_from_closes(&ROUND_TRIP);
        let result = run_backtest(&bars, &fast_crossover(), &BacktestConfig::default()).unwrap();
        let report = &result.report;

        assert_relative_eq!(
            report.max_drawdown.unwrap(),
            10_000.0 / 120_000.0 * 100.0,
            max_relative = 1e-12
        );
        let expected_annual = (1.1f64.powf(252.0 / 6.0) - 1.0) * 100.0;
        assert_relative_eq!(
            report.annual_return.unwrap(),
            expected_annual,
            max_relative = 1e-9
        );
        assert!(report.sharpe_ratio.unwrap() > 0.0);
    }

    #[test]
    fn frequency_changes_annualisation_only() {
        let bars = bars_from_closes(&ROUND_TRIP);
        let daily = run_backtest(&bars, &fast_crossover(), &BacktestConfig::default()).unwrap();
        let weekly_config = BacktestConfig {
            frequency: Frequency::Weekly,
            ..Default::default()
        };
        let weekly = run_backtest(&bars, &fast_crossover(), &weekly_config).unwrap();

        assert_eq!(daily.portfolio, weekly.portfolio);
        let ratio = daily.report.sharpe_ratio.unwrap() / weekly.report.sharpe_ratio.unwrap();
        assert_relative_eq!(ratio, (252.0f64 / 52.0).sqrt(), max_relative = 1e-9);
    }

    #[test]
    fn risk_free_rate_lowers_sharpe() {
        let bars = bars_from_closes(&ROUND_TRIP);
        let base = run_backtest(&bars, &fast_crossover(), &BacktestConfig::default()).unwrap();
        let with_rf = BacktestConfig {
            risk_free_rate: 0.05,
            ..Default::default()
        };
        let adjusted = run_backtest(&bars, &fast_crossover(), &with_rf).unwrap();
        assert!(adjusted.report.sharpe_ratio.unwrap() < base.report.sharpe_ratio.unwrap());
    }

    #[test]
    fn open_trade_at_end_is_not_counted() {
        // Buy at 100 on bar 3, never sold.
        let bars = bars_from_closes(&[105.0, 104.0, 99.0, 100.0, 120.0]);
        let result = run_backtest(&bars, &fast_crossover(), &BacktestConfig::default()).unwrap();

        assert!(result.portfolio.trades[0].is_open());
        assert_eq!(result.report.total_trades, 0);
        assert_abs_diff_eq!(result.report.win_rate, 0.0);
        assert_abs_diff_eq!(result.report.final_value, 120_000.0);
    }
}

mod warm_up_and_rejections {
    use super::*;

    #[test]
    fn short_series_never_trades() {
        let bars = generate_bars("2024-01-01", 10, 50.0);
        for strategy in Strategy::defaults() {
            let result = run_backtest(&bars, &strategy, &BacktestConfig::default()).unwrap();
            assert!(result.portfolio.trades.is_empty(), "{}", strategy.name);
            assert!(result.portfolio.rejections.is_empty(), "{}", strategy.name);
            assert_eq!(result.report.total_trades, 0);
            assert_abs_diff_eq!(result.report.win_rate, 0.0);
            assert_eq!(result.report.sharpe_ratio, None);
            assert_abs_diff_eq!(result.report.max_drawdown.unwrap(), 0.0);
        }
    }

    #[test]
    fn buy_beyond_cash_is_rejected_and_recorded() {
        let bars = bars_from_closes(&ROUND_TRIP);
        let config = BacktestConfig {
            starting_cash: 50.0,
            ..Default::default()
        };
        let result = run_backtest(&bars, &fast_crossover(), &config).unwrap();

        assert!(result.portfolio.trades.is_empty());
        assert_eq!(result.portfolio.rejections.len(), 1);
        let rejection = &result.portfolio.rejections[0];
        assert_eq!(rejection.bar, 3);
        assert_eq!(rejection.date, bars[3].date);
        assert_eq!(rejection.reason, RejectReason::InsufficientCash);
        assert_eq!(result.report.rejected_orders, 1);
        assert_abs_diff_eq!(result.report.final_value, 50.0);
    }

    #[test]
    fn single_bar_series() {
        let bars = bars_from_closes(&[42.0]);
        let result = run_backtest(&bars, &Strategy::rsi(), &BacktestConfig::default()).unwrap();
        assert_eq!(result.report.bars, 1);
        assert_eq!(result.report.sharpe_ratio, None);
        assert_abs_diff_eq!(result.report.total_return, 0.0);
    }

    #[test]
    fn empty_series_is_an_error() {
        let result = run_backtest(&[], &Strategy::rsi(), &BacktestConfig::default());
        assert!(result.is_err());
    }
}

mod multi_strategy {
    use super::*;

    #[test]
    fn defaults_trade_on_oscillating_series() {
        let bars = oscillating_bars(400, 100.0, 20.0, 40.0);
        let results = run_many(&bars, &Strategy::defaults(), &BacktestConfig::default()).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].strategy.name, "RSI Strategy");
        assert_eq!(results[1].strategy.name, "Bollinger Bands Strategy");
        assert_eq!(results[2].strategy.name, "MA Crossover Strategy");
        for result in &results {
            assert!(
                !result.portfolio.trades.is_empty(),
                "{} never traded",
                result.strategy.name
            );
            assert_eq!(result.report.bars, 400);
        }
    }

    #[test]
    fn runs_are_reproducible() {
        let bars = oscillating_bars(300, 50.0, 8.0, 25.0);
        let strategies = Strategy::defaults();
        let config = BacktestConfig::default();

        let first = run_many(&bars, &strategies, &config).unwrap();
        let second = run_many(&bars, &strategies, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn one_invalid_strategy_fails_the_batch() {
        let bars = generate_bars("2024-01-01", 50, 10.0);
        let strategies = vec![
            Strategy::rsi(),
            Strategy::new(
                "broken",
                DecisionRule::Crossover {
                    fast_period: 30,
                    slow_period: 10,
                },
            ),
        ];
        assert!(run_many(&bars, &strategies, &BacktestConfig::default()).is_err());
    }
}

mod invariants {
    use super::*;

    fn strategies() -> Vec<Strategy> {
        let mut all = Strategy::defaults();
        all.push(fast_crossover());
        all.push(Strategy::new(
            "Tight RSI",
            DecisionRule::ThresholdReversion {
                period: 3,
                oversold: 40.0,
                overbought: 60.0,
            },
        ));
        all
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn portfolio_invariants_hold(
            closes in prop::collection::vec(1.0f64..500.0, 1..150),
            cash in 10.0f64..1_000_000.0,
        ) {
            let bars = bars_from_closes(&closes);
            let config = BacktestConfig { starting_cash: cash, ..Default::default() };

            for strategy in strategies() {
                let result = run_backtest(&bars, &strategy, &config).unwrap();
                let portfolio = &result.portfolio;
                let report = &result.report;

                prop_assert_eq!(portfolio.equity_curve.len(), bars.len() + 1);
                prop_assert!(portfolio.cash >= 0.0);
                for point in &portfolio.equity_curve {
                    prop_assert!(point.equity >= 0.0);
                }

                prop_assert!((0.0..=1.0).contains(&report.win_rate));
                prop_assert!(report.wins + report.losses <= report.total_trades);
                prop_assert!(report.max_drawdown.unwrap() >= 0.0);
                prop_assert!(report.max_drawdown.unwrap() <= 100.0);

                // No pyramiding: trades never overlap and only the last may be open.
                for pair in portfolio.trades.windows(2) {
                    match pair[0].state {
                        TradeState::Closed { exit_bar, .. } => {
                            prop_assert!(exit_bar < pair[1].entry_bar);
                        }
                        TradeState::Open => prop_assert!(false, "open trade followed by another"),
                    }
                }
                prop_assert_eq!(portfolio.is_flat(), portfolio.open_trade().is_none());

                // Last equity point equals cash plus the marked position.
                let last_close = bars[bars.len() - 1].close;
                let marked = portfolio.cash + portfolio.position.size as f64 * last_close;
                prop_assert!((report.final_value - marked).abs() <= 1e-6 * marked.max(1.0));
            }
        }
    }
}
