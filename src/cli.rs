//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_candle_adapter::CsvCandleAdapter;
use crate::adapters::csv_replay_adapter::{read_session_file, SessionCommand};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_store_adapter::JsonStoreAdapter;
use crate::domain::engine::{EngineConfig, PaperTradingEngine};
use crate::domain::error::PapertradeError;
use crate::domain::indicator::{compute_indicator, IndicatorType, IndicatorValue};
use crate::domain::stats::TradeStats;
use crate::ports::candle_port::CandleSource;

#[derive(Parser, Debug)]
#[command(name = "papertrade", about = "Paper-trading simulation engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a session transcript through the engine
    Replay {
        /// Session transcript CSV (command,symbol,price,timestamp)
        #[arg(short, long)]
        session: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Save the final engine state to a JSON store
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Compute an indicator series over a candle CSV directory
    Indicators {
        /// Directory containing {SYMBOL}.csv files
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: String,
        /// One of: sma, ema, rsi, bollinger, macd
        #[arg(short, long)]
        indicator: String,
        #[arg(short, long, default_value_t = 14)]
        period: usize,
        /// Bollinger standard deviation multiplier
        #[arg(long, default_value_t = 2.0)]
        multiplier: f64,
        #[arg(long, default_value_t = 12)]
        fast: usize,
        #[arg(long, default_value_t = 26)]
        slow: usize,
        #[arg(long, default_value_t = 9)]
        signal: usize,
    },
    /// Validate an engine configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Replay {
            session,
            config,
            store,
        } => run_replay(&session, config.as_ref(), store.as_ref()),
        Command::Indicators {
            data,
            symbol,
            indicator,
            period,
            multiplier,
            fast,
            slow,
            signal,
        } => run_indicators(&data, &symbol, &indicator, period, multiplier, fast, slow, signal),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = PapertradeError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn build_engine_config(config_path: Option<&PathBuf>) -> Result<EngineConfig, ExitCode> {
    let Some(path) = config_path else {
        return Ok(EngineConfig::default());
    };
    let adapter = load_config(path)?;
    EngineConfig::from_config(&adapter).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn run_replay(
    session_path: &PathBuf,
    config_path: Option<&PathBuf>,
    store_path: Option<&PathBuf>,
) -> ExitCode {
    let config = match build_engine_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let commands = match read_session_file(session_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!(
        "Replaying {} commands from {}",
        commands.len(),
        session_path.display()
    );

    let mut engine = PaperTradingEngine::new(config);
    for command in commands {
        let result = match command {
            SessionCommand::Tick(tick) => {
                engine.update_price(&tick);
                Ok(())
            }
            SessionCommand::Buy { symbol, price } => engine.buy(&symbol, price).map(|_| ()),
            SessionCommand::Sell { symbol, price } => engine.sell(&symbol, price).map(|_| ()),
            SessionCommand::Close { symbol } => {
                match engine.open_position_for_symbol(&symbol).map(|p| p.id.clone()) {
                    Some(id) => engine.close_position(&id),
                    None => Err(PapertradeError::NoOpenPosition { symbol }),
                }
            }
            SessionCommand::Reset => {
                engine.reset_account();
                Ok(())
            }
        };
        // A rejected command is part of the session record, not a fatal error.
        if let Err(e) = result {
            eprintln!("rejected: {e}");
        }
    }

    print_summary(&engine);

    if let Some(path) = store_path {
        let mut store = match JsonStoreAdapter::open(path.clone()) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        if let Err(e) = engine.save_to(&mut store) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Saved engine state to {}", path.display());
    }

    ExitCode::SUCCESS
}

fn print_summary(engine: &PaperTradingEngine) {
    let account = engine.account();
    let closed = engine.closed_positions();
    let stats = TradeStats::compute(closed.iter().copied());

    println!("balance: {:.2}", account.balance);
    println!("realized_pnl: {:.2}", account.realized_pnl);
    println!("total_return_pct: {:.4}", account.total_return_percent());
    println!("open_positions: {}", engine.open_positions().len());
    println!("closed_positions: {}", closed.len());
    println!("wins: {}", stats.wins);
    println!("losses: {}", stats.losses);
    println!("win_rate: {:.4}", stats.win_rate);
    if stats.profit_factor.is_finite() {
        println!("profit_factor: {:.4}", stats.profit_factor);
    } else {
        println!("profit_factor: inf");
    }
}

/// Resolve CLI indicator arguments into an `IndicatorType`.
pub fn parse_indicator_type(
    name: &str,
    period: usize,
    multiplier: f64,
    fast: usize,
    slow: usize,
    signal: usize,
) -> Result<IndicatorType, PapertradeError> {
    match name.to_ascii_lowercase().as_str() {
        "sma" => Ok(IndicatorType::Sma(period)),
        "ema" => Ok(IndicatorType::Ema(period)),
        "rsi" => Ok(IndicatorType::Rsi(period)),
        "bollinger" => Ok(IndicatorType::Bollinger {
            period,
            stddev_mult_x100: (multiplier * 100.0).round() as u32,
        }),
        "macd" => Ok(IndicatorType::Macd { fast, slow, signal }),
        other => Err(PapertradeError::ConfigInvalid {
            section: "indicators".into(),
            key: "indicator".into(),
            reason: format!("unknown indicator: {other}"),
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_indicators(
    data: &PathBuf,
    symbol: &str,
    indicator: &str,
    period: usize,
    multiplier: f64,
    fast: usize,
    slow: usize,
    signal: usize,
) -> ExitCode {
    let indicator_type = match parse_indicator_type(indicator, period, multiplier, fast, slow, signal)
    {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let adapter = CsvCandleAdapter::new(data.clone());
    let candles = match adapter.fetch_candles(
        symbol,
        chrono::DateTime::<chrono::Utc>::MIN_UTC,
        chrono::DateTime::<chrono::Utc>::MAX_UTC,
    ) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Computing {} over {} candles", indicator_type, candles.len());

    let series = compute_indicator(&candles, &indicator_type);
    match indicator_type {
        IndicatorType::Bollinger { .. } => println!("timestamp,upper,middle,lower"),
        IndicatorType::Macd { .. } => println!("timestamp,line,signal,histogram"),
        _ => println!("timestamp,value"),
    }
    for point in &series.values {
        let ts = point.timestamp.to_rfc3339();
        if !point.valid {
            match point.value {
                IndicatorValue::Simple(_) => println!("{ts},"),
                IndicatorValue::Bollinger { .. } => println!("{ts},,,"),
                IndicatorValue::Macd { .. } => println!("{ts},,,"),
            }
            continue;
        }
        match point.value {
            IndicatorValue::Simple(v) => println!("{ts},{v}"),
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => println!("{ts},{upper},{middle},{lower}"),
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => println!("{ts},{line},{signal},{histogram}"),
        }
    }

    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match EngineConfig::from_config(&adapter) {
        Ok(config) => {
            eprintln!("Configuration is valid.");
            eprintln!("  initial_balance = {}", config.initial_balance);
            eprintln!("  default_quantity = {}", config.default_quantity);
            eprintln!("  stop_loss_pct = {}", config.stop_loss_pct);
            eprintln!("  take_profit_pct = {}", config.take_profit_pct);
            eprintln!(
                "  single_position_per_symbol = {}",
                config.single_position_per_symbol
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
