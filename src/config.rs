//! Command-line configuration.

use crate::error::{LedgerError, Result};
use crate::record::parse_date_text;
use crate::stats::Period;
use chrono::{Local, NaiveDate};
use std::path::PathBuf;

/// What the CLI writes to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One ledger row per order.
    Ledger,
    /// Sales summary as `metric,value` rows.
    Stats { period: Period, today: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub mode: OutputMode,
}

impl Config {
    /// Builds the configuration from arguments, excluding the program name.
    ///
    /// `--period` and `--as-of` only have an effect together with `--stats`.
    /// The reference date defaults to today's local date.
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut input = None;
        let mut stats = false;
        let mut period = Period::default();
        let mut today = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--stats" => stats = true,
                "--period" => {
                    let value = flag_value(&arg, args.next())?;
                    period = value.parse().map_err(|message| LedgerError::InvalidArgument {
                        arg: arg.clone(),
                        message,
                    })?;
                }
                "--as-of" => {
                    let value = flag_value(&arg, args.next())?;
                    let date =
                        parse_date_text(&value).ok_or_else(|| LedgerError::InvalidArgument {
                            arg: arg.clone(),
                            message: format!("expected YYYY-MM-DD, got '{}'", value),
                        })?;
                    today = Some(date);
                }
                flag if flag.starts_with("--") => {
                    return Err(LedgerError::InvalidArgument {
                        arg: arg.clone(),
                        message: "unknown flag".to_string(),
                    })
                }
                _ if input.is_none() => input = Some(PathBuf::from(arg)),
                _ => {
                    return Err(LedgerError::InvalidArgument {
                        arg,
                        message: "only one input file is accepted".to_string(),
                    })
                }
            }
        }

        let input = input.ok_or(LedgerError::MissingArgument)?;
        let mode = if stats {
            OutputMode::Stats {
                period,
                today: today.unwrap_or_else(|| Local::now().date_naive()),
            }
        } else {
            OutputMode::Ledger
        };

        Ok(Config { input, mode })
    }
}

fn flag_value(flag: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| LedgerError::InvalidArgument {
        arg: flag.to_string(),
        message: "missing value".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(args: &[&str]) -> Result<Config> {
        Config::from_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_input_only_defaults_to_ledger() {
        let cfg = config(&["orders.csv"]).unwrap();
        assert_eq!(cfg.input, PathBuf::from("orders.csv"));
        assert_eq!(cfg.mode, OutputMode::Ledger);
    }

    #[test]
    fn test_stats_with_period_and_date() {
        let cfg = config(&["--stats", "orders.csv", "--period", "all", "--as-of", "2026-03-15"])
            .unwrap();
        assert_eq!(
            cfg.mode,
            OutputMode::Stats {
                period: Period::All,
                today: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            }
        );
    }

    #[test]
    fn test_missing_input() {
        assert!(matches!(
            config(&["--stats"]),
            Err(LedgerError::MissingArgument)
        ));
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(
            config(&["a.csv", "--period", "decade"]),
            Err(LedgerError::InvalidArgument { .. })
        ));
        assert!(matches!(
            config(&["a.csv", "--as-of"]),
            Err(LedgerError::InvalidArgument { .. })
        ));
        assert!(matches!(
            config(&["a.csv", "--verbose"]),
            Err(LedgerError::InvalidArgument { .. })
        ));
        assert!(matches!(
            config(&["a.csv", "b.csv"]),
            Err(LedgerError::InvalidArgument { .. })
        ));
    }
}
