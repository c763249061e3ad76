//! Strategy-wide execution parameters: backtest window, capital, costs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::coerce;

// ─── BacktestWindow ─────────────────────────────────────────────────

/// A fixed window code understood by the execution engine.
///
/// Codes: `1w`, `1m`, `3m`, `6m`, `ytd`, `1y`..`10y`, calendar years
/// `2015`..`2025`, and `all`. Serialised as the literal code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BacktestWindow {
    Week,
    /// Trailing 1, 3 or 6 months.
    Months(u8),
    YearToDate,
    /// Trailing 1 to 10 years.
    Years(u8),
    CalendarYear(u16),
    #[default]
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown backtest window code '{0}'")]
pub struct UnknownWindow(pub String);

impl BacktestWindow {
    pub const FIRST_CALENDAR_YEAR: u16 = 2015;
    pub const LAST_CALENDAR_YEAR: u16 = 2025;
    const MONTH_SPANS: [u8; 3] = [1, 3, 6];

    /// Every accepted window, in selector order.
    pub fn all() -> Vec<BacktestWindow> {
        let mut windows = vec![BacktestWindow::Week];
        windows.extend(Self::MONTH_SPANS.iter().map(|&m| BacktestWindow::Months(m)));
        windows.push(BacktestWindow::YearToDate);
        windows.extend((1..=10).map(BacktestWindow::Years));
        windows.extend(
            (Self::FIRST_CALENDAR_YEAR..=Self::LAST_CALENDAR_YEAR).map(BacktestWindow::CalendarYear),
        );
        windows.push(BacktestWindow::All);
        windows
    }

    pub fn code(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BacktestWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BacktestWindow::Week => f.write_str("1w"),
            BacktestWindow::Months(m) => write!(f, "{m}m"),
            BacktestWindow::YearToDate => f.write_str("ytd"),
            BacktestWindow::Years(y) => write!(f, "{y}y"),
            BacktestWindow::CalendarYear(year) => write!(f, "{year}"),
            BacktestWindow::All => f.write_str("all"),
        }
    }
}

impl FromStr for BacktestWindow {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        let unknown = || UnknownWindow(s.to_string());
        match code.as_str() {
            "1w" => return Ok(BacktestWindow::Week),
            "ytd" => return Ok(BacktestWindow::YearToDate),
            "all" => return Ok(BacktestWindow::All),
            _ => {}
        }
        if let Some(n) = code.strip_suffix('m') {
            let months: u8 = n.parse().map_err(|_| unknown())?;
            return if Self::MONTH_SPANS.contains(&months) {
                Ok(BacktestWindow::Months(months))
            } else {
                Err(unknown())
            };
        }
        if let Some(n) = code.strip_suffix('y') {
            let years: u8 = n.parse().map_err(|_| unknown())?;
            return if (1..=10).contains(&years) {
                Ok(BacktestWindow::Years(years))
            } else {
                Err(unknown())
            };
        }
        let year: u16 = code.parse().map_err(|_| unknown())?;
        if (Self::FIRST_CALENDAR_YEAR..=Self::LAST_CALENDAR_YEAR).contains(&year) {
            Ok(BacktestWindow::CalendarYear(year))
        } else {
            Err(unknown())
        }
    }
}

impl TryFrom<String> for BacktestWindow {
    type Error = UnknownWindow;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BacktestWindow> for String {
    fn from(w: BacktestWindow) -> Self {
        w.to_string()
    }
}

// ─── CommonParams ───────────────────────────────────────────────────

/// Execution parameters shared by every condition, merged once at the top
/// level of the request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommonParams {
    pub window: BacktestWindow,
    initial_capital: f64,
    fee_rate: f64,
    slippage_rate: f64,
}

impl Default for CommonParams {
    fn default() -> Self {
        Self {
            window: BacktestWindow::All,
            initial_capital: Self::DEFAULT_INITIAL_CAPITAL,
            fee_rate: Self::DEFAULT_FEE_RATE,
            slippage_rate: Self::DEFAULT_SLIPPAGE_RATE,
        }
    }
}

impl CommonParams {
    pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
    pub const DEFAULT_FEE_RATE: f64 = 0.0005;
    pub const DEFAULT_SLIPPAGE_RATE: f64 = 0.0002;
    pub const MAX_COST_RATE: f64 = 0.1;

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn fee_rate(&self) -> f64 {
        self.fee_rate
    }

    pub fn slippage_rate(&self) -> f64 {
        self.slippage_rate
    }

    /// Capital must be positive; anything else keeps the previous value.
    /// Cost rates clamp into `[0, 0.1]`; non-finite input is ignored.
    pub fn apply(&mut self, edit: CommonParamEdit) {
        match edit {
            CommonParamEdit::Window(window) => self.window = window,
            CommonParamEdit::InitialCapital(capital) => {
                if capital.is_finite() && capital > 0.0 {
                    self.initial_capital = capital;
                }
            }
            CommonParamEdit::FeeRate(rate) => {
                if let Some(rate) = clamp_rate(rate) {
                    self.fee_rate = rate;
                }
            }
            CommonParamEdit::SlippageRate(rate) => {
                if let Some(rate) = clamp_rate(rate) {
                    self.slippage_rate = rate;
                }
            }
        }
    }

    /// Parse raw text for a numeric field; unparseable text keeps the value.
    pub fn apply_text(&mut self, field: CommonField, raw: &str) {
        let Some(value) = coerce::parse_number(raw) else {
            return;
        };
        let edit = match field {
            CommonField::InitialCapital => CommonParamEdit::InitialCapital(value),
            CommonField::FeeRate => CommonParamEdit::FeeRate(value),
            CommonField::SlippageRate => CommonParamEdit::SlippageRate(value),
        };
        self.apply(edit);
    }
}

fn clamp_rate(rate: f64) -> Option<f64> {
    rate.is_finite()
        .then(|| rate.clamp(0.0, CommonParams::MAX_COST_RATE))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommonParamEdit {
    Window(BacktestWindow),
    InitialCapital(f64),
    FeeRate(f64),
    SlippageRate(f64),
}

/// Numeric text inputs of the common parameter form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommonField {
    InitialCapital,
    FeeRate,
    SlippageRate,
}
