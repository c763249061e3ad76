//! CSV export of engine results.

use anyhow::{Context, Result};
use backlab_core::contract::{EquityPoint, Trade};

/// Columns: entry_date, exit_date, entry_price, exit_price, size, pnl,
/// return_pct, duration, entry_fees, exit_fees
pub fn trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "entry_date",
        "exit_date",
        "entry_price",
        "exit_price",
        "size",
        "pnl",
        "return_pct",
        "duration",
        "entry_fees",
        "exit_fees",
    ])?;
    for t in trades {
        wtr.write_record([
            t.entry_date.clone().unwrap_or_default(),
            t.exit_date.clone().unwrap_or_default(),
            format!("{:.6}", t.entry_price),
            format!("{:.6}", t.exit_price),
            format!("{:.6}", t.size),
            format!("{:.2}", t.pnl),
            format!("{:.6}", t.return_pct),
            t.duration.to_string(),
            format!("{:.4}", t.entry_fees),
            format!("{:.4}", t.exit_fees),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn equity_csv(points: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "equity"])?;
    for p in points {
        wtr.write_record([p.timestamp.clone(), format!("{:.2}", p.equity)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trades_have_header_and_rows() {
        let trades = vec![Trade {
            entry_date: Some("2024-01-02T00:00:00".into()),
            exit_date: Some("2024-01-09T00:00:00".into()),
            entry_price: 42000.0,
            exit_price: 43050.5,
            size: 0.25,
            pnl: 262.625,
            return_pct: 0.025,
            duration: 7,
            entry_fees: 5.25,
            exit_fees: 5.38,
        }];
        let csv = trades_csv(&trades).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("entry_date,exit_date"));
        assert!(lines[1].contains(",7,"));
    }

    #[test]
    fn missing_trade_dates_export_as_empty_cells() {
        let trades = vec![Trade {
            entry_date: None,
            exit_date: None,
            entry_price: 100.0,
            exit_price: 99.0,
            size: 1.0,
            pnl: -1.0,
            return_pct: -0.01,
            duration: 2,
            entry_fees: 0.0,
            exit_fees: 0.0,
        }];
        let csv = trades_csv(&trades).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with(",,100.000000,99.000000"));
    }

    #[test]
    fn empty_equity_is_header_only() {
        assert_eq!(equity_csv(&[]).unwrap(), "timestamp,equity\n");
    }
}
