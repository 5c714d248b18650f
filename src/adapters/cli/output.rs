//! Terminal rendering for profiles and IV history

use std::fmt::Write;

use crate::domain::{GexProfile, IvHistory};

/// Compact signed dollar amount: `$1.23B`, `-$45.60M`, `$980`
pub fn fmt_dollars(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    let body = if abs >= 1e9 {
        format!("{:.2}B", abs / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", abs / 1e6)
    } else if abs >= 1e3 {
        format!("{:.2}K", abs / 1e3)
    } else {
        format!("{:.0}", abs)
    };
    format!("{}${}", sign, body)
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

/// Summary header followed by the per-strike table
pub fn render_profile(profile: &GexProfile) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} GEX profile | spot {:.2} | put gamma {}",
        profile.symbol, profile.spot, profile.put_gamma_policy
    );
    if !profile.expirations.is_empty() {
        let _ = writeln!(out, "Expirations: {}", profile.expirations.join(", "));
    }

    let regime = match profile.is_long_gamma() {
        Some(true) => " (long gamma)",
        Some(false) => " (short gamma)",
        None => "",
    };
    let _ = writeln!(
        out,
        "Net GEX: {}{}",
        fmt_dollars(profile.total_net_gex()),
        regime
    );
    let _ = writeln!(
        out,
        "Gamma flip: {}  Call wall: {} (IV {})  Put wall: {} (IV {})  ATM IV: {}",
        fmt_opt(profile.gamma_flip),
        fmt_opt(profile.call_wall),
        fmt_opt(profile.call_wall_iv),
        fmt_opt(profile.put_wall),
        fmt_opt(profile.put_wall_iv),
        fmt_opt(profile.atm_iv),
    );

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:>10} {:>12} {:>12} {:>12} {:>12} {:>9} {:>9} {:>8} {:>8}",
        "Strike", "Call GEX", "Put GEX", "Net GEX", "Cumulative", "Call OI", "Put OI", "Call IV", "Put IV"
    );
    for (record, cumulative) in profile.strikes.iter().zip(&profile.cumulative) {
        let marker = if Some(record.strike) == profile.call_wall {
            " <- call wall"
        } else if Some(record.strike) == profile.put_wall {
            " <- put wall"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "{:>10.2} {:>12} {:>12} {:>12} {:>12} {:>9} {:>9} {:>8} {:>8}{}",
            record.strike,
            fmt_dollars(record.call_gex),
            fmt_dollars(record.put_gex),
            fmt_dollars(record.net_gex),
            fmt_dollars(*cumulative),
            record.call_oi,
            record.put_oi,
            fmt_opt(record.call_iv),
            fmt_opt(record.put_iv),
            marker,
        );
    }

    out
}

pub fn render_history(history: &IvHistory) -> String {
    let mut out = String::new();

    if history.records.is_empty() {
        let _ = writeln!(out, "No IV history recorded today for {}", history.symbol);
        return out;
    }

    let _ = writeln!(out, "{} IV history ({} samples)", history.symbol, history.records.len());
    let _ = writeln!(out, "{:>6} {:>8} {:>12} {:>12}", "Time", "ATM IV", "Call wall IV", "Put wall IV");
    for record in &history.records {
        let _ = writeln!(
            out,
            "{:>6} {:>8} {:>12} {:>12}",
            record.time,
            fmt_opt(record.atm_iv),
            fmt_opt(record.call_wall_iv),
            fmt_opt(record.put_wall_iv),
        );
    }

    out
}
