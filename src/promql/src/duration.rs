//! Prometheus duration literals such as `5m`, `1h30m` or `90d`

use std::time::Duration;

use promql_parser::util::display_duration;

/// Render milliseconds as a duration literal, `0s` for zero.
///
/// The unit breakdown is the one promql-parser prints, so years and weeks only
/// appear when they divide the duration evenly.
pub fn format_ms(ms: i64) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let duration = Duration::from_millis(ms.unsigned_abs());
    format!("{sign}{}", display_duration(&duration))
}
