//! Compact evidence digest appended to every action log message.
//!
//! The digest makes each audit row self-explanatory without a join back to
//! the originating recommendation, e.g.
//! `spend=$42 · leads=0 · cpl=$100 · rule=zero_leads · sev=high · conf=0.90`.

use serde_json::Value;

/// Separator between digest fields.
pub const SEPARATOR: &str = " · ";

/// How an evidence metric is rendered.
#[derive(Clone, Copy)]
enum Unit {
    Currency,
    Percent,
    Plain,
}

/// Known metrics, in rendering order.
const METRICS: &[(&str, Unit)] = &[
    ("spend", Unit::Currency),
    ("leads", Unit::Plain),
    ("cpl", Unit::Currency),
    ("ctr", Unit::Percent),
    ("cpm", Unit::Currency),
    ("frequency", Unit::Plain),
    ("impressions", Unit::Plain),
    ("clicks", Unit::Plain),
];

/// Build the digest for one recommendation.
///
/// Only metrics present in `evidence` are rendered; if none are present the
/// metric segment is omitted entirely and only the rule/severity/confidence
/// segment remains. Output is deterministic for identical input.
pub fn build_evidence_message(
    evidence: &Value,
    rule_key: &str,
    severity: &str,
    confidence: Option<f64>,
) -> String {
    let mut parts: Vec<String> = METRICS
        .iter()
        .filter_map(|(key, unit)| {
            let value = evidence.get(*key)?;
            let rendered = render_value(value, *unit)?;
            Some(format!("{key}={rendered}"))
        })
        .collect();

    if !rule_key.is_empty() {
        parts.push(format!("rule={rule_key}"));
    }
    if !severity.is_empty() {
        parts.push(format!("sev={severity}"));
    }
    if let Some(conf) = confidence {
        parts.push(format!("conf={}", format_number(conf)));
    }

    parts.join(SEPARATOR)
}

/// Append a digest to a human-readable outcome message.
pub fn with_evidence(message: &str, digest: &str) -> String {
    if digest.is_empty() {
        message.to_string()
    } else {
        format!("{message} | {digest}")
    }
}

fn render_value(value: &Value, unit: Unit) -> Option<String> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    let formatted = format_number(number);
    Some(match unit {
        Unit::Currency => format!("${formatted}"),
        Unit::Percent => format!("{formatted}%"),
        Unit::Plain => formatted,
    })
}

/// Whole numbers without decimals, everything else with two.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n:.2}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
