//! Prometheus text exposition format (version 0.0.4).

use crate::metrics::catalog::MetricDesc;
use crate::metrics::sample::MetricSample;
use std::fmt::Write;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Renders samples as gauge families, in the order each metric first appears.
pub fn render(samples: &[MetricSample]) -> String {
    let mut families: Vec<(&'static MetricDesc, Vec<&MetricSample>)> = Vec::new();
    for sample in samples {
        match families.iter_mut().find(|(desc, _)| desc.name == sample.desc.name) {
            Some((_, members)) => members.push(sample),
            None => families.push((sample.desc, vec![sample])),
        }
    }

    let mut out = String::new();
    for (desc, members) in families {
        let _ = writeln!(out, "# HELP {} {}", desc.name, escape_help(desc.help));
        let _ = writeln!(out, "# TYPE {} gauge", desc.name);
        for sample in members {
            out.push_str(desc.name);
            if !sample.labels.is_empty() {
                out.push('{');
                for (i, (key, value)) in sample.labels.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{}=\"{}\"", key, escape_label_value(value));
                }
                out.push('}');
            }
            out.push(' ');
            out.push_str(&format_value(sample.value));
            out.push('\n');
        }
    }
    out
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
