//! Hang-Risk Estimate
//!
//! Bounds the expected rendering cost of a figure before the engine sees it.
//! Each trace consumes `estimated points / point budget` of a shared budget
//! of 1; crossing it (or carrying too many traces) marks the figure as likely
//! to hang the exporter.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::constants::MAX_TRACES;
use crate::validation::coerce_number;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HangRiskEstimate {
    pub trace_count: usize,
    /// Budget consumed by the traces scored so far.
    pub budget_used: f64,
    /// Index of the trace whose score pushed the sum past 1.
    pub exceeded_at: Option<usize>,
    pub too_many_traces: bool,
}

impl HangRiskEstimate {
    pub fn is_likely_to_hang(&self) -> bool {
        self.too_many_traces || self.exceeded_at.is_some()
    }
}

/// Score `data` in declaration order, stopping at the first trace that
/// crosses the budget.
pub fn estimate(data: &[Value]) -> HangRiskEstimate {
    let mut report = HangRiskEstimate {
        trace_count: data.len(),
        budget_used: 0.0,
        exceeded_at: None,
        too_many_traces: data.len() > MAX_TRACES,
    };
    if report.too_many_traces {
        return report;
    }

    let empty = Map::new();
    for (i, trace) in data.iter().enumerate() {
        let trace = trace.as_object().unwrap_or(&empty);
        report.budget_used += estimate_data_length(trace) as f64 / max_points_per_trace(trace);
        if report.budget_used > 1.0 {
            report.exceeded_at = Some(i);
            break;
        }
    }
    report
}

pub fn will_figure_hang(data: &[Value]) -> bool {
    estimate(data).is_likely_to_hang()
}

/// Longest sequence-valued field, used as a proxy for the plotted points.
/// 2-D fields count every element across their rows.
fn find_max_array_length(container: &Map<String, Value>) -> usize {
    container
        .values()
        .filter_map(Value::as_array)
        .map(|arr| match arr.first() {
            Some(Value::Array(_)) => arr
                .iter()
                .map(|row| row.as_array().map_or(0, Vec::len))
                .sum::<usize>(),
            _ => arr.len(),
        })
        .max()
        .unwrap_or(0)
}

pub fn estimate_data_length(trace: &Map<String, Value>) -> usize {
    let top_level = find_max_array_length(trace);

    // parcoords / splom
    let dim_level = trace
        .get("dimensions")
        .and_then(Value::as_array)
        .map_or(0, |dims| {
            dims.iter()
                .filter_map(Value::as_object)
                .map(find_max_array_length)
                .sum::<usize>()
        });

    // table
    let cell_level = trace
        .get("cells")
        .and_then(Value::as_object)
        .map_or(0, find_max_array_length);

    top_level.max(dim_level).max(cell_level)
}

pub fn max_points_per_trace(trace: &Map<String, Value>) -> f64 {
    let trace_type = trace
        .get("type")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .unwrap_or("scatter");

    match trace_type {
        "scattergl" | "splom" | "pointcloud" | "table" => 1e7,
        "scatterpolargl" | "heatmap" | "heatmapgl" => 1e6,
        "scatter3d" | "surface" => 5e5,
        "mesh3d" => {
            let concave = trace
                .get("alphahull")
                .is_some_and(|a| coerce_number(a) >= 0.0);
            if concave {
                1000.0
            } else {
                5e5
            }
        }
        "parcoords" | "scattermapbox" => 5e5,
        "histogram" | "histogram2d" | "histogram2dcontour" => 1e6,
        "box" => show_all_points(trace, "boxpoints"),
        "violin" => show_all_points(trace, "points"),
        _ => 5e4,
    }
}

fn show_all_points(trace: &Map<String, Value>, key: &str) -> f64 {
    if trace.get(key).and_then(Value::as_str) == Some("all") {
        5e4
    } else {
        1e6
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scatter(points: usize) -> Value {
        json!({"type": "scatter", "x": vec![0; points], "y": vec![1; points]})
    }

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_scatter_budget() {
        assert!(!will_figure_hang(&[scatter(40_000)]));
        assert!(will_figure_hang(&[scatter(60_000)]));
    }

    #[test]
    fn test_trace_cap() {
        let data: Vec<Value> = (0..201).map(|_| json!({})).collect();
        let report = estimate(&data);
        assert!(report.too_many_traces);
        assert!(report.is_likely_to_hang());

        let data: Vec<Value> = (0..200).map(|_| json!({})).collect();
        assert!(!will_figure_hang(&data));
    }

    #[test]
    fn test_budget_accumulates_across_traces() {
        // 3 x 20k scatter points = 1.2 of the budget; the third trace tips it
        let data = vec![scatter(20_000), scatter(20_000), scatter(20_000)];
        let report = estimate(&data);
        assert_eq!(report.exceeded_at, Some(2));
    }

    #[test]
    fn test_two_dimensional_fields_sum_rows() {
        let trace = obj(json!({"type": "heatmap", "z": [[1, 2, 3], [4, 5, 6]], "x": [1, 2]}));
        assert_eq!(estimate_data_length(&trace), 6);
    }

    #[test]
    fn test_dimensions_and_cells() {
        let parcoords = obj(json!({
            "type": "parcoords",
            "dimensions": [{"values": [1, 2, 3]}, {"values": [4, 5]}]
        }));
        assert_eq!(estimate_data_length(&parcoords), 5);

        let table = obj(json!({
            "type": "table",
            "cells": {"values": [[1, 2], [3, 4], [5, 6]]}
        }));
        assert_eq!(estimate_data_length(&table), 6);
        assert_eq!(estimate_data_length(&obj(json!({"dimensions": []}))), 0);
    }

    #[test]
    fn test_budget_table() {
        assert_eq!(max_points_per_trace(&obj(json!({}))), 5e4);
        assert_eq!(max_points_per_trace(&obj(json!({"type": "scattergl"}))), 1e7);
        assert_eq!(max_points_per_trace(&obj(json!({"type": "mesh3d"}))), 5e5);
        assert_eq!(
            max_points_per_trace(&obj(json!({"type": "mesh3d", "alphahull": 0}))),
            1000.0
        );
        assert_eq!(
            max_points_per_trace(&obj(json!({"type": "mesh3d", "alphahull": -1}))),
            5e5
        );
        assert_eq!(
            max_points_per_trace(&obj(json!({"type": "box", "boxpoints": "all"}))),
            5e4
        );
        assert_eq!(max_points_per_trace(&obj(json!({"type": "box"}))), 1e6);
        assert_eq!(
            max_points_per_trace(&obj(json!({"type": "violin", "points": "all"}))),
            5e4
        );
    }

    #[test]
    fn test_non_object_traces_score_zero() {
        let data = vec![json!(null), json!(42), json!("trace")];
        let report = estimate(&data);
        assert_eq!(report.budget_used, 0.0);
        assert!(!report.is_likely_to_hang());
    }
}
