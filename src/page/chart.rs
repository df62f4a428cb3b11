// Chart collaborator surface.
// The engine describes a line chart; the embedder's chart library draws it.

use crate::page::dom::NodeHandle;

/// One named series of y-values, parallel to the chart's labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSeries {
    pub label: String,
    pub data: Vec<u64>,
}

/// Line chart description: shared x-axis labels plus one or more series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChart {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

/// Chart library supplied by the embedder, treated as opaque.
pub trait ChartRenderer: Send + Sync {
    fn render_line_chart(&self, target: NodeHandle, chart: &LineChart);
}
