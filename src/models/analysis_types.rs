use serde::{Deserialize, Serialize};

pub const RESULTS_HEADING: &str = "Results";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disease {
    pub name: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AnalysisWire")]
pub struct AnalysisResult {
    pub diseases: Vec<Disease>,
}

// The analysis server answers either with a ranked list or with its single top prediction.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnalysisWire {
    Ranked { diseases: Vec<Disease> },
    Single { prediction: String, confidence: f64 },
}

impl From<AnalysisWire> for AnalysisResult {
    fn from(wire: AnalysisWire) -> Self {
        match wire {
            AnalysisWire::Ranked { diseases } => AnalysisResult { diseases },
            AnalysisWire::Single {
                prediction,
                confidence,
            } => AnalysisResult {
                diseases: vec![Disease {
                    name: prediction,
                    confidence,
                }],
            },
        }
    }
}

/// Body the analysis server sends alongside a non-2xx status.
#[derive(Debug, Deserialize)]
pub struct ServerErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    pub name: String,
    pub confidence_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsView {
    pub heading: String,
    pub entries: Vec<ResultEntry>,
}

impl From<&AnalysisResult> for ResultsView {
    fn from(result: &AnalysisResult) -> Self {
        ResultsView {
            heading: RESULTS_HEADING.to_string(),
            entries: result
                .diseases
                .iter()
                .map(|d| ResultEntry {
                    name: d.name.clone(),
                    confidence_label: format_confidence(d.confidence),
                })
                .collect(),
        }
    }
}

/// Shortest decimal rendering followed by a percent sign: 87 -> "87%", 87.5 -> "87.5%".
///
/// Rust never switches to exponent notation, so magnitudes of 1e21 and above print
/// every digit where a browser would print `1e+21`. Confidences are percentages, so
/// that range does not occur in practice.
pub fn format_confidence(confidence: f64) -> String {
    format!("{}%", confidence)
}
