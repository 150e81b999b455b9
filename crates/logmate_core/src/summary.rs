use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Headline figures of an analysis result, as shown when a task is selected.
///
/// Every field defaults when absent so partial results still summarize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResultSummary {
    pub line_count: u64,
    pub total_bytes: u64,
    pub methods_count: BTreeMap<String, u64>,
    pub status_count: BTreeMap<String, u64>,
    pub top_paths: Vec<(String, u64)>,
    #[serde(rename = "topIPs")]
    pub top_ips: Vec<(String, u64)>,
    pub top_user_agents: Vec<(String, u64)>,
}

pub fn summarize_result(result: &Value) -> Result<ResultSummary, serde_json::Error> {
    ResultSummary::deserialize(result)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_service_result_shape() {
        let result = json!({
            "lineCount": 1200,
            "totalBytes": 98304,
            "methodsCount": {"GET": 1000, "POST": 200},
            "statusCount": {"200": 1150, "404": 50},
            "topPaths": [["/index.html", 700], ["/api", 300]],
            "topIPs": [["10.0.0.1", 900]],
            "topUserAgents": [["curl/8.0", 12]]
        });

        let summary = summarize_result(&result).unwrap();
        assert_eq!(summary.line_count, 1200);
        assert_eq!(summary.total_bytes, 98304);
        assert_eq!(summary.methods_count.get("POST"), Some(&200));
        assert_eq!(summary.status_count.get("404"), Some(&50));
        assert_eq!(summary.top_paths[0], ("/index.html".to_string(), 700));
        assert_eq!(summary.top_ips, vec![("10.0.0.1".to_string(), 900)]);
        assert_eq!(summary.top_user_agents.len(), 1);
    }

    #[test]
    fn missing_fields_default() {
        let summary = summarize_result(&json!({"lineCount": 3})).unwrap();
        assert_eq!(
            summary,
            ResultSummary {
                line_count: 3,
                ..ResultSummary::default()
            }
        );
    }

    #[test]
    fn wrong_shape_is_an_error() {
        assert!(summarize_result(&json!({"topPaths": "none"})).is_err());
    }
}
