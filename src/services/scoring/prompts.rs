//! Oracle prompt construction and reply parsing.

use crate::error::CutterError;
use crate::services::scoring::{EvaluationRequest, EvaluationResponse};
use crate::Result;

/// Build the evaluation prompt describing every group and take.
pub fn build_evaluation_prompt(request: &EvaluationRequest) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "A spoken-word recording was cut into takes, and similar takes were grouped as \
         repetitions of the same line. Rate every take and pick the best one per group.\n\n",
    );

    for group in &request.groups {
        prompt.push_str(&format!(
            "Group {} — \"{}\":\n",
            group.group_id, group.text_summary
        ));
        for take in &group.takes {
            let mean = take
                .mean_db
                .map(|db| format!("{db:.1} dB"))
                .unwrap_or_else(|| "n/a".to_string());
            prompt.push_str(&format!(
                "- take segment_index={} | duration={:.3}s | mean_volume={} | quality={} | text: {}\n",
                take.segment_index, take.duration, mean, take.quality, take.text
            ));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "Score audio_quality, content, and emotion from 0 to 10, plus an overall score, \
         for every take. `best_take_index` is the zero-based position of the winning take \
         within the group's list above. `suggested_order` arranges the group ids into the \
         most natural narrative order.\n\
         Response format must be JSON:\n\
         {\n\
           \"evaluations\": [\n\
             {\n\
               \"group_id\": 0,\n\
               \"takes\": [\n\
                 {\"segment_index\": 0, \"audio_quality\": 7, \"content\": 8, \
\"emotion\": 6, \"overall\": 7, \"comment\": \"clear but flat\"}\n\
               ],\n\
               \"best_take_index\": 0,\n\
               \"reason\": \"why this take wins\"\n\
             }\n\
           ],\n\
           \"suggested_order\": [0],\n\
           \"overall_notes\": \"session-level remarks\"\n\
         }",
    );

    prompt
}

/// Extract the JSON substring from an oracle reply.
///
/// Accepts a bare JSON body or one wrapped in a fenced code block; falls
/// back to the outermost brace span.
pub fn extract_json_payload(response: &str) -> &str {
    let fenced = response.find("```").and_then(|open| {
        let after = &response[open + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        body.find("```").map(|close| body[..close].trim())
    });
    if let Some(body) = fenced {
        if !body.is_empty() {
            return body;
        }
    }

    let start = response.find('{').unwrap_or(0);
    let end = response
        .rfind('}')
        .map(|i| i + 1)
        .unwrap_or(response.len());
    response[start..end.max(start)].trim()
}

/// Parse and shape-check an oracle reply.
pub fn parse_evaluation(response: &str) -> Result<EvaluationResponse> {
    let payload = extract_json_payload(response);
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| CutterError::OracleParse {
            message: e.to_string(),
            body: response.to_string(),
        })?;
    serde_json::from_value(value).map_err(|e| CutterError::OracleShape {
        message: e.to_string(),
        body: response.to_string(),
    })
}
