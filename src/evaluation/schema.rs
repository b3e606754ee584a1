//! Output schemas declared to the completion provider. Compliance is
//! requested, never re-validated locally.

use serde_json::{json, Value};

pub const PERFORMANCE_METRICS: [&str; 6] = [
    "overallScore",
    "communicationSkills",
    "technicalCompetence",
    "customerService",
    "teamwork",
    "problemSolving",
];

pub const CUSTOMER_MOODS: [&str; 5] = ["happy", "satisfied", "neutral", "frustrated", "angry"];

fn string_list() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

pub fn employee_evaluation_schema() -> Value {
    let metrics: serde_json::Map<String, Value> = PERFORMANCE_METRICS
        .iter()
        .map(|name| (name.to_string(), json!({ "type": "integer" })))
        .collect();

    json!({
        "type": "object",
        "properties": {
            "overallSummary": { "type": "string" },
            "keyStrengths": string_list(),
            "areasForImprovement": string_list(),
            "performanceMetrics": {
                "type": "object",
                "properties": metrics,
                "required": PERFORMANCE_METRICS,
            },
            "recommendations": string_list(),
            "feedbackAnalysis": { "type": "string" },
            "careerDevelopment": string_list(),
        },
        "required": [
            "overallSummary",
            "keyStrengths",
            "areasForImprovement",
            "performanceMetrics",
            "recommendations",
            "feedbackAnalysis",
            "careerDevelopment",
        ],
    })
}

pub fn customer_analysis_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "customerName": { "type": "string" },
            "customerMood": { "type": "string", "enum": CUSTOMER_MOODS },
            "customerBehavior": {
                "type": "object",
                "properties": {
                    "score": { "type": "integer" },
                    "description": { "type": "string" },
                },
                "required": ["score", "description"],
            },
            "keyDiscussionPoints": string_list(),
            "customerAssessmentQuestions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "question": { "type": "string" },
                        "answer": { "type": "string" },
                        "status": { "type": "string" },
                    },
                    "required": ["question", "answer", "status"],
                },
            },
            "customerRecommendations": string_list(),
            "customerOverallScore": { "type": "integer" },
        },
        "required": [
            "customerName",
            "customerMood",
            "customerBehavior",
            "keyDiscussionPoints",
            "customerAssessmentQuestions",
            "customerRecommendations",
            "customerOverallScore",
        ],
    })
}

/// Bilingual single-call analysis.
pub fn call_analysis_schema() -> Value {
    let scored = json!({
        "type": "object",
        "properties": {
            "score": { "type": "integer" },
            "assessment": { "type": "string" },
        },
        "required": ["score", "assessment"],
    });

    json!({
        "type": "object",
        "properties": {
            "customerCooperation": scored.clone(),
            "engagement": scored,
            "issueResolved": {
                "type": "object",
                "properties": {
                    "resolved": { "type": "boolean" },
                    "details": { "type": "string" },
                },
                "required": ["resolved", "details"],
            },
            "keyPoints": string_list(),
            "assessmentQuestions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "question": { "type": "string" },
                        "answer": { "type": "string" },
                        "status": { "type": "string" },
                        "details": { "type": "string" },
                    },
                    "required": ["question", "answer", "status"],
                },
            },
            "summary": { "type": "string" },
            "recommendations": string_list(),
            "overallScore": { "type": "integer" },
        },
        "required": [
            "customerCooperation",
            "engagement",
            "issueResolved",
            "keyPoints",
            "assessmentQuestions",
            "summary",
            "recommendations",
            "overallScore",
        ],
    })
}
