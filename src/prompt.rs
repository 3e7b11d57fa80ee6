use crate::model::PredictionRequest;
use serde_json::{json, Value};

pub fn build_prompt(request: &PredictionRequest) -> String {
    format!(
        "As a friendly and helpful shopping assistant, predict the total cost and itemized breakdown \
for the following shopping request in India (Currency: Rupees ₹).

Budget Provided: ₹{budget}
Shopping Category: {category}
User's Shopping List/Details: \"{details}\"

Rules:
1. Estimate realistic market prices in India for each item mentioned.
2. Be very friendly and respectful in your \"friendlyNote\".
3. Calculate the \"estimatedTotal\" as the sum of all item prices.
4. \"budgetStatus\" should be 'under' if estimatedTotal < budget, 'over' if estimatedTotal > budget, and 'exact' otherwise.
",
        budget = request.budget,
        category = request.category,
        details = request.bill_details,
    )
}

/// Structured-output schema in the service's OpenAPI subset.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "estimatedTotal": { "type": "NUMBER" },
            "currency": { "type": "STRING" },
            "confidence": { "type": "NUMBER", "description": "Confidence score 0-1" },
            "categoryAnalysis": { "type": "STRING" },
            "items": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "quantity": { "type": "STRING" },
                        "estimatedPrice": { "type": "NUMBER" }
                    },
                    "required": ["name", "quantity", "estimatedPrice"]
                }
            },
            "savingsTips": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            },
            "friendlyNote": { "type": "STRING" },
            "budgetStatus": { "type": "STRING", "enum": ["under", "over", "exact"] }
        },
        "required": ["estimatedTotal", "currency", "items", "friendlyNote", "budgetStatus"]
    })
}
