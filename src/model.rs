use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShoppingCategory {
    Groceries,
    Electronics,
    Fashion,
    HomeDecor,
    HealthBeauty,
    Stationery,
    Other,
    Custom(String),
}

impl ShoppingCategory {
    pub const ALL: [ShoppingCategory; 7] = [
        ShoppingCategory::Groceries,
        ShoppingCategory::Electronics,
        ShoppingCategory::Fashion,
        ShoppingCategory::HomeDecor,
        ShoppingCategory::HealthBeauty,
        ShoppingCategory::Stationery,
        ShoppingCategory::Other,
    ];

    pub fn label(&self) -> &str {
        match self {
            ShoppingCategory::Groceries => "Groceries",
            ShoppingCategory::Electronics => "Electronics",
            ShoppingCategory::Fashion => "Fashion & Apparel",
            ShoppingCategory::HomeDecor => "Home Decor",
            ShoppingCategory::HealthBeauty => "Health & Beauty",
            ShoppingCategory::Stationery => "Stationery & Office",
            ShoppingCategory::Other => "Other",
            ShoppingCategory::Custom(label) => label,
        }
    }

    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .iter()
            .find(|c| c.label() == label)
            .cloned()
            .unwrap_or_else(|| ShoppingCategory::Custom(label.to_string()))
    }
}

impl fmt::Display for ShoppingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Stored as the plain label so history written by older builds still loads.
impl Serialize for ShoppingCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ShoppingCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(ShoppingCategory::from_label(&label))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub budget: f64,
    pub category: ShoppingCategory,
    pub bill_details: String,
}

impl PredictionRequest {
    pub fn new(budget: f64, category: ShoppingCategory, bill_details: impl Into<String>) -> Self {
        Self {
            budget,
            category,
            bill_details: bill_details.into(),
        }
    }

    /// Budget must be positive and the bill text non-blank.
    pub fn is_submittable(&self) -> bool {
        self.budget > 0.0 && !self.bill_details.trim().is_empty()
    }
}

impl Default for PredictionRequest {
    fn default() -> Self {
        Self::new(1000.0, ShoppingCategory::Groceries, "")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    pub name: String,
    pub quantity: String,
    pub estimated_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Under,
    Over,
    Exact,
}

impl BudgetStatus {
    pub fn classify(total: f64, budget: f64) -> Self {
        if total < budget {
            BudgetStatus::Under
        } else if total > budget {
            BudgetStatus::Over
        } else {
            BudgetStatus::Exact
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub estimated_total: f64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub category_analysis: String,
    pub items: Vec<ShoppingItem>,
    #[serde(default)]
    pub savings_tips: Vec<String>,
    pub friendly_note: String,
    pub budget_status: BudgetStatus,
}

impl PredictionResult {
    pub fn is_over_budget(&self, budget: f64) -> bool {
        self.estimated_total > budget
    }

    // Absolute distance between the estimate and the budget
    pub fn budget_gap(&self, budget: f64) -> f64 {
        (self.estimated_total - budget).abs()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: i64,
    pub form_data: PredictionRequest,
    pub result: PredictionResult,
}

impl HistoryEntry {
    pub fn new(form_data: PredictionRequest, result: PredictionResult) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            form_data,
            result,
        }
    }

    pub fn matches(&self, needle_lower: &str) -> bool {
        self.form_data.bill_details.to_lowercase().contains(needle_lower)
            || self.form_data.category.label().to_lowercase().contains(needle_lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_is_three_way() {
        assert_eq!(BudgetStatus::classify(850.0, 1000.0), BudgetStatus::Under);
        assert_eq!(BudgetStatus::classify(1200.5, 1000.0), BudgetStatus::Over);
        assert_eq!(BudgetStatus::classify(1000.0, 1000.0), BudgetStatus::Exact);
    }

    #[test]
    fn category_labels_round_trip_including_custom() {
        let json = serde_json::to_string(&ShoppingCategory::Fashion).unwrap();
        assert_eq!(json, "\"Fashion & Apparel\"");

        let custom: ShoppingCategory = serde_json::from_str("\"Garden Tools\"").unwrap();
        assert_eq!(custom, ShoppingCategory::Custom("Garden Tools".into()));
        assert_eq!(custom.label(), "Garden Tools");

        let known: ShoppingCategory = serde_json::from_str("\"Home Decor\"").unwrap();
        assert_eq!(known, ShoppingCategory::HomeDecor);
    }

    #[test]
    fn request_uses_camel_case_keys() {
        let req = PredictionRequest::new(1000.0, ShoppingCategory::Groceries, "2kg rice");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["billDetails"], "2kg rice");
        assert_eq!(value["category"], "Groceries");
        assert_eq!(value["budget"], 1000.0);
    }

    #[test]
    fn blank_details_or_non_positive_budget_not_submittable() {
        assert!(!PredictionRequest::new(500.0, ShoppingCategory::Other, "   \n").is_submittable());
        assert!(!PredictionRequest::new(0.0, ShoppingCategory::Other, "pens").is_submittable());
        assert!(PredictionRequest::new(10.5, ShoppingCategory::Other, "pens").is_submittable());
    }

    #[test]
    fn entry_ids_are_unique_and_ordered() {
        let result = PredictionResult {
            estimated_total: 1.0,
            currency: "INR".into(),
            confidence: None,
            category_analysis: String::new(),
            items: vec![],
            savings_tips: vec![],
            friendly_note: String::new(),
            budget_status: BudgetStatus::Under,
        };
        let a = HistoryEntry::new(PredictionRequest::default(), result.clone());
        let b = HistoryEntry::new(PredictionRequest::default(), result);
        assert_ne!(a.id, b.id);
        assert!(a.id < b.id);
        assert!(a.timestamp <= b.timestamp);
    }
}
