use crate::error::PredictionError;
use crate::gemini::CompletionService;
use crate::model::{BudgetStatus, PredictionRequest, PredictionResult};
use crate::prompt::{build_prompt, response_schema};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;

pub type PredictionOutcome = Result<PredictionResult, PredictionError>;

/// Stateless between calls; clones share the same service.
#[derive(Clone)]
pub struct Predictor {
    service: Arc<dyn CompletionService>,
}

impl Predictor {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    pub fn predict(&self, request: &PredictionRequest) -> PredictionOutcome {
        let prompt = build_prompt(request);
        let raw = self.service.generate(&prompt, &response_schema())?;
        parse_prediction(&raw, request.budget)
    }
}

/// All-or-nothing parse of the service payload. The reported budget status is
/// replaced by the one derived from `estimatedTotal` and `budget`.
pub fn parse_prediction(raw: &str, budget: f64) -> PredictionOutcome {
    let mut result: PredictionResult = serde_json::from_str(raw.trim()).map_err(|e| {
        tracing::error!(error = %e, "failed to parse prediction payload");
        PredictionError::MalformedResponse
    })?;

    let derived = BudgetStatus::classify(result.estimated_total, budget);
    if derived != result.budget_status {
        tracing::warn!(
            reported = ?result.budget_status,
            derived = ?derived,
            total = result.estimated_total,
            budget,
            "service budget status disagrees with its total"
        );
        result.budget_status = derived;
    }

    Ok(result)
}

pub struct PendingPrediction {
    request: PredictionRequest,
    rx: Receiver<PredictionOutcome>,
}

impl PendingPrediction {
    pub fn spawn(predictor: &Predictor, request: PredictionRequest) -> Self {
        let (tx, rx) = channel();
        let predictor = predictor.clone();
        let job = request.clone();
        std::thread::spawn(move || {
            let outcome = predictor.predict(&job);
            let _ = tx.send(outcome);
        });
        Self { request, rx }
    }
}

/// Holds at most one in-flight prediction. A second submit while busy is refused.
#[derive(Default)]
pub struct PredictionSlot {
    pending: Option<PendingPrediction>,
}

impl PredictionSlot {
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn submit(&mut self, predictor: &Predictor, request: PredictionRequest) -> bool {
        if self.is_busy() {
            tracing::debug!("prediction already in flight, ignoring submit");
            return false;
        }
        tracing::info!(category = %request.category, budget = request.budget, "prediction requested");
        self.pending = Some(PendingPrediction::spawn(predictor, request));
        true
    }

    /// Non-blocking; returns the finished request and its outcome once.
    pub fn poll(&mut self) -> Option<(PredictionRequest, PredictionOutcome)> {
        let pending = self.pending.as_ref()?;
        let outcome = match pending.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(PredictionError::request(String::new())),
        };
        let pending = self.pending.take()?;
        Some((pending.request, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShoppingCategory;
    use serde_json::Value;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    struct Canned {
        reply: Result<String, PredictionError>,
        prompts: Mutex<Vec<String>>,
    }

    impl Canned {
        fn ok(body: &str) -> Arc<Self> {
            Arc::new(Self { reply: Ok(body.to_string()), prompts: Mutex::new(vec![]) })
        }

        fn err(e: PredictionError) -> Arc<Self> {
            Arc::new(Self { reply: Err(e), prompts: Mutex::new(vec![]) })
        }
    }

    impl CompletionService for Canned {
        fn generate(&self, prompt: &str, schema: &Value) -> Result<String, PredictionError> {
            assert_eq!(schema["type"], "OBJECT");
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }
    }

    // Blocks until released, so tests can hold a request in flight.
    struct Gated {
        gate: Mutex<Receiver<()>>,
        body: String,
    }

    impl CompletionService for Gated {
        fn generate(&self, _prompt: &str, _schema: &Value) -> Result<String, PredictionError> {
            let _ = self.gate.lock().unwrap().recv();
            Ok(self.body.clone())
        }
    }

    fn groceries() -> PredictionRequest {
        PredictionRequest::new(1000.0, ShoppingCategory::Groceries, "2kg rice, 1L oil")
    }

    fn payload(total: f64, status: &str) -> String {
        format!(
            r#"{{"estimatedTotal":{total},"currency":"INR","items":[{{"name":"Rice","quantity":"2kg","estimatedPrice":{total}}}],"friendlyNote":"Happy shopping!","budgetStatus":"{status}"}}"#
        )
    }

    fn wait_for(slot: &mut PredictionSlot) -> (PredictionRequest, PredictionOutcome) {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(done) = slot.poll() {
                return done;
            }
            assert!(Instant::now() < deadline, "prediction never finished");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn returns_consistent_result_unmodified() {
        let body = r#"{
            "estimatedTotal": 850,
            "currency": "INR",
            "confidence": 0.8,
            "categoryAnalysis": "Staples are cheaper in bulk.",
            "items": [
                {"name": "Basmati Rice", "quantity": "2kg", "estimatedPrice": 650},
                {"name": "Sunflower Oil", "quantity": "1L", "estimatedPrice": 200}
            ],
            "savingsTips": ["Buy in bulk"],
            "friendlyNote": "You're well within budget!",
            "budgetStatus": "under"
        }"#;
        let service = Canned::ok(body);
        let predictor = Predictor::new(service.clone());

        let result = predictor.predict(&groceries()).unwrap();
        let expected: PredictionResult = serde_json::from_str(body).unwrap();
        assert_eq!(result, expected);
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.budget_status, BudgetStatus::Under);

        let prompts = service.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("2kg rice, 1L oil"));
    }

    #[test]
    fn status_follows_total_not_service() {
        assert_eq!(
            parse_prediction(&payload(850.0, "over"), 1000.0).unwrap().budget_status,
            BudgetStatus::Under
        );
        assert_eq!(
            parse_prediction(&payload(1200.0, "under"), 1000.0).unwrap().budget_status,
            BudgetStatus::Over
        );
        assert_eq!(
            parse_prediction(&payload(1000.0, "under"), 1000.0).unwrap().budget_status,
            BudgetStatus::Exact
        );
    }

    #[test]
    fn empty_items_and_optional_fields_are_fine() {
        let body = r#"{"estimatedTotal":0,"currency":"INR","items":[],"friendlyNote":"Nothing to buy!","budgetStatus":"under"}"#;
        let result = parse_prediction(body, 100.0).unwrap();
        assert!(result.items.is_empty());
        assert!(result.savings_tips.is_empty());
        assert_eq!(result.confidence, None);
        assert_eq!(result.category_analysis, "");
    }

    #[test]
    fn missing_items_is_malformed_with_fixed_message() {
        let body = r#"{"estimatedTotal":850,"currency":"INR","friendlyNote":"Hi","budgetStatus":"under"}"#;
        let predictor = Predictor::new(Canned::ok(body));

        let err = predictor.predict(&groceries()).unwrap_err();
        assert_eq!(err, PredictionError::MalformedResponse);
        assert_eq!(err.to_string(), crate::error::MALFORMED_RESPONSE_MESSAGE);
        assert!(!err.to_string().contains("missing field"));
    }

    #[test]
    fn item_without_price_or_bad_status_is_malformed() {
        let no_price = r#"{"estimatedTotal":1,"currency":"INR","items":[{"name":"Pen","quantity":"1"}],"friendlyNote":"x","budgetStatus":"under"}"#;
        assert_eq!(parse_prediction(no_price, 10.0), Err(PredictionError::MalformedResponse));

        let bad_status = payload(5.0, "maybe");
        assert_eq!(parse_prediction(&bad_status, 10.0), Err(PredictionError::MalformedResponse));

        assert_eq!(parse_prediction("Sure! Here is", 10.0), Err(PredictionError::MalformedResponse));
    }

    #[test]
    fn transport_failure_propagates_message() {
        let predictor = Predictor::new(Canned::err(PredictionError::request("quota exceeded")));
        assert_eq!(
            predictor.predict(&groceries()),
            Err(PredictionError::RequestFailure("quota exceeded".into()))
        );
    }

    #[test]
    fn slot_refuses_second_submit_while_busy() {
        let (release, gate) = channel();
        let predictor = Predictor::new(Arc::new(Gated {
            gate: Mutex::new(gate),
            body: payload(500.0, "under"),
        }));
        let mut slot = PredictionSlot::default();

        assert!(slot.submit(&predictor, groceries()));
        assert!(slot.is_busy());
        assert!(slot.poll().is_none());

        let other = PredictionRequest::new(50.0, ShoppingCategory::Other, "socks");
        assert!(!slot.submit(&predictor, other));

        release.send(()).unwrap();
        let (request, outcome) = wait_for(&mut slot);
        assert_eq!(request, groceries());
        assert_eq!(outcome.unwrap().estimated_total, 500.0);
        assert!(!slot.is_busy());
        assert!(slot.poll().is_none());

        let (release, gate) = channel();
        let predictor = Predictor::new(Arc::new(Gated {
            gate: Mutex::new(gate),
            body: payload(20.0, "under"),
        }));
        assert!(slot.submit(&predictor, groceries()));
        release.send(()).unwrap();
        assert!(wait_for(&mut slot).1.is_ok());
    }
}
