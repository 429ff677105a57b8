//! Template Document Renderer - Deterministic document generation.
//!
//! Selects a document category from the detected intent and fills a
//! fixed formal structure (To / From / Subject / Statement of Facts /
//! Prayer) with the locked facts, followed by guidance on where to
//! file the document. Templates exist in English only, so both bundle
//! variants carry the same text; a translating renderer can replace
//! this adapter behind the same port.

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::intake::NOT_AVAILABLE;
use crate::ports::{DocumentBundle, DocumentRenderer, RenderError, RenderRequest};

/// Template-driven renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateDocumentRenderer;

impl TemplateDocumentRenderer {
    pub fn new() -> Self {
        Self
    }
}

/// Maps an intent classification to a document category.
fn document_type(intent: &str) -> &'static str {
    let intent = intent.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| intent.contains(w));

    if has(&["consumer", "product", "service", "refund"]) {
        "consumer_complaint"
    } else if has(&["police", "theft", "assault", "criminal", "fraud"]) {
        "police_complaint"
    } else if has(&["rti", "information"]) {
        "rti_application"
    } else if has(&["family", "divorce", "custody", "maintenance"]) {
        "family_petition"
    } else if has(&["property", "land", "tenant", "rent", "deposit", "landlord"]) {
        "legal_notice"
    } else {
        "general_petition"
    }
}

fn title(document_type: &str) -> &'static str {
    match document_type {
        "consumer_complaint" => "CONSUMER COMPLAINT",
        "police_complaint" => "POLICE COMPLAINT",
        "rti_application" => "APPLICATION UNDER THE RIGHT TO INFORMATION ACT",
        "family_petition" => "FAMILY PETITION",
        "legal_notice" => "LEGAL NOTICE",
        _ => "PETITION",
    }
}

fn prayer(document_type: &str) -> &'static str {
    match document_type {
        "consumer_complaint" => {
            "The complainant prays for replacement or refund of the deficient \
goods or services, along with suitable compensation for the hardship caused."
        }
        "police_complaint" => {
            "The complainant prays that the above matter be registered and \
investigated, and that appropriate action be taken against the persons responsible."
        }
        "rti_application" => {
            "The applicant requests that the information described above be \
furnished within the period prescribed under the Act."
        }
        "family_petition" => {
            "The petitioner prays that this Hon'ble authority grant the relief \
described above and any other relief deemed fit."
        }
        "legal_notice" => {
            "You are hereby called upon to remedy the above within 15 days of \
receipt of this notice, failing which appropriate legal proceedings will be \
initiated at your risk as to costs."
        }
        _ => {
            "The petitioner prays for appropriate relief in the matter described \
above and any other relief deemed fit."
        }
    }
}

fn filing_guidance(document_type: &str) -> &'static str {
    match document_type {
        "consumer_complaint" => {
            "Where to file: the District Consumer Disputes Redressal Commission \
for your district. Attach purchase receipts and any correspondence."
        }
        "police_complaint" => {
            "Where to file: the police station with jurisdiction over the place \
of the incident. Keep a stamped copy of the complaint as acknowledgment."
        }
        "rti_application" => {
            "Where to file: the Public Information Officer of the department \
concerned, with the prescribed application fee."
        }
        "family_petition" => {
            "Where to file: the Family Court with jurisdiction over your place \
of residence. Consider consulting a lawyer before filing."
        }
        "legal_notice" => {
            "How to serve: send by registered post with acknowledgment due to \
the opposing party's address, and retain the postal receipt."
        }
        _ => {
            "Where to file: the court or authority with jurisdiction over the \
subject matter. Consider consulting a lawyer to confirm the correct forum."
        }
    }
}

fn display_key(key: &str) -> String {
    key.replace('_', " ")
}

#[async_trait]
impl DocumentRenderer for TemplateDocumentRenderer {
    async fn render(&self, request: RenderRequest<'_>) -> Result<DocumentBundle, RenderError> {
        let mut facts: Vec<(&String, &String)> = request
            .facts
            .iter()
            .filter(|(_, v)| v.as_str() != NOT_AVAILABLE && !v.trim().is_empty())
            .collect();
        if facts.is_empty() {
            return Err(RenderError::Failed("no usable facts to render".to_string()));
        }
        facts.sort();

        let doc_type = document_type(request.intent);
        let from = request
            .facts
            .get("full_name")
            .map(String::as_str)
            .unwrap_or("The Complainant");
        let to = request
            .facts
            .get("opposing_party")
            .map(String::as_str)
            .unwrap_or("The Concerned Party");
        let subject = request
            .facts
            .get("incident_description")
            .map(String::as_str)
            .unwrap_or("the matter described below");

        let mut body = String::new();
        body.push_str(&format!("{}\n\n", title(doc_type)));
        body.push_str(&format!("Date: {}\n", Utc::now().format("%d %B %Y")));
        body.push_str(&format!("To: {to}\n"));
        body.push_str(&format!("From: {from}\n"));
        body.push_str(&format!("Subject: Regarding {subject}\n\n"));
        body.push_str("STATEMENT OF FACTS\n");
        for (key, value) in &facts {
            body.push_str(&format!("- {}: {}\n", display_key(key), value));
        }
        body.push_str(&format!("\nPRAYER\n{}\n", prayer(doc_type)));
        body.push_str(&format!("\n---\n{}\n", filing_guidance(doc_type)));

        Ok(DocumentBundle {
            content_user_language: body.clone(),
            content_english: body,
            document_type: doc_type.to_string(),
            readiness_score: request.readiness_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn facts(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn request<'a>(intent: &'a str, facts: &'a HashMap<String, String>) -> RenderRequest<'a> {
        RenderRequest {
            intent,
            facts,
            user_language: "en",
            readiness_score: 90,
        }
    }

    mod type_selection {
        use super::*;

        #[test]
        fn landlord_disputes_become_legal_notices() {
            assert_eq!(document_type("property_dispute"), "legal_notice");
            assert_eq!(document_type("landlord_deposit_issue"), "legal_notice");
        }

        #[test]
        fn consumer_issues_become_consumer_complaints() {
            assert_eq!(document_type("consumer_complaint"), "consumer_complaint");
            assert_eq!(document_type("defective product refund"), "consumer_complaint");
        }

        #[test]
        fn criminal_matters_become_police_complaints() {
            assert_eq!(document_type("theft_report"), "police_complaint");
        }

        #[test]
        fn unknown_intents_fall_back_to_general_petition() {
            assert_eq!(document_type("something_else_entirely"), "general_petition");
        }
    }

    mod rendering {
        use super::*;

        #[tokio::test]
        async fn renders_parties_facts_and_guidance() {
            let facts = facts(&[
                ("full_name", "Kumar Swamy"),
                ("opposing_party", "Suresh Babu"),
                ("amount_involved", "50,000 rupees"),
            ]);
            let bundle = TemplateDocumentRenderer::new()
                .render(request("property_dispute", &facts))
                .await
                .unwrap();

            assert_eq!(bundle.document_type, "legal_notice");
            assert_eq!(bundle.readiness_score, 90);
            assert!(bundle.content_english.contains("LEGAL NOTICE"));
            assert!(bundle.content_english.contains("From: Kumar Swamy"));
            assert!(bundle.content_english.contains("To: Suresh Babu"));
            assert!(bundle.content_english.contains("amount involved: 50,000 rupees"));
            assert!(bundle.content_english.contains("registered post"));
        }

        #[tokio::test]
        async fn unavailable_facts_are_omitted() {
            let facts = facts(&[
                ("full_name", "Kumar Swamy"),
                ("incident_date", NOT_AVAILABLE),
            ]);
            let bundle = TemplateDocumentRenderer::new()
                .render(request("property_dispute", &facts))
                .await
                .unwrap();

            assert!(!bundle.content_english.contains(NOT_AVAILABLE));
        }

        #[tokio::test]
        async fn no_usable_facts_is_an_error() {
            let facts = facts(&[("incident_date", NOT_AVAILABLE)]);
            let result = TemplateDocumentRenderer::new()
                .render(request("property_dispute", &facts))
                .await;

            assert!(matches!(result, Err(RenderError::Failed(_))));
        }

        #[tokio::test]
        async fn missing_parties_use_neutral_placeholders() {
            let facts = facts(&[("incident_description", "a broken agreement")]);
            let bundle = TemplateDocumentRenderer::new()
                .render(request("", &facts))
                .await
                .unwrap();

            assert!(bundle.content_english.contains("From: The Complainant"));
            assert!(bundle.content_english.contains("To: The Concerned Party"));
            assert_eq!(bundle.document_type, "general_petition");
        }
    }
}
