//! Keyword-based document type routing.

use crate::models::DocType;

const INVOICE_KEYWORDS: &[&str] = &[
    "invoice #",
    "invoice no",
    "subtotal",
    "balance due",
    "gst",
    "igst",
    "cgst",
    "sgst",
];

const MEDICAL_BILL_KEYWORDS: &[&str] = &[
    "discharge",
    "medical bill",
    "hospital",
    "procedure",
    "consultation fee",
];

const PRESCRIPTION_KEYWORDS: &[&str] = &[
    "rx",
    "prescription",
    "dosage",
    "refill",
    "doctor",
    "patient name",
];

/// Keyword sets in priority order. The first set with any hit wins.
const ROUTES: [(DocType, &[&str]); 3] = [
    (DocType::Invoice, INVOICE_KEYWORDS),
    (DocType::MedicalBill, MEDICAL_BILL_KEYWORDS),
    (DocType::Prescription, PRESCRIPTION_KEYWORDS),
];

/// Detect the document type from its plain text.
///
/// Case-insensitive substring search, first match in priority order wins.
/// Falls back to [`DocType::Invoice`] when nothing matches.
pub fn detect_doc_type(text: &str) -> DocType {
    let lowered = text.to_lowercase();

    ROUTES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(doc_type, _)| *doc_type)
        .unwrap_or_default()
}
