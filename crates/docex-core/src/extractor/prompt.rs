//! Extraction prompt construction.

use crate::models::DocType;

/// System role sent with every extraction request.
pub const SYSTEM_PROMPT: &str = "You are a strict JSON information extractor.";

/// Names requested when the caller does not supply any.
const DEFAULT_TARGET_NAMES: &[&str] = &["InvoiceNumber", "Date", "TotalAmount"];

const EXAMPLE_OUTPUT: &str = r#"{
  "fields": [
    {"name":"InvoiceNumber","value":"12345","confidence":0.95,"source":{"page":1,"bbox":null}},
    {"name":"Date","value":"01/02/2024","confidence":0.93,"source":{"page":1,"bbox":null}},
    {"name":"TotalAmount","value":"€500","confidence":0.92,"source":{"page":1,"bbox":null}}
  ]
}"#;

/// Build the instruction block for a document type and optional field list.
pub fn build_instructions(doc_type: DocType, expected_fields: Option<&[String]>) -> String {
    let expected_fields = expected_fields.filter(|f| !f.is_empty());

    let expect = match expected_fields {
        Some(fields) => format!(
            "If provided, only extract these fields (map synonyms, keep names EXACT): {}",
            fields.join(", ")
        ),
        None => "Extract the most relevant fields for this document type.".to_string(),
    };

    let target_names: Vec<&str> = match expected_fields {
        Some(fields) => fields.iter().map(String::as_str).collect(),
        None => DEFAULT_TARGET_NAMES.to_vec(),
    };
    let target_names = serde_json::to_string(&target_names).unwrap_or_default();

    format!(
        "You are a precise information extraction engine for {doc_type} documents.\n\
         {expect}\n\
         \n\
         Rules:\n\
         - Output ONLY valid JSON with this shape: {{\"fields\":[{{\"name\": \"...\",\"value\": \"...\", \"confidence\": 0-1, \"source\": {{\"page\": 1, \"bbox\": null}}}}]}}\n\
         - Use exact field names: {target_names}\n\
         - If a field is missing, include it with value=null and confidence<=0.3.\n\
         - Do not include any text outside JSON.\n\
         \n\
         Example output:\n\
         {EXAMPLE_OUTPUT}"
    )
}

/// Append the (truncated) document text to the instructions.
pub fn build_user_message(instructions: &str, plain_text: &str, max_chars: usize) -> String {
    format!(
        "{}\n\nDocument text:\n\n{}",
        instructions,
        truncate_chars(plain_text, max_chars)
    )
}

/// Prefix of at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_instructions() {
        let prompt = build_instructions(DocType::MedicalBill, None);
        assert!(prompt.starts_with("You are a precise information extraction engine for medical_bill documents."));
        assert!(prompt.contains("Extract the most relevant fields for this document type."));
        assert!(prompt.contains(r#"Use exact field names: ["InvoiceNumber","Date","TotalAmount"]"#));
        assert!(prompt.contains(r#""fields":[{"name": "...""#));
    }

    #[test]
    fn test_expected_fields_instructions() {
        let expected = vec!["PatientName".to_string(), "Total".to_string()];
        let prompt = build_instructions(DocType::Invoice, Some(expected.as_slice()));
        assert!(prompt.contains("keep names EXACT): PatientName, Total"));
        assert!(prompt.contains(r#"Use exact field names: ["PatientName","Total"]"#));
    }

    #[test]
    fn test_empty_expected_fields_fall_back() {
        let prompt = build_instructions(DocType::Invoice, Some(&[][..]));
        assert!(prompt.contains("Extract the most relevant fields"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 30), "abc");
        assert_eq!(truncate_chars("€€€€", 2), "€€");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_user_message_truncates_document() {
        let text = "x".repeat(30_010);
        let message = build_user_message("INSTR", &text, 30_000);
        assert!(message.starts_with("INSTR\n\nDocument text:\n\n"));
        assert_eq!(message.len(), "INSTR\n\nDocument text:\n\n".len() + 30_000);
    }

    #[test]
    fn test_user_message_with_empty_document() {
        assert_eq!(build_user_message("I", "", 10), "I\n\nDocument text:\n\n");
    }
}
