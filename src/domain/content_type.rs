//! Classification of decoded symbol content.

use serde::{Deserialize, Serialize};

/// The kind of content carried by a decoded symbol.
///
/// Classification stops at the tag: payment-shaped payloads are flagged as
/// [`ContentType::Payment`] but their field grammar is never parsed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    /// Plain text with no recognized structure.
    Text,
    /// An http or https URL.
    Url,
    /// A vCard contact record.
    VCard,
    /// Wi-Fi network credentials.
    WiFi,
    /// A payment payload (EMV-style or a known payment URL).
    Payment,
    /// A mailto: address.
    Email,
    /// A tel: number.
    Phone,
    /// An SMS recipient.
    Sms,
    /// A geo: coordinate pair.
    Geo,
}

impl ContentType {
    /// Classifies decoded text by its leading structure.
    pub fn classify(content: &str) -> Self {
        let lower = content.to_lowercase();

        if lower.starts_with("http://") || lower.starts_with("https://") {
            if lower.contains("qr.nspk.ru") || lower.contains("pay") {
                ContentType::Payment
            } else {
                ContentType::Url
            }
        } else if lower.starts_with("begin:vcard") {
            ContentType::VCard
        } else if lower.starts_with("wifi:") {
            ContentType::WiFi
        } else if lower.starts_with("mailto:") {
            ContentType::Email
        } else if lower.starts_with("tel:") {
            ContentType::Phone
        } else if lower.starts_with("smsto:") || lower.starts_with("sms:") {
            ContentType::Sms
        } else if lower.starts_with("geo:") {
            ContentType::Geo
        } else if content.starts_with("00") && content.len() > 50 {
            // EMV payloads open with the "00" payload format indicator.
            ContentType::Payment
        } else if lower.starts_with("st.") {
            ContentType::Payment
        } else {
            ContentType::Text
        }
    }
}
