//! Lead capture: validate a form submission, create the CRM client, tag it.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::config::AppConfig;
use crate::core::models::NewClient;
use crate::crm::CrmApi;
use crate::errors::RelayError;

/// Which form produced the lead. Drives the CRM label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadSource {
    Contact,
    Property,
    Valuation,
    Newsletter,
    Other(String),
}

impl LeadSource {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = raw.map(|s| s.trim().to_ascii_lowercase()).unwrap_or_default();
        match raw.as_str() {
            "" | "contact" | "contacto" => Self::Contact,
            "property" | "listing" | "propiedad" | "inmueble" => Self::Property,
            "valuation" | "sell" | "tasacion" | "vender" => Self::Valuation,
            "newsletter" => Self::Newsletter,
            _ => Self::Other(raw),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Contact => "contact",
            Self::Property => "property",
            Self::Valuation => "valuation",
            Self::Newsletter => "newsletter",
            Self::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LeadSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, alias = "propertyId")]
    pub property_id: Option<u64>,
    #[serde(default, alias = "propertyRef")]
    pub property_reference: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default, alias = "privacyAccepted")]
    pub privacy_accepted: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadReceipt {
    pub ok: bool,
    pub client_id: u64,
    pub labeled: bool,
}

fn present(field: Option<&String>) -> Option<String> {
    field.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl LeadSubmission {
    #[must_use]
    pub fn source(&self) -> LeadSource {
        LeadSource::parse(self.source.as_deref())
    }

    /// Check the required fields and build the CRM client record.
    ///
    /// # Errors
    ///
    /// `MissingField` naming the first of `name`, `email` that is absent or blank,
    /// `InvalidInput` when the form reports the privacy policy as declined.
    pub fn validate(&self, config: &AppConfig) -> Result<NewClient, RelayError> {
        let name = present(self.name.as_ref())
            .ok_or_else(|| RelayError::MissingField("name".to_string()))?;
        let email = present(self.email.as_ref())
            .ok_or_else(|| RelayError::MissingField("email".to_string()))?;
        if self.privacy_accepted == Some(false) {
            return Err(RelayError::InvalidInput(
                "privacy policy must be accepted".to_string(),
            ));
        }

        let mut comments: Vec<String> = Vec::new();
        if let Some(reference) = present(self.property_reference.as_ref()) {
            comments.push(format!("Property: {reference}"));
        } else if let Some(id) = self.property_id {
            comments.push(format!("Property: #{id}"));
        }
        if let Some(message) = present(self.message.as_ref()) {
            comments.push(message);
        }
        comments.push(format!("Source: {}", self.source().key()));
        if self.privacy_accepted == Some(true) {
            comments.push("Privacy policy accepted".to_string());
        }

        Ok(NewClient {
            name,
            email: email.to_ascii_lowercase(),
            phone: present(self.phone.as_ref()),
            comments: Some(comments.join("\n")),
            origin_id: config.crm_origin_id,
            property_id: self.property_id,
            language: present(self.lang.as_ref())
                .or_else(|| Some(config.default_language().to_string())),
        })
    }
}

/// Create the client, then attach the source label.
///
/// The label call runs only after the client exists. Its failure is logged
/// and reported as `labeled: false`; the client is kept.
///
/// # Errors
///
/// Validation errors, or any error of the client creation call.
pub async fn submit_lead(
    crm: &dyn CrmApi,
    config: &AppConfig,
    lead: &LeadSubmission,
) -> Result<LeadReceipt, RelayError> {
    let client = lead.validate(config)?;
    let source = lead.source();

    let client_id = crm.create_client(&client).await?;
    info!(client_id, source = source.key(), "Lead stored in CRM");

    let labeled = match config.label_for(source.key()) {
        Some(label_id) => match crm.assign_label(client_id, label_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(client_id, label_id, "Failed to label CRM client: {}", e);
                false
            }
        },
        None => {
            warn!(source = source.key(), "No CRM label configured for lead source");
            false
        }
    };

    Ok(LeadReceipt {
        ok: true,
        client_id,
        labeled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::with_endpoints("https://crm.test", "https://cms.test", "https://site.test")
            .unwrap()
    }

    #[test]
    fn source_aliases() {
        assert_eq!(LeadSource::parse(None), LeadSource::Contact);
        assert_eq!(LeadSource::parse(Some("Tasacion")), LeadSource::Valuation);
        assert_eq!(LeadSource::parse(Some("inmueble")), LeadSource::Property);
        assert_eq!(
            LeadSource::parse(Some("Facebook")),
            LeadSource::Other("facebook".to_string())
        );
    }

    #[test]
    fn missing_name_reported_before_email() {
        let lead = LeadSubmission::default();
        let err = lead.validate(&config()).unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: name");
    }

    #[test]
    fn blank_email_is_missing() {
        let lead = LeadSubmission {
            name: Some("Ana".to_string()),
            email: Some("   ".to_string()),
            ..LeadSubmission::default()
        };
        assert!(matches!(
            lead.validate(&config()),
            Err(RelayError::MissingField(f)) if f == "email"
        ));
    }

    #[test]
    fn declined_privacy_is_rejected() {
        let lead = LeadSubmission {
            name: Some("Ana".to_string()),
            email: Some("ana@example.com".to_string()),
            privacy_accepted: Some(false),
            ..LeadSubmission::default()
        };
        let err = lead.validate(&config()).unwrap_err();
        assert_eq!(err.status_code(), 400);

        let accepted = LeadSubmission {
            privacy_accepted: Some(true),
            ..lead
        };
        let client = accepted.validate(&config()).unwrap();
        assert_eq!(
            client.comments.as_deref(),
            Some("Source: contact\nPrivacy policy accepted")
        );
    }

    #[test]
    fn client_record_combines_comments() {
        let mut cfg = config();
        cfg.crm_origin_id = Some(9);
        let lead = LeadSubmission {
            name: Some(" Ana ".to_string()),
            email: Some("Ana@Example.com".to_string()),
            phone: Some(String::new()),
            message: Some("¿Sigue disponible?".to_string()),
            source: Some("property".to_string()),
            property_id: Some(42),
            property_reference: Some("MAL-042".to_string()),
            ..LeadSubmission::default()
        };
        let client = lead.validate(&cfg).unwrap();
        assert_eq!(client.name, "Ana");
        assert_eq!(client.email, "ana@example.com");
        assert_eq!(client.phone, None);
        assert_eq!(client.origin_id, Some(9));
        assert_eq!(client.language.as_deref(), Some("es"));
        assert_eq!(
            client.comments.as_deref(),
            Some("Property: MAL-042\n¿Sigue disponible?\nSource: property")
        );
    }
}
