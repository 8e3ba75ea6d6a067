//! Morphology and cuneiform-glyph lookups.
//!
//! Outbound requests carry a serialized node fragment and a language tag;
//! responses are attribute/value pairs (morphology) or a rendered glyph
//! string (cuneiform). Every failure maps to [`Error::Lookup`] and is
//! surfaced as a non-fatal inline notice; the document stays editable.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::node::Attributes;

/// Request body of a cuneiform rendering lookup.
#[derive(Debug, Clone, Serialize)]
pub struct CuneiformRequest {
    pub number: u32,
    pub content: String,
}

/// Response of a cuneiform rendering lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct CuneiformResponse {
    pub number: u32,
    pub cuneiform: String,
}

/// Request body of a morphological analysis lookup.
#[derive(Debug, Clone, Serialize)]
pub struct MorphologyRequest {
    /// The word fragment, serialized as XML.
    pub fragment: String,
    pub language: String,
}

/// Resolves node fragments against the remote analysis services.
pub trait LookupClient {
    /// Fetches morphological analyses for a serialized word fragment.
    /// The response's attribute/value pairs replace the word's attributes.
    fn fetch_morphologies(&self, fragment: &str, language: &str) -> Result<Attributes>;

    /// Fetches the cuneiform rendering of one line's content.
    fn fetch_cuneiform(&self, number: u32, content: &str) -> Result<String>;
}

/// Blocking HTTP implementation of [`LookupClient`].
pub struct HttpLookupClient {
    agent: ureq::Agent,
    morphology_url: String,
    cuneiform_url: String,
}

impl HttpLookupClient {
    /// Creates a client against the given endpoints.
    pub fn new(morphology_url: &str, cuneiform_url: &str) -> Self {
        HttpLookupClient {
            agent: ureq::agent(),
            morphology_url: morphology_url.to_string(),
            cuneiform_url: cuneiform_url.to_string(),
        }
    }
}

impl LookupClient for HttpLookupClient {
    fn fetch_morphologies(&self, fragment: &str, language: &str) -> Result<Attributes> {
        let request = MorphologyRequest {
            fragment: fragment.to_string(),
            language: language.to_string(),
        };

        let response: HashMap<String, String> = self
            .agent
            .post(&self.morphology_url)
            .send_json(&request)
            .map_err(|e| Error::Lookup(e.to_string()))?
            .into_json()
            .map_err(|e| Error::Lookup(e.to_string()))?;

        Ok(response
            .into_iter()
            .map(|(name, value)| (name, Some(value)))
            .collect())
    }

    fn fetch_cuneiform(&self, number: u32, content: &str) -> Result<String> {
        let request = CuneiformRequest {
            number,
            content: content.to_string(),
        };

        let response: CuneiformResponse = self
            .agent
            .post(&self.cuneiform_url)
            .send_json(&request)
            .map_err(|e| Error::Lookup(e.to_string()))?
            .into_json()
            .map_err(|e| Error::Lookup(e.to_string()))?;

        Ok(response.cuneiform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Canned client used to exercise the editor-side merge contract
    /// without a network.
    struct FixedLookupClient {
        cuneiform: Option<String>,
    }

    impl LookupClient for FixedLookupClient {
        fn fetch_morphologies(&self, _fragment: &str, _language: &str) -> Result<Attributes> {
            Err(Error::Lookup("service unavailable".to_string()))
        }

        fn fetch_cuneiform(&self, _number: u32, _content: &str) -> Result<String> {
            self.cuneiform
                .clone()
                .ok_or_else(|| Error::Lookup("service unavailable".to_string()))
        }
    }

    #[test]
    fn test_lookup_failure_is_non_fatal_error_kind() {
        let client = FixedLookupClient { cuneiform: None };
        let result = client.fetch_cuneiform(1, "<w>x</w>");
        assert!(matches!(result, Err(Error::Lookup(_))));
    }

    #[test]
    fn test_lookup_success_returns_glyphs() {
        let client = FixedLookupClient {
            cuneiform: Some("𒀸𒆜".to_string()),
        };
        assert_eq!(client.fetch_cuneiform(1, "<w>x</w>").unwrap(), "𒀸𒆜");
    }

    #[test]
    fn test_request_bodies_serialize() {
        let request = CuneiformRequest {
            number: 1,
            content: "<w>ha-an</w>".to_string(),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"number\":1"));
        assert!(json.contains("ha-an"));
    }
}
