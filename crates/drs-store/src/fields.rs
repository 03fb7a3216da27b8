//! Closed descriptor tables for record fields and downstream pipelines
//!
//! Every payload field and every downstream pipeline is a variant of a
//! closed enum with an exhaustive, compile-time mapping to its columns.
//! Adding a variant without extending the mapping is a compile error, so
//! there is no runtime default branch to fall through.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};

/// Sentinel recorded in the change log for fields whose previous payload
/// is not retained verbatim (large bodies would double storage).
pub const CHANGE_LOG_SENTINEL: &str = "not-stored";

/// Named payload slots on a record, each independently timestamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Metadata,
    SecondaryMetadata,
    ExternalClaims,
    FullText,
    Metrics,
    Augmentation,
}

/// Static description of one payload field: its wire tag, the columns it
/// owns, and whether the change log keeps the previous payload verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub field: FieldType,
    pub name: &'static str,
    pub payload_column: &'static str,
    pub updated_column: &'static str,
    pub log_previous_value: bool,
}

impl FieldType {
    /// All field variants, in column order.
    pub const ALL: [FieldType; 6] = [
        FieldType::Metadata,
        FieldType::SecondaryMetadata,
        FieldType::ExternalClaims,
        FieldType::FullText,
        FieldType::Metrics,
        FieldType::Augmentation,
    ];

    pub const fn descriptor(self) -> FieldDescriptor {
        match self {
            FieldType::Metadata => FieldDescriptor {
                field: self,
                name: "metadata",
                payload_column: "metadata",
                updated_column: "metadata_updated",
                log_previous_value: true,
            },
            FieldType::SecondaryMetadata => FieldDescriptor {
                field: self,
                name: "secondary-metadata",
                payload_column: "secondary_metadata",
                updated_column: "secondary_metadata_updated",
                log_previous_value: true,
            },
            FieldType::ExternalClaims => FieldDescriptor {
                field: self,
                name: "external-claims",
                payload_column: "external_claims",
                updated_column: "external_claims_updated",
                log_previous_value: true,
            },
            FieldType::FullText => FieldDescriptor {
                field: self,
                name: "full-text",
                payload_column: "full_text",
                updated_column: "full_text_updated",
                log_previous_value: false,
            },
            FieldType::Metrics => FieldDescriptor {
                field: self,
                name: "metrics",
                payload_column: "metrics",
                updated_column: "metrics_updated",
                log_previous_value: false,
            },
            FieldType::Augmentation => FieldDescriptor {
                field: self,
                name: "augmentation",
                payload_column: "augmentation",
                updated_column: "augmentation_updated",
                log_previous_value: false,
            },
        }
    }
}

/// Static field table, in column order. Diagnostics and snapshot queries
/// iterate this instead of reflecting over the row type.
pub const FIELDS: [FieldDescriptor; 6] = [
    FieldType::Metadata.descriptor(),
    FieldType::SecondaryMetadata.descriptor(),
    FieldType::ExternalClaims.descriptor(),
    FieldType::FullText.descriptor(),
    FieldType::Metrics.descriptor(),
    FieldType::Augmentation.descriptor(),
];

impl std::str::FromStr for FieldType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|f| f.descriptor().name == s)
            .ok_or_else(|| StoreError::InvalidFieldType(s.to_string()))
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.descriptor().name)
    }
}

/// Downstream consumers tracked per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineType {
    Solr,
    Metrics,
    Links,
}

/// Static description of one pipeline's processed/checksum column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineDescriptor {
    pub pipeline: PipelineType,
    pub name: &'static str,
    pub processed_column: &'static str,
    pub checksum_column: &'static str,
}

impl PipelineType {
    /// All pipeline variants.
    pub const ALL: [PipelineType; 3] =
        [PipelineType::Solr, PipelineType::Metrics, PipelineType::Links];

    pub const fn descriptor(self) -> PipelineDescriptor {
        match self {
            PipelineType::Solr => PipelineDescriptor {
                pipeline: self,
                name: "solr",
                processed_column: "solr_processed",
                checksum_column: "solr_checksum",
            },
            PipelineType::Metrics => PipelineDescriptor {
                pipeline: self,
                name: "metrics",
                processed_column: "metrics_processed",
                checksum_column: "metrics_checksum",
            },
            PipelineType::Links => PipelineDescriptor {
                pipeline: self,
                name: "links",
                processed_column: "links_processed",
                checksum_column: "links_checksum",
            },
        }
    }
}

/// Static pipeline table.
pub const PIPELINES: [PipelineDescriptor; 3] = [
    PipelineType::Solr.descriptor(),
    PipelineType::Metrics.descriptor(),
    PipelineType::Links.descriptor(),
];

impl std::str::FromStr for PipelineType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PipelineType::ALL
            .into_iter()
            .find(|p| p.descriptor().name == s)
            .ok_or_else(|| StoreError::InvalidPipelineType(s.to_string()))
    }
}

impl std::fmt::Display for PipelineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.descriptor().name)
    }
}

/// Payload accepted by `update_field`. Structured values are canonicalized
/// to their JSON string form before storage.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(serde_json::Value),
}

impl Payload {
    /// Canonical string form stored in the payload column.
    pub fn into_storage(self) -> Result<String, StoreError> {
        match self {
            Payload::Text(s) => Ok(s),
            Payload::Json(v) => Ok(serde_json::to_string(&v)?),
        }
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(v: serde_json::Value) -> Self {
        Payload::Json(v)
    }
}

/// Columns the diagnostics command may count. This is the closed,
/// statically declared attribute set of the record row.
pub const DIAGNOSTIC_COLUMNS: &[&str] = &[
    "key",
    "metadata",
    "secondary_metadata",
    "external_claims",
    "full_text",
    "metrics",
    "augmentation",
    "metadata_updated",
    "secondary_metadata_updated",
    "external_claims_updated",
    "full_text_updated",
    "metrics_updated",
    "augmentation_updated",
    "created",
    "updated",
    "processed",
    "solr_processed",
    "solr_checksum",
    "metrics_processed",
    "metrics_checksum",
    "links_processed",
    "links_checksum",
    "status",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_from_str_round_trip() {
        for field in FieldType::ALL {
            let parsed: FieldType = field.to_string().parse().unwrap();
            assert_eq!(parsed, field);
        }
    }

    #[test]
    fn test_field_type_rejects_unknown_tag() {
        let err = "bib_data".parse::<FieldType>().unwrap_err();
        assert!(matches!(err, StoreError::InvalidFieldType(tag) if tag == "bib_data"));
    }

    #[test]
    fn test_pipeline_type_from_str_round_trip() {
        for pipeline in PipelineType::ALL {
            let parsed: PipelineType = pipeline.to_string().parse().unwrap();
            assert_eq!(parsed, pipeline);
        }
    }

    #[test]
    fn test_pipeline_type_rejects_unknown_tag() {
        let err = "datalinks".parse::<PipelineType>().unwrap_err();
        assert!(matches!(err, StoreError::InvalidPipelineType(tag) if tag == "datalinks"));
    }

    #[test]
    fn test_large_fields_use_change_log_sentinel() {
        assert!(!FieldType::FullText.descriptor().log_previous_value);
        assert!(!FieldType::Metrics.descriptor().log_previous_value);
        assert!(!FieldType::Augmentation.descriptor().log_previous_value);
        assert!(FieldType::Metadata.descriptor().log_previous_value);
        assert!(FieldType::SecondaryMetadata.descriptor().log_previous_value);
        assert!(FieldType::ExternalClaims.descriptor().log_previous_value);
    }

    #[test]
    fn test_descriptor_columns_are_diagnostic_columns() {
        for d in FIELDS {
            assert!(DIAGNOSTIC_COLUMNS.contains(&d.payload_column));
            assert!(DIAGNOSTIC_COLUMNS.contains(&d.updated_column));
        }
        for p in PIPELINES {
            assert!(DIAGNOSTIC_COLUMNS.contains(&p.processed_column));
            assert!(DIAGNOSTIC_COLUMNS.contains(&p.checksum_column));
        }
    }

    #[test]
    fn test_json_payload_canonicalized() {
        let payload = Payload::Json(serde_json::json!({"key": "abc", "count": 1}));
        let stored = payload.into_storage().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed, serde_json::json!({"key": "abc", "count": 1}));
    }

    #[test]
    fn test_text_payload_stored_verbatim() {
        let payload = Payload::from("plain body");
        assert_eq!(payload.into_storage().unwrap(), "plain body");
    }
}
