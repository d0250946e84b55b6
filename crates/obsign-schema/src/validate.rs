//! # Schema Validation
//!
//! Validation of credential documents, proofs and persisted key records
//! against JSON Schema definitions (Draft 2020-12).
//!
//! ## Security Invariant
//!
//! Schema validation is a trust boundary. It runs on the inbound document,
//! the outbound proof, the outbound credential and the persisted key record.
//! Documents that fail are rejected with structured violations carrying the
//! instance path, the schema path and a message.
//!
//! ## Schema Resolution
//!
//! All schemas use `$id` URIs of the form
//! `https://schemas.obsign.dev/ob3/<filename>`. Cross-schema `$ref`s use the
//! same prefix and are resolved against the embedded set by
//! a local retriever; no network request is ever made.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// URI prefix shared by every schema `$id`.
pub const SCHEMA_URI_PREFIX: &str = "https://schemas.obsign.dev/ob3/";

/// The schemas compiled into the binary, as `(filename, source)`.
const EMBEDDED_SCHEMAS: &[(&str, &str)] = &[
    (
        "achievement-credential.schema.json",
        include_str!("../schemas/achievement-credential.schema.json"),
    ),
    (
        "achievement.schema.json",
        include_str!("../schemas/achievement.schema.json"),
    ),
    (
        "create-credential.schema.json",
        include_str!("../schemas/create-credential.schema.json"),
    ),
    (
        "credential-base.schema.json",
        include_str!("../schemas/credential-base.schema.json"),
    ),
    (
        "data-integrity-proof.schema.json",
        include_str!("../schemas/data-integrity-proof.schema.json"),
    ),
    (
        "profile.schema.json",
        include_str!("../schemas/profile.schema.json"),
    ),
    (
        "proof-config.schema.json",
        include_str!("../schemas/proof-config.schema.json"),
    ),
    (
        "signing-key-record.schema.json",
        include_str!("../schemas/signing-key-record.schema.json"),
    ),
];

/// The trust boundaries that have a named schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaName {
    /// Unsigned credential submitted for signing.
    CreateCredential,
    /// Signed credential returned to the caller.
    AchievementCredential,
    /// The proof options hashed under eddsa-jcs-2022.
    ProofConfig,
    /// A finished Data Integrity proof.
    DataIntegrityProof,
    /// A persisted signing key row.
    SigningKeyRecord,
}

impl SchemaName {
    pub const ALL: [SchemaName; 5] = [
        SchemaName::CreateCredential,
        SchemaName::AchievementCredential,
        SchemaName::ProofConfig,
        SchemaName::DataIntegrityProof,
        SchemaName::SigningKeyRecord,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            SchemaName::CreateCredential => "create-credential.schema.json",
            SchemaName::AchievementCredential => "achievement-credential.schema.json",
            SchemaName::ProofConfig => "proof-config.schema.json",
            SchemaName::DataIntegrityProof => "data-integrity-proof.schema.json",
            SchemaName::SigningKeyRecord => "signing-key-record.schema.json",
        }
    }

    /// Short name used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaName::CreateCredential => "create-credential",
            SchemaName::AchievementCredential => "achievement-credential",
            SchemaName::ProofConfig => "proof-config",
            SchemaName::DataIntegrityProof => "data-integrity-proof",
            SchemaName::SigningKeyRecord => "signing-key-record",
        }
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaName {
    type Err = SchemaValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_end_matches(".schema.json");
        SchemaName::ALL
            .into_iter()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| SchemaValidationError::SchemaLoadError {
                schema_name: s.to_string(),
                reason: format!(
                    "unknown schema; expected one of: {}",
                    SchemaName::ALL.map(|n| n.as_str()).join(", ")
                ),
            })
    }
}

/// Resolves `$ref` URIs against the loaded schema set.
struct LocalSchemaRetriever {
    schemas_by_uri: HashMap<String, Value>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        if let Some(value) = self.schemas_by_uri.get(uri_str) {
            return Ok(value.clone());
        }

        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        if let Some(value) = self.schemas_by_uri.get(filename) {
            return Ok(value.clone());
        }

        Err(format!("schema '{uri_str}' is not registered").into())
    }
}

/// Error during schema validation.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The document did not conform to the schema.
    #[error("validation failed against schema '{schema_name}':\n{violations}")]
    ValidationFailed {
        schema_name: String,
        violations: ValidationViolations,
    },

    /// The schema could not be found or parsed.
    #[error("schema load error for '{schema_name}': {reason}")]
    SchemaLoadError { schema_name: String, reason: String },

    /// The document file could not be loaded or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoadError { path: String, reason: String },

    /// The compiled validator could not be built (e.g., invalid schema).
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuildError { schema_name: String, reason: String },

    /// A typed value could not be converted to JSON for validation.
    #[error("cannot serialize instance for schema '{schema_name}': {reason}")]
    Serialization { schema_name: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaValidationError {
    /// The structured violations, if this is a validation failure.
    pub fn violations(&self) -> Option<&ValidationViolations> {
        match self {
            SchemaValidationError::ValidationFailed { violations, .. } => Some(violations),
            _ => None,
        }
    }
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// JSON Pointer to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer within the schema that triggered the error.
    pub schema_path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A schema validator backed by the `jsonschema` crate.
///
/// Every loaded schema is compiled once at construction; validation reuses
/// the compiled validators.
///
/// ## Thread Safety
///
/// `SchemaValidator` is `Send + Sync` and is shared behind an `Arc` by the
/// proof engine and the key manager.
pub struct SchemaValidator {
    schemas: HashMap<String, Value>,
    compiled: HashMap<String, Validator>,
}

impl SchemaValidator {
    /// Compile the embedded schema set.
    pub fn builtin() -> Result<Self, SchemaValidationError> {
        Self::compile(embedded_schemas()?)
    }

    /// Compile the embedded schemas plus every `*.schema.json` in `dir`.
    ///
    /// A file in `dir` replaces the embedded schema of the same name.
    pub fn with_overrides(dir: impl AsRef<Path>) -> Result<Self, SchemaValidationError> {
        let dir = dir.as_ref();
        let mut schemas = embedded_schemas()?;

        let entries =
            std::fs::read_dir(dir).map_err(|e| SchemaValidationError::SchemaLoadError {
                schema_name: dir.display().to_string(),
                reason: format!("cannot read schema directory: {e}"),
            })?;
        for entry in entries {
            let path = entry?.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.ends_with(".schema.json") {
                    let content = std::fs::read_to_string(&path)?;
                    schemas.insert(name.to_string(), parse_schema(name, &content)?);
                }
            }
        }
        Self::compile(schemas)
    }

    fn compile(schemas: HashMap<String, Value>) -> Result<Self, SchemaValidationError> {
        let mut compiled = HashMap::with_capacity(schemas.len());
        for (name, value) in &schemas {
            let validator = build_options(&schemas).build(value).map_err(|e| {
                SchemaValidationError::ValidatorBuildError {
                    schema_name: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            compiled.insert(name.clone(), validator);
        }
        Ok(Self { schemas, compiled })
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Names of all loaded schemas, sorted.
    pub fn schema_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Validate `instance` against one of the named trust-boundary schemas.
    pub fn validate(
        &self,
        instance: &Value,
        schema: SchemaName,
    ) -> Result<(), SchemaValidationError> {
        self.validate_document(instance, schema.file_name())
    }

    /// Serialize a typed value and validate it.
    pub fn validate_typed<T: Serialize>(
        &self,
        value: &T,
        schema: SchemaName,
    ) -> Result<(), SchemaValidationError> {
        let instance =
            serde_json::to_value(value).map_err(|e| SchemaValidationError::Serialization {
                schema_name: schema.file_name().to_string(),
                reason: e.to_string(),
            })?;
        self.validate(&instance, schema)
    }

    /// Validate a parsed JSON value against a schema by filename.
    pub fn validate_document(
        &self,
        instance: &Value,
        schema_name: &str,
    ) -> Result<(), SchemaValidationError> {
        let validator =
            self.compiled
                .get(schema_name)
                .ok_or_else(|| SchemaValidationError::SchemaLoadError {
                    schema_name: schema_name.to_string(),
                    reason: "schema not loaded".to_string(),
                })?;

        let errors: Vec<Violation> = validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::ValidationFailed {
                schema_name: schema_name.to_string(),
                violations: ValidationViolations { violations: errors },
            })
        }
    }

    /// Load a JSON or YAML document from disk and validate it.
    ///
    /// The format follows the file extension (`.yaml`/`.yml` for YAML,
    /// anything else for JSON).
    pub fn validate_file(
        &self,
        document_path: &Path,
        schema: SchemaName,
    ) -> Result<(), SchemaValidationError> {
        let instance = load_document(document_path)?;
        self.validate(&instance, schema)
    }
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schemas", &self.schema_names())
            .finish()
    }
}

fn parse_schema(name: &str, source: &str) -> Result<Value, SchemaValidationError> {
    serde_json::from_str(source).map_err(|e| SchemaValidationError::SchemaLoadError {
        schema_name: name.to_string(),
        reason: format!("invalid JSON: {e}"),
    })
}

fn embedded_schemas() -> Result<HashMap<String, Value>, SchemaValidationError> {
    EMBEDDED_SCHEMAS
        .iter()
        .map(|(name, source)| {
            parse_schema(name, source).map(|schema| ((*name).to_string(), schema))
        })
        .collect()
}

/// Build `ValidationOptions` with every loaded schema reachable through the
/// local retriever, under its `$id`, its canonical URI and its bare filename.
fn build_options(schemas: &HashMap<String, Value>) -> ValidationOptions {
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft202012);
    opts.should_validate_formats(true);

    let mut schemas_by_uri: HashMap<String, Value> = HashMap::new();
    for (filename, value) in schemas {
        schemas_by_uri.insert(format!("{SCHEMA_URI_PREFIX}{filename}"), value.clone());
        if let Some(id_str) = value.get("$id").and_then(|v| v.as_str()) {
            schemas_by_uri.insert(id_str.to_string(), value.clone());
        }
        schemas_by_uri.insert(filename.clone(), value.clone());
    }
    opts.with_retriever(LocalSchemaRetriever { schemas_by_uri });
    opts
}

/// Read a JSON or YAML document into a JSON value.
pub fn load_document(path: &Path) -> Result<Value, SchemaValidationError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| SchemaValidationError::DocumentLoadError {
            path: path.display().to_string(),
            reason: format!("cannot read file: {e}"),
        })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "yaml" | "yml" => serde_yaml::from_str::<Value>(&content).map_err(|e| {
            SchemaValidationError::DocumentLoadError {
                path: path.display().to_string(),
                reason: format!("invalid YAML: {e}"),
            }
        }),
        _ => serde_json::from_str(&content).map_err(|e| SchemaValidationError::DocumentLoadError {
            path: path.display().to_string(),
            reason: format!("invalid JSON: {e}"),
        }),
    }
}
