//! Tool registry for MCP tools.
//!
//! Every tool checks its arguments against an [`InputSchema`] through the
//! engine's governor before touching the engine. Free-text fields are
//! declared raw so analyzers see the text exactly as submitted.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::engine::{IntegrityEngine, IntegrityError, ReportFormat};
use crate::governor::{FieldRule, InputError, InputKind, InputSchema};
use crate::models::{
    Citation, CheckType, Document, FieldCheck, ValidationContext,
};

/// Upper bound on submitted text, in characters
const MAX_CONTENT_CHARS: usize = 2_000_000;

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "validate_document")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: serde_json::Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

fn context_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "description": "Validation context: document_id, discipline, paradigm (quantitative|qualitative|mixed|theoretical), citation_style (apa|mla|chicago|ieee|harvard), academic_level, thresholds, external_sources"
    })
}

fn content_rule(required: bool) -> FieldRule {
    let rule = FieldRule::string("content").length(0, MAX_CONTENT_CHARS).raw();
    if required {
        rule.required()
    } else {
        rule
    }
}

/// Apply the content size limit to text that arrived nested in an object
fn check_content_length(content: &str, field: &str) -> Result<(), String> {
    if content.chars().count() > MAX_CONTENT_CHARS {
        let error = InputError::TooLong {
            field: field.to_string(),
            max: MAX_CONTENT_CHARS,
        };
        return Err(IntegrityError::InvalidInput(vec![error]).to_string());
    }
    Ok(())
}

fn context_rule() -> FieldRule {
    FieldRule::new("context", InputKind::Object)
}

fn check_id_rule() -> FieldRule {
    FieldRule::string("check_id").required().length(1, 128)
}

/// Validate `args` with the engine's governor
fn sanitize(engine: &IntegrityEngine, schema: &InputSchema, args: &Value) -> Result<Map<String, Value>, String> {
    engine
        .governor()
        .validate_input(schema, args)
        .map_err(|errors| IntegrityError::InvalidInput(errors).to_string())
}

/// Deserialize an optional argument
fn parse<T: DeserializeOwned>(args: &Map<String, Value>, key: &str) -> Result<Option<T>, String> {
    args.get(key)
        .map(|v| serde_json::from_value(v.clone()).map_err(|e| format!("Invalid '{}': {}", key, e)))
        .transpose()
}

fn context_arg(args: &Map<String, Value>) -> Result<ValidationContext, String> {
    Ok(parse(args, "context")?.unwrap_or_default())
}

fn str_arg<'a>(args: &'a Map<String, Value>, key: &str) -> &'a str {
    args.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

/// Handler submitting a full or partial check
#[derive(Debug)]
pub struct ValidateDocumentHandler {
    pub engine: Arc<IntegrityEngine>,
}

#[async_trait::async_trait]
impl ToolHandler for ValidateDocumentHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let schema = InputSchema::new()
            .field(content_rule(false))
            .field(FieldRule::new("document", InputKind::Object))
            .field(context_rule())
            .field(FieldRule::string("check_type").one_of(&["full", "plagiarism", "citations", "data", "quick"]))
            .field(FieldRule::new("wait", InputKind::Boolean));
        let args = sanitize(&self.engine, &schema, &args)?;

        let document = match parse::<Document>(&args, "document")? {
            Some(document) => {
                check_content_length(&document.content, "document.content")?;
                document
            }
            None if args.contains_key("content") => Document::new(str_arg(&args, "content")),
            None => return Err("Either 'content' or 'document' is required".to_string()),
        };
        let context = context_arg(&args)?;
        let check_type = parse::<CheckType>(&args, "check_type")?.unwrap_or_default();

        let check_id = self
            .engine
            .submit_check(document, context, check_type)
            .map_err(|e| e.to_string())?;

        if args.get("wait").and_then(Value::as_bool).unwrap_or(false) {
            let check = self
                .engine
                .wait_for_completion(&check_id)
                .await
                .map_err(|e| e.to_string())?;
            return to_value(&check);
        }

        Ok(serde_json::json!({
            "check_id": check_id,
            "status": "pending",
        }))
    }
}

/// Handler returning the current state of a check
#[derive(Debug)]
pub struct GetIntegrityResultsHandler {
    pub engine: Arc<IntegrityEngine>,
}

#[async_trait::async_trait]
impl ToolHandler for GetIntegrityResultsHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let schema = InputSchema::new().field(check_id_rule());
        let args = sanitize(&self.engine, &schema, &args)?;

        let check = self
            .engine
            .get_integrity_results(str_arg(&args, "check_id"))
            .map_err(|e| e.to_string())?;
        to_value(&check)
    }
}

/// Handler running the plagiarism rule inline
#[derive(Debug)]
pub struct DetectPlagiarismHandler {
    pub engine: Arc<IntegrityEngine>,
}

#[async_trait::async_trait]
impl ToolHandler for DetectPlagiarismHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let schema = InputSchema::new().field(content_rule(true)).field(context_rule());
        let args = sanitize(&self.engine, &schema, &args)?;
        let context = context_arg(&args)?;

        let result = self
            .engine
            .detect_plagiarism(str_arg(&args, "content"), &context)
            .await
            .map_err(|e| e.to_string())?;
        to_value(&result)
    }
}

/// Handler running the citation rule inline
#[derive(Debug)]
pub struct ValidateCitationsHandler {
    pub engine: Arc<IntegrityEngine>,
}

#[async_trait::async_trait]
impl ToolHandler for ValidateCitationsHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let schema = InputSchema::new()
            .field(FieldRule::new("citations", InputKind::Array).required().length(0, 5000))
            .field(context_rule());
        let args = sanitize(&self.engine, &schema, &args)?;

        let citations: Vec<Citation> = parse(&args, "citations")?.unwrap_or_default();
        let context = context_arg(&args)?;

        let result = self
            .engine
            .validate_citations(citations, &context)
            .await
            .map_err(|e| e.to_string())?;
        to_value(&result)
    }
}

/// Handler running the data consistency rule inline
#[derive(Debug)]
pub struct ValidateDataConsistencyHandler {
    pub engine: Arc<IntegrityEngine>,
}

#[async_trait::async_trait]
impl ToolHandler for ValidateDataConsistencyHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let schema = InputSchema::new()
            .field(FieldRule::new("data", InputKind::Object).required())
            .field(FieldRule::new("schema", InputKind::Array))
            .field(context_rule());
        let args = sanitize(&self.engine, &schema, &args)?;

        let data: Map<String, Value> = parse(&args, "data")?.unwrap_or_default();
        let field_checks: Vec<FieldCheck> = parse(&args, "schema")?.unwrap_or_default();
        let context = context_arg(&args)?;

        let result = self
            .engine
            .validate_data_consistency(data, field_checks, &context)
            .await
            .map_err(|e| e.to_string())?;
        to_value(&result)
    }
}

/// Handler computing the quick score
#[derive(Debug)]
pub struct QuickIntegrityScoreHandler {
    pub engine: Arc<IntegrityEngine>,
}

#[async_trait::async_trait]
impl ToolHandler for QuickIntegrityScoreHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let schema = InputSchema::new().field(content_rule(true));
        let args = sanitize(&self.engine, &schema, &args)?;
        to_value(&self.engine.get_quick_integrity_score(str_arg(&args, "content")))
    }
}

/// Handler rendering a finished check
#[derive(Debug)]
pub struct GenerateIntegrityReportHandler {
    pub engine: Arc<IntegrityEngine>,
}

#[async_trait::async_trait]
impl ToolHandler for GenerateIntegrityReportHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let schema = InputSchema::new()
            .field(check_id_rule())
            .field(FieldRule::string("format").one_of(&["json", "html", "pdf"]));
        let args = sanitize(&self.engine, &schema, &args)?;

        let format: ReportFormat = args
            .get("format")
            .and_then(Value::as_str)
            .unwrap_or("json")
            .parse()
            .map_err(|e: IntegrityError| e.to_string())?;

        let report = self
            .engine
            .generate_integrity_report(str_arg(&args, "check_id"), format)
            .map_err(|e| e.to_string())?;
        to_value(&report)
    }
}

/// Handler listing rules
#[derive(Debug)]
pub struct ListRulesHandler {
    pub engine: Arc<IntegrityEngine>,
}

#[async_trait::async_trait]
impl ToolHandler for ListRulesHandler {
    async fn execute(&self, _args: Value) -> Result<Value, String> {
        let rules = self.engine.list_rules();
        Ok(serde_json::json!({
            "total": rules.len(),
            "rules": to_value(&rules)?,
        }))
    }
}

/// Handler enabling or disabling a rule
#[derive(Debug)]
pub struct SetRuleEnabledHandler {
    pub engine: Arc<IntegrityEngine>,
}

#[async_trait::async_trait]
impl ToolHandler for SetRuleEnabledHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let schema = InputSchema::new()
            .field(FieldRule::string("rule_id").required().length(1, 64))
            .field(FieldRule::new("enabled", InputKind::Boolean).required());
        let args = sanitize(&self.engine, &schema, &args)?;

        let rule_id = str_arg(&args, "rule_id");
        let enabled = args.get("enabled").and_then(Value::as_bool).unwrap_or(true);
        self.engine
            .set_rule_enabled(rule_id, enabled)
            .map_err(|e| e.to_string())?;

        Ok(serde_json::json!({
            "rule_id": rule_id,
            "enabled": enabled,
        }))
    }
}

/// Handler adding a text to the local known-source index
#[derive(Debug)]
pub struct AddKnownSourceHandler {
    pub engine: Arc<IntegrityEngine>,
}

#[async_trait::async_trait]
impl ToolHandler for AddKnownSourceHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let schema = InputSchema::new()
            .field(FieldRule::string("source_id").required().length(1, 256))
            .field(FieldRule::string("title").length(0, 1000))
            .field(content_rule(true));
        let args = sanitize(&self.engine, &schema, &args)?;

        let source_id = str_arg(&args, "source_id");
        let title = args.get("title").and_then(Value::as_str).map(str::to_string);
        let indexed = self
            .engine
            .add_known_source(source_id, title, str_arg(&args, "content"))
            .map_err(|e| e.to_string())?;

        Ok(serde_json::json!({
            "source_id": source_id,
            "indexed_sources": indexed,
        }))
    }
}

/// Registry for all MCP tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a registry exposing `engine`
    pub fn from_engine(engine: Arc<IntegrityEngine>) -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
        };
        registry.register_engine_tools(&engine);
        registry
    }

    fn register_engine_tools(&mut self, engine: &Arc<IntegrityEngine>) {
        self.register(Tool {
            name: "validate_document".to_string(),
            description: "Submit a document for a full integrity check. Returns a check id to poll with get_integrity_results, or the finished check when 'wait' is true.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "content": {
                        "type": "string",
                        "description": "Document text (used when 'document' is not given)"
                    },
                    "document": {
                        "type": "object",
                        "description": "Full document: content, citations, data, data_schema, title"
                    },
                    "context": context_schema(),
                    "check_type": {
                        "type": "string",
                        "description": "Which rules to run",
                        "enum": ["full", "plagiarism", "citations", "data", "quick"],
                        "default": "full"
                    },
                    "wait": {
                        "type": "boolean",
                        "description": "Wait for the check to finish",
                        "default": false
                    }
                }
            }),
            handler: Arc::new(ValidateDocumentHandler {
                engine: engine.clone(),
            }),
        });

        self.register(Tool {
            name: "get_integrity_results".to_string(),
            description: "Get the status and, once finished, the report of an integrity check.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "check_id": {
                        "type": "string",
                        "description": "Check id returned by validate_document"
                    }
                },
                "required": ["check_id"]
            }),
            handler: Arc::new(GetIntegrityResultsHandler {
                engine: engine.clone(),
            }),
        });

        self.register(Tool {
            name: "detect_plagiarism".to_string(),
            description: "Compare text against known sources and report overlapping segments.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "content": {
                        "type": "string",
                        "description": "Text to check"
                    },
                    "context": context_schema()
                },
                "required": ["content"]
            }),
            handler: Arc::new(DetectPlagiarismHandler {
                engine: engine.clone(),
            }),
        });

        self.register(Tool {
            name: "validate_citations".to_string(),
            description: "Check a reference list for missing fields, DOI problems, style violations and duplicates.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "citations": {
                        "type": "array",
                        "description": "Citation objects: id, citation_type, authors, title, year, journal, doi, ...",
                        "items": { "type": "object" }
                    },
                    "context": context_schema()
                },
                "required": ["citations"]
            }),
            handler: Arc::new(ValidateCitationsHandler {
                engine: engine.clone(),
            }),
        });

        self.register(Tool {
            name: "validate_data_consistency".to_string(),
            description: "Check a data record against field rules: required fields, types, patterns, allowed values and cross-field relations.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "data": {
                        "type": "object",
                        "description": "Data record"
                    },
                    "schema": {
                        "type": "array",
                        "description": "Field checks: field, type, required, pattern, allowed_values, cross_references",
                        "items": { "type": "object" }
                    },
                    "context": context_schema()
                },
                "required": ["data"]
            }),
            handler: Arc::new(ValidateDataConsistencyHandler {
                engine: engine.clone(),
            }),
        });

        self.register(Tool {
            name: "quick_integrity_score".to_string(),
            description: "Cheap local integrity estimate with a risk level. No external lookups.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "content": {
                        "type": "string",
                        "description": "Text to score"
                    }
                },
                "required": ["content"]
            }),
            handler: Arc::new(QuickIntegrityScoreHandler {
                engine: engine.clone(),
            }),
        });

        self.register(Tool {
            name: "generate_integrity_report".to_string(),
            description: "Render a finished check as JSON, HTML or a PDF placeholder.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "check_id": {
                        "type": "string",
                        "description": "Check id"
                    },
                    "format": {
                        "type": "string",
                        "enum": ["json", "html", "pdf"],
                        "default": "json"
                    }
                },
                "required": ["check_id"]
            }),
            handler: Arc::new(GenerateIntegrityReportHandler {
                engine: engine.clone(),
            }),
        });

        self.register(Tool {
            name: "list_rules".to_string(),
            description: "List validation rules with their weights and enabled state.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            handler: Arc::new(ListRulesHandler {
                engine: engine.clone(),
            }),
        });

        self.register(Tool {
            name: "set_rule_enabled".to_string(),
            description: "Enable or disable a validation rule for checks submitted afterwards.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "rule_id": {
                        "type": "string",
                        "description": "Rule id, e.g. 'methodology'"
                    },
                    "enabled": {
                        "type": "boolean"
                    }
                },
                "required": ["rule_id", "enabled"]
            }),
            handler: Arc::new(SetRuleEnabledHandler {
                engine: engine.clone(),
            }),
        });

        self.register(Tool {
            name: "add_known_source".to_string(),
            description: "Add a text to the local index that plagiarism checks compare against.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "source_id": {
                        "type": "string",
                        "description": "Identifier reported on matches; re-adding an id replaces its text"
                    },
                    "title": {
                        "type": "string"
                    },
                    "content": {
                        "type": "string",
                        "description": "Full text of the known source"
                    }
                },
                "required": ["source_id", "content"]
            }),
            handler: Arc::new(AddKnownSourceHandler {
                engine: engine.clone(),
            }),
        });
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools
    pub fn all(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool '{}' not found", name))?;

        tool.handler.execute(args).await
    }
}
