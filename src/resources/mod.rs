//! Resource registry and URI templates.

pub mod template;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{ResourceError, ServerError};
use template::UriTemplate;

const MAX_RESOURCE_BYTES: u64 = 1024 * 1024;

pub type TextFn = Arc<dyn Fn() -> Result<String, ResourceError> + Send + Sync>;
pub type BinaryFn = Arc<dyn Fn() -> Result<Vec<u8>, ResourceError> + Send + Sync>;
pub type TemplateFn = Arc<dyn Fn(&str) -> Result<ResourceContent, ResourceError> + Send + Sync>;

#[derive(Debug, Clone)]
pub enum ResourceContent {
    Text(String),
    Binary(Vec<u8>),
}

/// The kind of backing store a registered resource reads from. `Http` is
/// stored but never dereferenced — fetching an external URL is out of
/// scope for this crate.
pub enum ResourceKind {
    Text(String),
    Binary(Vec<u8>),
    TextFunction(TextFn),
    BinaryFunction(BinaryFn),
    File(String),
    Http(String),
}

pub struct Resource {
    pub uri: String,
    pub name: String,
    pub description: Option<String>,
    pub mime_type: String,
    pub kind: ResourceKind,
}

struct ResourceTemplate {
    template: UriTemplate,
    name: String,
    description: Option<String>,
    mime_type: String,
    handler: TemplateFn,
}

#[derive(Default)]
pub struct ResourceRegistry {
    concrete: RwLock<Inner>,
    templates: RwLock<Vec<ResourceTemplate>>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Resource>,
    order: Vec<String>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    async fn insert(&self, resource: Resource) -> Result<(), ServerError> {
        let mut inner = self.concrete.write().await;
        if inner.entries.contains_key(&resource.uri) {
            return Err(ServerError::ResourceExists(resource.uri));
        }
        inner.order.push(resource.uri.clone());
        inner.entries.insert(resource.uri.clone(), resource);
        Ok(())
    }

    pub async fn add_text(
        &self,
        uri: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        mime_type: Option<&str>,
    ) -> Result<(), ServerError> {
        self.insert(Resource {
            uri: uri.into(),
            name: name.into(),
            description: None,
            mime_type: mime_type.unwrap_or("text/plain").to_string(),
            kind: ResourceKind::Text(content.into()),
        })
        .await
    }

    pub async fn add_binary(
        &self,
        uri: impl Into<String>,
        name: impl Into<String>,
        data: Vec<u8>,
        mime_type: Option<&str>,
    ) -> Result<(), ServerError> {
        self.insert(Resource {
            uri: uri.into(),
            name: name.into(),
            description: None,
            mime_type: mime_type.unwrap_or("application/octet-stream").to_string(),
            kind: ResourceKind::Binary(data),
        })
        .await
    }

    pub async fn add_file(
        &self,
        uri: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<(), ServerError> {
        let path = path.into();
        let mime_type = detect_mime(&path).to_string();
        self.insert(Resource {
            uri: uri.into(),
            name: name.into(),
            description: None,
            mime_type,
            kind: ResourceKind::File(path),
        })
        .await
    }

    pub async fn add_text_function(
        &self,
        uri: impl Into<String>,
        name: impl Into<String>,
        mime_type: Option<&str>,
        handler: TextFn,
    ) -> Result<(), ServerError> {
        self.insert(Resource {
            uri: uri.into(),
            name: name.into(),
            description: None,
            mime_type: mime_type.unwrap_or("text/plain").to_string(),
            kind: ResourceKind::TextFunction(handler),
        })
        .await
    }

    pub async fn add_binary_function(
        &self,
        uri: impl Into<String>,
        name: impl Into<String>,
        mime_type: Option<&str>,
        handler: BinaryFn,
    ) -> Result<(), ServerError> {
        self.insert(Resource {
            uri: uri.into(),
            name: name.into(),
            description: None,
            mime_type: mime_type.unwrap_or("application/octet-stream").to_string(),
            kind: ResourceKind::BinaryFunction(handler),
        })
        .await
    }

    /// Registers but never dereferences the URL — fetching external content
    /// is out of scope for this crate.
    pub async fn add_http(
        &self,
        uri: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        mime_type: Option<&str>,
    ) -> Result<(), ServerError> {
        self.insert(Resource {
            uri: uri.into(),
            name: name.into(),
            description: None,
            mime_type: mime_type.unwrap_or("application/octet-stream").to_string(),
            kind: ResourceKind::Http(url.into()),
        })
        .await
    }

    pub async fn add_template(
        &self,
        uri_template: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
        mime_type: Option<&str>,
        handler: TemplateFn,
    ) -> Result<(), ServerError> {
        let template = UriTemplate::parse(uri_template)?;
        let mut templates = self.templates.write().await;
        templates.push(ResourceTemplate {
            template,
            name: name.into(),
            description,
            mime_type: mime_type.unwrap_or("application/octet-stream").to_string(),
            handler,
        });
        Ok(())
    }

    pub async fn has_any(&self) -> bool {
        !self.concrete.read().await.entries.is_empty() || !self.templates.read().await.is_empty()
    }

    /// `resources/templates/list`.
    pub async fn list_templates(&self) -> Value {
        let templates = self.templates.read().await;
        let rendered: Vec<Value> = templates
            .iter()
            .map(|t| {
                let mut obj = serde_json::json!({
                    "uriTemplate": t.template.raw(),
                    "name": t.name,
                    "mimeType": t.mime_type,
                });
                if let Some(desc) = &t.description {
                    obj["description"] = Value::String(desc.clone());
                }
                obj
            })
            .collect();
        serde_json::json!({ "resourceTemplates": rendered })
    }

    /// `resources/list`: concrete resources only, in registration order.
    pub async fn list(&self) -> Value {
        let inner = self.concrete.read().await;
        let resources: Vec<Value> = inner
            .order
            .iter()
            .filter_map(|uri| inner.entries.get(uri))
            .map(|r| {
                let mut obj = serde_json::json!({
                    "uri": r.uri,
                    "name": r.name,
                    "mimeType": r.mime_type,
                });
                if let Some(desc) = &r.description {
                    obj["description"] = Value::String(desc.clone());
                }
                obj
            })
            .collect();
        serde_json::json!({ "resources": resources })
    }

    /// `resources/read`: exact match first, then the first matching
    /// template in registration order, else `NotFound`.
    pub async fn read(&self, uri: &str) -> Result<Value, ResourceError> {
        if let Some(resource) = self.concrete.read().await.entries.get(uri) {
            let content = materialize(resource).await?;
            return Ok(content_envelope(uri, &resource.mime_type, content));
        }

        let templates = self.templates.read().await;
        for entry in templates.iter() {
            if let Some(captured) = entry.template.matches(uri) {
                let content = (entry.handler)(&captured)?;
                return Ok(content_envelope(uri, &entry.mime_type, content));
            }
        }

        Err(ResourceError::NotFound(uri.to_string()))
    }
}

async fn materialize(resource: &Resource) -> Result<ResourceContent, ResourceError> {
    match &resource.kind {
        ResourceKind::Text(text) => Ok(ResourceContent::Text(text.clone())),
        ResourceKind::Binary(data) => Ok(ResourceContent::Binary(data.clone())),
        ResourceKind::TextFunction(f) => f().map(ResourceContent::Text),
        ResourceKind::BinaryFunction(f) => f().map(ResourceContent::Binary),
        ResourceKind::File(path) => read_file_safely(path, &resource.mime_type).await,
        ResourceKind::Http(url) => Err(ResourceError::Unsupported(format!(
            "http resource {url} is registered but never dereferenced"
        ))),
    }
}

/// Produces the `resources/read` content entry. For binary content, the
/// current contract substitutes a text placeholder rather than a base64
/// `blob` field — see DESIGN.md for the rationale.
fn content_envelope(uri: &str, mime_type: &str, content: ResourceContent) -> Value {
    let text = match content {
        ResourceContent::Text(text) => text,
        ResourceContent::Binary(_) => "[Binary content not supported yet]".to_string(),
    };
    serde_json::json!({
        "contents": [{
            "uri": uri,
            "mimeType": mime_type,
            "text": text,
        }]
    })
}

/// Rejects absolute paths, any `..` component, and leading `.` unless the
/// path starts with `./`; rejects non-regular files and files over 1 MiB.
pub fn check_safe_path(path: &str) -> Result<(), ResourceError> {
    let p = Path::new(path);
    if p.is_absolute() {
        return Err(ResourceError::UnsafePath(path.to_string()));
    }
    if p.components().any(|c| c.as_os_str() == "..") {
        return Err(ResourceError::UnsafePath(path.to_string()));
    }
    if path.starts_with('.') && !path.starts_with("./") {
        return Err(ResourceError::UnsafePath(path.to_string()));
    }
    Ok(())
}

async fn read_file_safely(path: &str, mime_type: &str) -> Result<ResourceContent, ResourceError> {
    check_safe_path(path)?;
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| ResourceError::Io(e.to_string()))?;
    if !metadata.is_file() {
        return Err(ResourceError::UnsafePath(path.to_string()));
    }
    if metadata.len() > MAX_RESOURCE_BYTES {
        return Err(ResourceError::TooLarge(path.to_string()));
    }
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ResourceError::Io(e.to_string()))?;
    if is_text_mime(mime_type) {
        let text = String::from_utf8(bytes).map_err(|e| ResourceError::Io(e.to_string()))?;
        Ok(ResourceContent::Text(text))
    } else {
        Ok(ResourceContent::Binary(bytes))
    }
}

fn is_text_mime(mime_type: &str) -> bool {
    mime_type.starts_with("text/")
        || matches!(
            mime_type,
            "application/json" | "application/xml" | "application/javascript"
        )
}

/// Extension-keyed MIME table; unrecognized extensions fall back to
/// `application/octet-stream`.
pub fn detect_mime(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "txt" => "text/plain",
        "md" => "text/markdown",
        "json" => "application/json",
        "xml" => "application/xml",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "csv" => "text/csv",
        "c" | "h" => "text/x-c",
        "cpp" | "hpp" => "text/x-c++",
        "py" => "text/x-python",
        "rs" => "text/x-rust",
        "go" => "text/x-go",
        "java" => "text/x-java",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_excludes_templates() {
        let registry = ResourceRegistry::new();
        registry.add_text("file:///a.txt", "a", "hi", None).await.unwrap();
        registry
            .add_template(
                "file:///./{path}",
                "dynamic",
                None,
                Some("text/plain"),
                Arc::new(|captured| Ok(ResourceContent::Text(captured.to_string()))),
            )
            .await
            .unwrap();
        let listing = registry.list().await;
        assert_eq!(listing["resources"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn read_exact_match() {
        let registry = ResourceRegistry::new();
        registry.add_text("file:///a.txt", "a", "hi", None).await.unwrap();
        let result = registry.read("file:///a.txt").await.unwrap();
        assert_eq!(result["contents"][0]["text"], "hi");
    }

    #[tokio::test]
    async fn read_falls_through_to_template() {
        let registry = ResourceRegistry::new();
        registry
            .add_template(
                "greet://{name}",
                "dynamic",
                None,
                Some("text/plain"),
                Arc::new(|captured| Ok(ResourceContent::Text(format!("hello {captured}")))),
            )
            .await
            .unwrap();
        let result = registry.read("greet://world").await.unwrap();
        assert_eq!(result["contents"][0]["text"], "hello world");
    }

    #[tokio::test]
    async fn read_missing_is_not_found() {
        let registry = ResourceRegistry::new();
        let err = registry.read("file:///missing.txt").await.unwrap_err();
        assert!(matches!(err, ResourceError::NotFound(_)));
    }

    #[test]
    fn safe_path_rejects_traversal_and_absolute() {
        assert!(check_safe_path("../etc/passwd").is_err());
        assert!(check_safe_path("/etc/passwd").is_err());
        assert!(check_safe_path(".hidden").is_err());
        assert!(check_safe_path("./ok.txt").is_ok());
        assert!(check_safe_path("plain.txt").is_ok());
    }

    #[test]
    fn mime_table_covers_common_extensions() {
        assert_eq!(detect_mime("readme.md"), "text/markdown");
        assert_eq!(detect_mime("data.json"), "application/json");
        assert_eq!(detect_mime("unknownext.xyz"), "application/octet-stream");
    }

    #[tokio::test]
    async fn duplicate_uri_is_rejected() {
        let registry = ResourceRegistry::new();
        registry.add_text("file:///a.txt", "a", "hi", None).await.unwrap();
        let err = registry.add_text("file:///a.txt", "a2", "bye", None).await.unwrap_err();
        assert!(matches!(err, ServerError::ResourceExists(_)));
    }
}
