use std::sync::Arc;

use poll_promise::Promise;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{Error, Profile, Result, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub bytes: Vec<u8>,
}

impl HttpResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub type OnResponse = Box<dyn FnOnce(std::result::Result<HttpResponse, String>) + Send>;

/// Anything that can carry a request to the generator server and call back
/// exactly once with the outcome.
pub trait HttpClient: Send + Sync {
    fn fetch(&self, request: HttpRequest, on_done: OnResponse);
}

/// The production client, backed by `ehttp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EhttpClient;

impl HttpClient for EhttpClient {
    fn fetch(&self, request: HttpRequest, on_done: OnResponse) {
        let mut req = match request.method {
            Method::Get => ehttp::Request::get(&request.url),
            Method::Post | Method::Delete => {
                let mut req = ehttp::Request::post(&request.url, request.body);
                req.method = request.method.as_str().to_owned();
                req
            }
        };

        if let Some(content_type) = request.content_type {
            req.headers = ehttp::Headers::new(&[("Content-Type", content_type)]);
        }

        ehttp::fetch(req, move |response: std::result::Result<ehttp::Response, String>| {
            on_done(response.map(|resp| HttpResponse {
                status: resp.status,
                bytes: resp.bytes,
            }))
        });
    }
}

#[derive(Debug, Deserialize)]
struct ServerError {
    error: String,
}

/// Turn a raw response into a result, pulling the server's `{"error": ...}`
/// text out of failed responses when it sent one.
fn check_response(response: std::result::Result<HttpResponse, String>) -> Result<Vec<u8>> {
    let resp = response.map_err(Error::Transport)?;
    if resp.ok() {
        return Ok(resp.bytes);
    }

    let message = match serde_json::from_slice::<ServerError>(&resp.bytes) {
        Ok(err) => err.error,
        Err(_) => String::from_utf8_lossy(&resp.bytes).into_owned(),
    };

    Err(Error::Http {
        status: resp.status,
        message,
    })
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StartedTime {
    pub time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewNode<'a> {
    #[serde(rename = "nodeType")]
    pub node_type: &'a str,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CreatedNode {
    #[serde(rename = "nodeID")]
    pub node_id: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NodeConnection {
    #[serde(rename = "nodeOutId")]
    pub out_node: String,
    #[serde(rename = "outPortName")]
    pub out_port: String,
    #[serde(rename = "nodeInId")]
    pub in_node: String,
    #[serde(rename = "inPortName")]
    pub in_port: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NodeInput {
    #[serde(rename = "nodeId")]
    pub node: String,
    #[serde(rename = "inPortName")]
    pub in_port: String,
}

/// Request/response facade for every call the viewer makes to the generator
/// server. Each call returns a promise that resolves on a later frame.
#[derive(Clone)]
pub struct RequestManager {
    base: String,
    client: Arc<dyn HttpClient>,
}

impl RequestManager {
    pub fn new(base: impl Into<String>, client: Arc<dyn HttpClient>) -> Self {
        let base = base.into().trim_end_matches('/').to_owned();
        Self { base, client }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Issue `request` and decode a successful body with `decode`.
    fn send_with<T>(
        &self,
        request: HttpRequest,
        decode: impl FnOnce(Vec<u8>) -> Result<T> + Send + 'static,
    ) -> Promise<Result<T>>
    where
        T: Send + 'static,
    {
        debug!("{} {}", request.method.as_str(), request.url);
        let (sender, promise) = Promise::new();
        self.client.fetch(
            request,
            Box::new(move |response| sender.send(check_response(response).and_then(decode))),
        );
        promise
    }

    fn send_json<T>(&self, request: HttpRequest) -> Promise<Result<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.send_with(request, |bytes| Ok(serde_json::from_slice::<T>(&bytes)?))
    }

    fn send_empty(&self, request: HttpRequest) -> Promise<Result<()>> {
        self.send_with(request, |_| Ok(()))
    }

    fn json_request(&self, method: Method, path: &str, body: &impl Serialize) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method,
            url: self.url(path),
            content_type: Some("application/json"),
            body: serde_json::to_vec(body)?,
        })
    }

    fn get_request(&self, path: &str) -> HttpRequest {
        HttpRequest {
            method: Method::Get,
            url: self.url(path),
            content_type: None,
            body: Vec::new(),
        }
    }

    pub fn get_json<T>(&self, path: &str) -> Promise<Result<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.send_json(self.get_request(path))
    }

    /// POST a JSON body. The response body is ignored beyond its status.
    pub fn post_json(&self, path: &str, body: &impl Serialize) -> Promise<Result<()>> {
        match self.json_request(Method::Post, path, body) {
            Ok(request) => self.send_empty(request),
            Err(err) => Promise::from_ready(Err(err)),
        }
    }

    pub fn post_bytes(&self, path: &str, body: Vec<u8>) -> Promise<Result<()>> {
        self.send_empty(HttpRequest {
            method: Method::Post,
            url: self.url(path),
            content_type: Some("application/octet-stream"),
            body,
        })
    }

    pub fn delete(&self, path: &str, body: &impl Serialize) -> Promise<Result<()>> {
        match self.json_request(Method::Delete, path, body) {
            Ok(request) => self.send_empty(request),
            Err(err) => Promise::from_ready(Err(err)),
        }
    }

    pub fn fetch_text(&self, path: &str) -> Promise<Result<String>> {
        self.send_with(self.get_request(path), |bytes| {
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        })
    }

    pub fn fetch_binary(&self, path: &str) -> Promise<Result<Vec<u8>>> {
        self.send_with(self.get_request(path), Ok)
    }

    pub fn started_time(&self) -> Promise<Result<StartedTime>> {
        self.get_json("/started")
    }

    pub fn schema(&self) -> Promise<Result<Schema>> {
        self.get_json("/schema")
    }

    pub fn post_profile(&self, profile: &Profile) -> Promise<Result<()>> {
        self.post_json("/profile", profile)
    }

    pub fn set_parameter_value(&self, id: &str, value: ParameterValue) -> Promise<Result<()>> {
        let path = format!("/parameter/value/{}", urlencoding::encode(id));
        match value {
            ParameterValue::Json(value) => self.post_json(&path, &value),
            ParameterValue::Binary(bytes) => self.post_bytes(&path, bytes),
        }
    }

    pub fn producer(&self, name: &str) -> Promise<Result<Vec<u8>>> {
        self.fetch_binary(&producer_path(name))
    }

    pub fn zip(&self) -> Promise<Result<Vec<u8>>> {
        self.fetch_binary("/zip")
    }

    pub fn mermaid(&self) -> Promise<Result<String>> {
        self.fetch_text("/mermaid")
    }

    pub fn create_node(&self, node_type: &str) -> Promise<Result<CreatedNode>> {
        match self.json_request(Method::Post, "/node", &NewNode { node_type }) {
            Ok(request) => self.send_json(request),
            Err(err) => Promise::from_ready(Err(err)),
        }
    }

    pub fn delete_node(&self, node_id: &str) -> Promise<Result<()>> {
        self.delete("/node", &serde_json::json!({ "nodeID": node_id }))
    }

    pub fn set_node_input_connection(&self, connection: &NodeConnection) -> Promise<Result<()>> {
        self.post_json("/node/connection", connection)
    }

    pub fn delete_node_input(&self, input: &NodeInput) -> Promise<Result<()>> {
        self.delete("/node/connection", input)
    }
}

pub fn producer_path(name: &str) -> String {
    format!("/producer/value/{}", urlencoding::encode(name))
}

/// A parameter value headed for `/parameter/value/<id>`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Json(Value),
    Binary(Vec<u8>),
}

impl ParameterValue {
    pub fn is_binary(&self) -> bool {
        matches!(self, ParameterValue::Binary(_))
    }

    /// The value as it should appear in the local schema copy.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ParameterValue::Json(value) => Some(value),
            ParameterValue::Binary(_) => None,
        }
    }
}

/// Take the value of a finished promise, leaving `None` behind. Returns
/// `None` while the promise is still pending.
pub fn take_ready<T: Send + 'static>(slot: &mut Option<Promise<T>>) -> Option<T> {
    if slot.as_ref()?.ready().is_none() {
        return None;
    }
    slot.take().map(|promise| promise.block_and_take())
}
