// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! An in-memory Kubernetes API server for tests.
//!
//! Objects are stored by path, collections are listed with label selector
//! support, creates answer 409 AlreadyExists for taken names, replaces
//! answer 409 Conflict on a stale resourceVersion. Failures can be injected
//! per method and path prefix, and responses can be delayed the same way.

use http::{Request, Response};
use http_body_util::BodyExt;
use k8s_openapi::api::core::v1::Secret;
use kube::client::Body;
use kube::{Client, Resource};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ObjectKey {
    /// `/api/v1` or `/apis/<group>/<version>`
    base: String,
    plural: String,
    namespace: Option<String>,
    name: String,
}

enum Target {
    Collection {
        base: String,
        plural: String,
        namespace: Option<String>,
    },
    Object(ObjectKey),
}

#[derive(Default)]
struct State {
    objects: BTreeMap<ObjectKey, Value>,
    failures: Vec<(String, String, u16)>,
    delays: Vec<(String, String, Duration)>,
    requests: Vec<(String, String)>,
    resource_version: u64,
}

#[derive(Clone, Default)]
pub struct FakeApiServer {
    state: Arc<Mutex<State>>,
}

impl FakeApiServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request whose method matches and whose path starts with
    /// `path_prefix` with the given status code
    pub fn fail(self, method: &str, path_prefix: &str, status: u16) -> Self {
        self.state.lock().unwrap().failures.push((
            method.to_string(),
            path_prefix.to_string(),
            status,
        ));
        self
    }

    /// Hold every matching request for `delay` before answering it
    pub fn delay(self, method: &str, path_prefix: &str, delay: Duration) -> Self {
        self.state.lock().unwrap().delays.push((
            method.to_string(),
            path_prefix.to_string(),
            delay,
        ));
        self
    }

    fn delay_for(&self, method: &str, path: &str) -> Option<Duration> {
        self.state
            .lock()
            .unwrap()
            .delays
            .iter()
            .find(|(m, p, _)| m == method && path.starts_with(p.as_str()))
            .map(|(_, _, delay)| *delay)
    }

    /// Build a kube Client talking to this server
    pub fn client(&self) -> Client {
        Client::new(self.clone(), "default")
    }

    /// Seed an object without going through the client
    pub fn insert<K>(&self, obj: &K)
    where
        K: Resource + Serialize,
        K::DynamicType: Default,
    {
        let collection = K::url_path(&K::DynamicType::default(), obj.meta().namespace.as_deref());
        let name = obj.meta().name.clone().unwrap_or_default();
        let Some(Target::Collection {
            base,
            plural,
            namespace,
        }) = parse_path(&collection)
        else {
            panic!("unexpected collection path {}", collection);
        };

        let mut value = serde_json::to_value(obj).unwrap();
        let mut state = self.state.lock().unwrap();
        state.resource_version += 1;
        value["metadata"]["resourceVersion"] = Value::String(state.resource_version.to_string());
        state.objects.insert(
            ObjectKey {
                base,
                plural,
                namespace,
                name,
            },
            value,
        );
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        let state = self.state.lock().unwrap();
        state
            .objects
            .get(&ObjectKey {
                base: "/api/v1".to_string(),
                plural: "secrets".to_string(),
                namespace: Some(namespace.to_string()),
                name: name.to_string(),
            })
            .map(|v| serde_json::from_value(v.clone()).unwrap())
    }

    /// Names of all secrets in a namespace, sorted
    pub fn secret_names(&self, namespace: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .objects
            .keys()
            .filter(|k| k.plural == "secrets" && k.namespace.as_deref() == Some(namespace))
            .map(|k| k.name.clone())
            .collect()
    }

    /// Every (method, path) received so far
    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().requests.clone()
    }

    fn handle(&self, method: &str, path: &str, query: Option<&str>, body: &[u8]) -> (u16, Value) {
        let mut state = self.state.lock().unwrap();
        state.requests.push((method.to_string(), path.to_string()));

        if let Some((_, _, status)) = state
            .failures
            .iter()
            .find(|(m, p, _)| m == method && path.starts_with(p.as_str()))
        {
            return (*status, status_json(*status, "InternalError", "injected failure"));
        }

        let Some(target) = parse_path(path) else {
            return (404, status_json(404, "NotFound", "unknown path"));
        };

        match (method, target) {
            ("GET", Target::Object(key)) => match state.objects.get(&key) {
                Some(obj) => (200, obj.clone()),
                None => not_found(&key),
            },
            (
                "GET",
                Target::Collection {
                    base,
                    plural,
                    namespace,
                },
            ) => {
                let selector = query.and_then(label_selector).unwrap_or_default();
                let items: Vec<Value> = state
                    .objects
                    .iter()
                    .filter(|(k, _)| {
                        k.base == base
                            && k.plural == plural
                            && (namespace.is_none() || k.namespace == namespace)
                    })
                    .filter(|(_, v)| selector_matches(&selector, v))
                    .map(|(_, v)| v.clone())
                    .collect();
                (
                    200,
                    serde_json::json!({
                        "apiVersion": "v1",
                        "kind": "List",
                        "metadata": { "resourceVersion": state.resource_version.to_string() },
                        "items": items,
                    }),
                )
            }
            (
                "POST",
                Target::Collection {
                    base,
                    plural,
                    namespace,
                },
            ) => {
                let Ok(mut obj) = serde_json::from_slice::<Value>(body) else {
                    return (400, status_json(400, "BadRequest", "invalid body"));
                };
                let name = obj["metadata"]["name"].as_str().unwrap_or_default().to_string();
                let key = ObjectKey {
                    base,
                    plural,
                    namespace: namespace.clone(),
                    name,
                };
                if state.objects.contains_key(&key) {
                    return (
                        409,
                        status_json(409, "AlreadyExists", &format!("{} already exists", key.name)),
                    );
                }
                state.resource_version += 1;
                if let Some(ns) = namespace {
                    obj["metadata"]["namespace"] = Value::String(ns);
                }
                obj["metadata"]["resourceVersion"] =
                    Value::String(state.resource_version.to_string());
                state.objects.insert(key, obj.clone());
                (201, obj)
            }
            ("PUT", Target::Object(key)) => {
                let Ok(mut obj) = serde_json::from_slice::<Value>(body) else {
                    return (400, status_json(400, "BadRequest", "invalid body"));
                };
                let Some(existing) = state.objects.get(&key) else {
                    return not_found(&key);
                };
                let sent = obj["metadata"]["resourceVersion"].as_str();
                if sent.is_some() && sent != existing["metadata"]["resourceVersion"].as_str() {
                    return (409, status_json(409, "Conflict", "the object has been modified"));
                }
                state.resource_version += 1;
                obj["metadata"]["resourceVersion"] =
                    Value::String(state.resource_version.to_string());
                state.objects.insert(key, obj.clone());
                (200, obj)
            }
            ("DELETE", Target::Object(key)) => match state.objects.remove(&key) {
                Some(obj) => (200, obj),
                None => not_found(&key),
            },
            _ => (405, status_json(405, "MethodNotAllowed", "not supported")),
        }
    }
}

impl Service<Request<Body>> for FakeApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let server = self.clone();
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let query = req.uri().query().map(str::to_string);
        let delay = server.delay_for(&method, &path);

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let body = req.into_body().collect().await?.to_bytes();
            let (status, value) = server.handle(&method, &path, query.as_deref(), &body);
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(value.to_string().into_bytes()))?)
        })
    }
}

fn parse_path(path: &str) -> Option<Target> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let (base, rest) = match segments.as_slice() {
        ["api", version, rest @ ..] => (format!("/api/{}", version), rest),
        ["apis", group, version, rest @ ..] => (format!("/apis/{}/{}", group, version), rest),
        _ => return None,
    };

    let target = match rest {
        ["namespaces", ns, plural] => Target::Collection {
            base,
            plural: plural.to_string(),
            namespace: Some(ns.to_string()),
        },
        ["namespaces", ns, plural, name] => Target::Object(ObjectKey {
            base,
            plural: plural.to_string(),
            namespace: Some(ns.to_string()),
            name: name.to_string(),
        }),
        [plural] => Target::Collection {
            base,
            plural: plural.to_string(),
            namespace: None,
        },
        [plural, name] => Target::Object(ObjectKey {
            base,
            plural: plural.to_string(),
            namespace: None,
            name: name.to_string(),
        }),
        _ => return None,
    };
    Some(target)
}

fn label_selector(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "labelSelector")
        .map(|(_, v)| v.into_owned())
}

fn selector_matches(selector: &str, obj: &Value) -> bool {
    let labels = &obj["metadata"]["labels"];
    let label = |key: &str| labels.get(key.trim()).and_then(Value::as_str);

    selector
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .all(|term| {
            if let Some((k, v)) = term.split_once("!=") {
                label(k) != Some(v.trim())
            } else if let Some((k, v)) = term.split_once("==").or_else(|| term.split_once('=')) {
                label(k) == Some(v.trim())
            } else if let Some(k) = term.strip_prefix('!') {
                label(k).is_none()
            } else {
                label(term).is_some()
            }
        })
}

fn not_found(key: &ObjectKey) -> (u16, Value) {
    (
        404,
        status_json(404, "NotFound", &format!("{} \"{}\" not found", key.plural, key.name)),
    )
}

fn status_json(code: u16, reason: &str, message: &str) -> Value {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_matches() {
        let obj = serde_json::json!({ "metadata": { "labels": { "a": "1", "b": "2" } } });
        assert!(selector_matches("a=1", &obj));
        assert!(selector_matches("a==1,b=2", &obj));
        assert!(selector_matches("a", &obj));
        assert!(selector_matches("c!=3", &obj));
        assert!(selector_matches("!c", &obj));
        assert!(!selector_matches("a=2", &obj));
        assert!(!selector_matches("c", &obj));
    }

    #[test]
    fn test_parse_namespaced_object_path() {
        match parse_path("/api/v1/namespaces/cluster-a/secrets/s1") {
            Some(Target::Object(key)) => {
                assert_eq!(key.namespace.as_deref(), Some("cluster-a"));
                assert_eq!(key.name, "s1");
            }
            _ => panic!("expected object target"),
        }
    }

    #[test]
    fn test_parse_cluster_scoped_collection_path() {
        assert!(matches!(
            parse_path("/apis/multicluster.odf.openshift.io/v1alpha1/mirrorpeers"),
            Some(Target::Collection { namespace: None, .. })
        ));
    }
}
