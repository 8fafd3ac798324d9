#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde_json::{Value, json};

use inat_harvest::http::{HttpReply, Transport, TransportError};

type Reply = Result<HttpReply, TransportError>;

/// Replays queued replies per URL and records every request. Unscripted
/// URLs answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, url: &str, reply: Reply) {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn ok(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.push(
            url,
            Ok(HttpReply {
                status: 200,
                body: body.into(),
            }),
        );
    }

    pub fn json(&self, url: &str, body: &Value) {
        self.ok(url, serde_json::to_vec(body).unwrap());
    }

    pub fn status(&self, url: &str, status: u16) {
        self.push(
            url,
            Ok(HttpReply {
                status,
                body: Vec::new(),
            }),
        );
    }

    pub fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| called == url)
            .count()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpReply, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), query.to_vec()));
        self.routes
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(Ok(HttpReply {
                status: 404,
                body: Vec::new(),
            }))
    }
}

pub fn query_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

/// Listing observation with one public photo per entry in `photo_ids`.
pub fn observation(id: u64, species: &str, photo_ids: &[u64]) -> Value {
    let photos: Vec<Value> = photo_ids
        .iter()
        .map(|photo_id| {
            json!({
                "id": photo_id,
                "url": format!("https://static.inaturalist.org/photos/{photo_id}/square.jpg"),
                "license_code": "cc-by-nc",
            })
        })
        .collect();
    json!({
        "id": id,
        "location": "-8.13,115.36",
        "quality_grade": "research",
        "taxon": { "id": id * 10, "name": species },
        "photos": photos,
    })
}

pub fn page(observations: Vec<Value>) -> Value {
    json!({ "total_results": observations.len(), "results": observations })
}

pub fn numbered_page(start: u64, count: u64) -> Value {
    page(
        (start..start + count)
            .map(|id| observation(id, "Apis cerana", &[]))
            .collect(),
    )
}
