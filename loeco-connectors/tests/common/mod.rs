//! Test utilities for source integration tests
//!
//! This module provides:
//! - A canned HTTP server on a loopback port
//! - Uplink and SSE body builders shaped like the storage integration

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use tiny_http::{Header, Response, Server};

/// One scripted response
pub struct Canned {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Canned {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn event_stream(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/event-stream",
            body,
        }
    }
}

/// Serves the scripted responses in order, one per request
pub struct CannedServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    handle: Option<JoinHandle<()>>,
}

impl CannedServer {
    pub fn start(responses: Vec<Canned>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let base_url = format!("http://{}", addr);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        let handle = thread::spawn(move || {
            for canned in responses {
                let Ok(request) = server.recv() else { return };

                let mut head = format!("{} {}\n", request.method(), request.url());
                for header in request.headers() {
                    head.push_str(&format!("{}: {}\n", header.field, header.value));
                }
                seen.lock().unwrap().push(head);

                let content_type = Header::from_bytes(&b"Content-Type"[..], canned.content_type.as_bytes()).unwrap();
                let response = Response::from_string(canned.body)
                    .with_status_code(canned.status)
                    .with_header(content_type);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            handle: Some(handle),
        }
    }

    /// Requests received so far: request line, then one line per header
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Wait until every scripted response was served
    pub fn finish(mut self) -> Vec<String> {
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
        self.requests()
    }
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap()
}

/// Storage-integration event for one uplink
pub fn uplink(device: &str, at: DateTime<Utc>, f_cnt: u32, temp_c: f64) -> String {
    json!({
        "result": {
            "end_device_ids": {"device_id": device},
            "received_at": at.to_rfc3339(),
            "uplink_message": {
                "f_cnt": f_cnt,
                "decoded_payload": {"TempC_SHT": temp_c, "Hum_SHT": 60.0, "BatV": 3.31}
            }
        }
    })
    .to_string()
}

/// Three hours of 5-minute uplinks per device, as an SSE body
pub fn sse_body(devices: &[&str]) -> String {
    let mut body = String::from(": stream start\n\n");
    for device in devices {
        for i in 0..36u32 {
            let at = start() + Duration::minutes(5 * i as i64);
            let temp = 15.0 + 0.2 * (i as f64 * 0.7).sin();
            body.push_str(&format!("data: {}\n\n", uplink(device, at, i, temp)));
        }
    }
    body
}
