use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use serde_json::Value;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// 500 with a plain-text body.
    ServerError,
    /// 200 with `success: false`.
    Rejected,
    /// Holds the request open longer than any client timeout in the tests.
    Stall,
}

#[derive(Debug, Clone, Default)]
pub struct CounterStubConfig {
    pub counts: HashMap<u64, u64>,
    pub faults: HashMap<u64, Fault>,
}

pub struct CounterStub {
    pub endpoint: String,
    counts: Arc<Mutex<HashMap<u64, u64>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CounterStub {
    pub fn spawn(config: CounterStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start counter stub server");
        let addr = server.server_addr();
        let endpoint = format!("http://{addr}/api/views");

        let counts = Arc::new(Mutex::new(config.counts));
        let faults = Arc::new(config.faults);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let server_counts = Arc::clone(&counts);
        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let counts = Arc::clone(&server_counts);
                let faults = Arc::clone(&faults);
                thread::spawn(move || handle_request(request, &counts, &faults));
            }
        });

        Self {
            endpoint,
            counts,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    #[allow(dead_code)]
    pub fn count(&self, post_id: u64) -> Option<u64> {
        self.counts.lock().expect("counts lock").get(&post_id).copied()
    }
}

impl Drop for CounterStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn handle_request(
    mut request: tiny_http::Request,
    counts: &Mutex<HashMap<u64, u64>>,
    faults: &HashMap<u64, Fault>,
) {
    if request.method() != &tiny_http::Method::Post || request.url() != "/api/views" {
        let _ = request.respond(tiny_http::Response::from_string("not found").with_status_code(404));
        return;
    }

    let mut body = String::new();
    if request.as_reader().read_to_string(&mut body).is_err() {
        let _ = request
            .respond(tiny_http::Response::from_string("invalid request body").with_status_code(400));
        return;
    }

    let parsed: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(_) => {
            let _ = request
                .respond(tiny_http::Response::from_string("invalid json").with_status_code(400));
            return;
        }
    };

    let (Some(post_id), Some(action)) = (
        parsed.get("postId").and_then(Value::as_u64),
        parsed.get("action").and_then(Value::as_str),
    ) else {
        respond_json(
            request,
            serde_json::json!({ "success": false, "message": "postId and action are required" }),
        );
        return;
    };

    match faults.get(&post_id) {
        Some(Fault::ServerError) => {
            let _ = request
                .respond(tiny_http::Response::from_string("internal error").with_status_code(500));
            return;
        }
        Some(Fault::Rejected) => {
            respond_json(
                request,
                serde_json::json!({ "success": false, "message": "counter unavailable" }),
            );
            return;
        }
        Some(Fault::Stall) => {
            thread::sleep(Duration::from_secs(2));
        }
        None => {}
    }

    let increment = match action {
        "get" => false,
        "increment" => true,
        other => {
            respond_json(
                request,
                serde_json::json!({ "success": false, "message": format!("unknown action: {other}") }),
            );
            return;
        }
    };

    let view_count = {
        let mut counts = counts.lock().expect("counts lock");
        let entry = counts.entry(post_id).or_insert(0);
        if increment {
            *entry += 1;
        }
        *entry
    };

    respond_json(
        request,
        serde_json::json!({ "success": true, "viewCount": view_count }),
    );
}

fn respond_json(request: tiny_http::Request, body: Value) {
    let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("build header");
    let response = tiny_http::Response::from_string(body.to_string())
        .with_status_code(200)
        .with_header(header);
    let _ = request.respond(response);
}
