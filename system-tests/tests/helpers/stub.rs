// system-tests/tests/helpers/stub.rs
// ============================================================================
// Module: Stub Remote Endpoint
// Description: Loopback HTTP server standing in for a remote function.
// Purpose: Observe outbound proxy traffic and answer with scripted replies.
// Dependencies: tiny_http
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use tiny_http::Response;
use tiny_http::Server;

/// Computes `(status, body)` for a received request body.
pub type Responder = Arc<dyn Fn(&str) -> (u16, String) + Send + Sync>;

/// Request observed by the stub.
#[derive(Debug, Clone)]
pub struct ObservedRequest {
    /// HTTP method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Raw body.
    pub body: String,
}

/// Running stub endpoint; stops serving when dropped.
pub struct StubEndpoint {
    /// URL the proxy should POST to.
    pub url: String,
    /// Requests received so far.
    requests: Arc<Mutex<Vec<ObservedRequest>>>,
    /// Set to stop the serving thread.
    stop: Arc<AtomicBool>,
    /// Serving thread.
    worker: Option<thread::JoinHandle<()>>,
}

impl StubEndpoint {
    /// Starts a stub answering every request with `status` and `body`.
    pub fn fixed(status: u16, body: &str) -> Self {
        let body = body.to_string();
        Self::scripted(Arc::new(move |_| (status, body.clone())))
    }

    /// Starts a stub answering through `responder`.
    pub fn scripted(responder: Responder) -> Self {
        let server = Server::http("127.0.0.1:0").expect("bind stub endpoint");
        let addr = server.server_addr().to_ip().expect("stub endpoint ip address");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let worker = {
            let requests = Arc::clone(&requests);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    let mut request = match server.recv_timeout(Duration::from_millis(25)) {
                        Ok(Some(request)) => request,
                        Ok(None) => continue,
                        Err(_) => break,
                    };
                    let mut body = String::new();
                    let _ = request.as_reader().read_to_string(&mut body);
                    let (status, reply) = responder(&body);
                    requests.lock().expect("stub request log").push(ObservedRequest {
                        method: request.method().to_string(),
                        path: request.url().to_string(),
                        body,
                    });
                    let _ = request.respond(Response::from_string(reply).with_status_code(status));
                }
            })
        };
        Self {
            url: format!("http://{addr}/functions/invoke"),
            requests,
            stop,
            worker: Some(worker),
        }
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<ObservedRequest> {
        self.requests.lock().expect("stub request log").clone()
    }

    /// Returns the number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("stub request log").len()
    }
}

impl Drop for StubEndpoint {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
