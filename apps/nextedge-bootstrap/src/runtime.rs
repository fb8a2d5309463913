//! Client for the Lambda custom-runtime API.
//!
//! The runtime API is a plain HTTP/1.1 endpoint on `AWS_LAMBDA_RUNTIME_API`:
//! the bootstrap long-polls `invocation/next`, then posts either a response or
//! an error for the request id it received.

use std::io::Read;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, warn};

const API_VERSION: &str = "2018-06-01";

const REQUEST_ID_HEADER: &str = "Lambda-Runtime-Aws-Request-Id";
const DEADLINE_HEADER: &str = "Lambda-Runtime-Deadline-Ms";
const TRACE_ID_HEADER: &str = "Lambda-Runtime-Trace-Id";
const FUNCTION_ARN_HEADER: &str = "Lambda-Runtime-Invoked-Function-Arn";
const ERROR_TYPE_HEADER: &str = "Lambda-Runtime-Function-Error-Type";

/// `errorType` reported when the runtime API refuses a handler response.
pub const RESPONSE_REJECTED_ERROR: &str = "ResponseRejected";

/// One event handed out by `invocation/next`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Request id used to post the result.
    pub request_id: String,
    /// Deadline as milliseconds since the Unix epoch.
    pub deadline_ms: Option<u64>,
    /// X-Ray trace header.
    pub trace_id: Option<String>,
    /// ARN of the invoked function.
    pub function_arn: Option<String>,
    /// Raw event payload.
    pub payload: Vec<u8>,
}

/// Error body understood by the runtime API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    /// Short error class name.
    pub error_type: String,
    /// Human-readable message.
    pub error_message: String,
}

impl ErrorReport {
    /// Create a report.
    #[must_use]
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            error_message: error_message.into(),
        }
    }
}

/// Blocking runtime API client.
#[derive(Debug)]
pub struct RuntimeClient {
    agent: ureq::Agent,
    base_url: String,
}

impl RuntimeClient {
    /// Create a client for the API at `host:port`.
    #[must_use]
    pub fn new(api: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            base_url: format!("http://{api}/{API_VERSION}/runtime"),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Block until the next invocation is available.
    pub fn next_invocation(&self) -> Result<Invocation> {
        let response = self
            .agent
            .get(&self.url("invocation/next"))
            .call()
            .context("failed to fetch next invocation")?;

        let request_id = response
            .header(REQUEST_ID_HEADER)
            .context("invocation is missing its request id")?
            .to_owned();
        let deadline_ms = response
            .header(DEADLINE_HEADER)
            .and_then(|v| v.parse().ok());
        let trace_id = response.header(TRACE_ID_HEADER).map(str::to_owned);
        let function_arn = response.header(FUNCTION_ARN_HEADER).map(str::to_owned);

        let mut payload = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut payload)
            .context("failed to read invocation payload")?;

        debug!(request_id, bytes = payload.len(), "Received invocation");

        Ok(Invocation {
            request_id,
            deadline_ms,
            trace_id,
            function_arn,
            payload,
        })
    }

    /// Post the result of an invocation.
    pub fn send_response(&self, request_id: &str, body: &serde_json::Value) -> Result<()> {
        let body = serde_json::to_vec(body).context("failed to encode response")?;
        self.agent
            .post(&self.url(&format!("invocation/{request_id}/response")))
            .set("Content-Type", "application/json")
            .send_bytes(&body)
            .with_context(|| format!("failed to post response for {request_id}"))?;
        Ok(())
    }

    /// Post the result of an invocation, reporting it as failed if the runtime
    /// API rejects the response (e.g. `413` for an oversized payload).
    ///
    /// Errors only when the error report cannot be delivered either.
    pub fn send_response_or_error(&self, request_id: &str, body: &serde_json::Value) -> Result<()> {
        match self.send_response(request_id, body) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(request_id, error = %format!("{err:#}"), "Response rejected, reporting invocation error");
                self.send_error(
                    request_id,
                    &ErrorReport::new(RESPONSE_REJECTED_ERROR, format!("{err:#}")),
                )
            }
        }
    }

    /// Report a failed invocation.
    pub fn send_error(&self, request_id: &str, report: &ErrorReport) -> Result<()> {
        self.post_error(&format!("invocation/{request_id}/error"), report)
            .with_context(|| format!("failed to post error for {request_id}"))
    }

    /// Report a failure before the first invocation.
    pub fn send_init_error(&self, report: &ErrorReport) -> Result<()> {
        self.post_error("init/error", report)
            .context("failed to post initialization error")
    }

    fn post_error(&self, path: &str, report: &ErrorReport) -> Result<()> {
        let body = serde_json::to_vec(report)?;
        self.agent
            .post(&self.url(path))
            .set("Content-Type", "application/json")
            .set(ERROR_TYPE_HEADER, &report.error_type)
            .send_bytes(&body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    /// Answer one connection per canned response, in order, and return the raw
    /// requests received.
    fn serve(responses: &'static [&'static str]) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let handle = thread::spawn(move || {
            responses
                .iter()
                .map(|response| {
                    let (stream, _) = listener.accept().unwrap();
                    let mut reader = BufReader::new(stream);
                    let mut request = String::new();
                    let mut content_length = 0usize;
                    loop {
                        let mut line = String::new();
                        reader.read_line(&mut line).unwrap();
                        if let Some(len) = line
                            .to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse().unwrap())
                        {
                            content_length = len;
                        }
                        request.push_str(&line);
                        if line == "\r\n" {
                            break;
                        }
                    }
                    let mut body = vec![0; content_length];
                    reader.read_exact(&mut body).unwrap();
                    request.push_str(&String::from_utf8(body).unwrap());

                    let mut stream = reader.into_inner();
                    stream.write_all(response.as_bytes()).unwrap();
                    stream.flush().unwrap();
                    request
                })
                .collect()
        });

        (addr, handle)
    }

    const ACCEPTED: &str = "HTTP/1.1 202 Accepted\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

    #[test]
    fn test_should_build_versioned_urls() {
        let client = RuntimeClient::new("127.0.0.1:9001");
        assert_eq!(
            client.url("invocation/next"),
            "http://127.0.0.1:9001/2018-06-01/runtime/invocation/next"
        );
    }

    #[test]
    fn test_should_serialize_error_report() {
        let report = ErrorReport::new("UnexpectedOrigin", "bad origin");
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"errorType":"UnexpectedOrigin","errorMessage":"bad origin"}"#
        );
    }

    #[test]
    fn test_should_read_next_invocation() {
        let (addr, server) = serve(&["HTTP/1.1 200 OK\r\n\
             Lambda-Runtime-Aws-Request-Id: 8476a536-e9f4-11e8-9739-2dfe598c3fcd\r\n\
             Lambda-Runtime-Deadline-Ms: 1542409706888\r\n\
             Lambda-Runtime-Trace-Id: Root=1-5bef4de7-ad49b0e87f6ef6c87fc2e700\r\n\
             Content-Type: application/json\r\n\
             Content-Length: 2\r\n\
             Connection: close\r\n\
             \r\n\
             {}"]);

        let invocation = RuntimeClient::new(&addr).next_invocation().unwrap();
        assert_eq!(invocation.request_id, "8476a536-e9f4-11e8-9739-2dfe598c3fcd");
        assert_eq!(invocation.deadline_ms, Some(1_542_409_706_888));
        assert!(invocation.trace_id.unwrap().starts_with("Root=1-"));
        assert!(invocation.function_arn.is_none());
        assert_eq!(invocation.payload, b"{}");

        let request = server.join().unwrap().remove(0);
        assert!(request.starts_with("GET /2018-06-01/runtime/invocation/next HTTP/1.1"));
    }

    #[test]
    fn test_should_post_error_with_type_header() {
        let (addr, server) = serve(&[ACCEPTED]);

        RuntimeClient::new(&addr)
            .send_error("req-1", &ErrorReport::new("MissingHost", "no host"))
            .unwrap();

        let request = server.join().unwrap().remove(0);
        assert!(request.starts_with("POST /2018-06-01/runtime/invocation/req-1/error HTTP/1.1"));
        assert!(
            request
                .to_ascii_lowercase()
                .contains("lambda-runtime-function-error-type: missinghost")
        );
        assert!(request.ends_with(r#"{"errorType":"MissingHost","errorMessage":"no host"}"#));
    }

    #[test]
    fn test_should_report_error_when_response_is_rejected() {
        let (addr, server) = serve(&[
            "HTTP/1.1 413 Payload Too Large\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            ACCEPTED,
        ]);

        RuntimeClient::new(&addr)
            .send_response_or_error("req-2", &serde_json::json!({"uri": "/"}))
            .unwrap();

        let requests = server.join().unwrap();
        assert!(requests[0].starts_with("POST /2018-06-01/runtime/invocation/req-2/response HTTP/1.1"));
        assert!(requests[1].starts_with("POST /2018-06-01/runtime/invocation/req-2/error HTTP/1.1"));
        assert!(requests[1].contains(r#""errorType":"ResponseRejected""#));
    }

    #[test]
    fn test_should_not_report_error_when_response_is_accepted() {
        let (addr, server) = serve(&[ACCEPTED]);

        RuntimeClient::new(&addr)
            .send_response_or_error("req-3", &serde_json::json!({"uri": "/"}))
            .unwrap();

        let requests = server.join().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].ends_with(r#"{"uri":"/"}"#));
    }
}
