//! HTTP traffic probes

use std::time::Duration;

use crate::common::{Error, Result};
use crate::driver::{Params, Step};

/// Issue a GET and assert on the response
#[derive(Debug, Clone)]
pub struct HttpGet {
    url: String,
    headers: Vec<(String, String)>,
    expect_status: u16,
    body_contains: Option<String>,
    timeout: Duration,
}

impl HttpGet {
    /// `url` is expanded against the parameters, e.g.
    /// `http://127.0.0.1:{{.Ports.AppToClient}}/echo`
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            headers: Vec::new(),
            expect_status: 200,
            body_contains: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn expect_status(mut self, status: u16) -> Self {
        self.expect_status = status;
        self
    }

    pub fn body_contains(mut self, text: &str) -> Self {
        self.body_contains = Some(text.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Step for HttpGet {
    fn run(&mut self, params: &mut Params) -> Result<()> {
        let url = params.fill(&self.url)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        let mut request = client.get(&url);
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), params.fill(value)?);
        }

        tracing::debug!(%url, "sending GET");
        let response = request.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        if status != self.expect_status {
            return Err(Error::TestAssertion(format!(
                "GET {}: expected status {}, got {}",
                url, self.expect_status, status
            )));
        }

        if let Some(expected) = &self.body_contains {
            let expected = params.fill(expected)?;
            if !body.contains(&expected) {
                return Err(Error::TestAssertion(format!(
                    "GET {}: body does not contain '{}'. Got: '{}'",
                    url,
                    expected,
                    if body.len() > 200 {
                        format!("{}...", body.chars().take(200).collect::<String>())
                    } else {
                        body
                    }
                )));
            }
        }
        Ok(())
    }

    fn cleanup(&mut self) {}

    fn name(&self) -> String {
        format!("GET {}", self.url)
    }
}
