//! Blocking HTTP client for the daemon API.
//!
//! Every command prints the daemon's `message` line when the body carries
//! one, the raw body otherwise, and the bare status for empty responses.

use reqwest::blocking::Response;
use reqwest::Method;

pub struct Client {
    base: String,
    http: reqwest::blocking::Client,
}

impl Client {
    pub fn new(base: String) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            http: reqwest::blocking::Client::new(),
        }
    }

    pub fn get(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.call(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.call(Method::POST, path)
    }

    fn call(&self, method: Method, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let url = format!("{}{path}", self.base);
        let response = self.http.request(method, &url).send()?;
        print_response(response)
    }
}

fn print_response(response: Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = response.status();
    let body = response.text()?;
    if body.is_empty() {
        println!("{status}");
        return Ok(());
    }
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(value) => match value.get("message").and_then(|m| m.as_str()) {
            Some(message) => println!("{message}"),
            None => println!("{body}"),
        },
        Err(_) => println!("{body}"),
    }
    Ok(())
}
