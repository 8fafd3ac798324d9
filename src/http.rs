use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use tracing::info;

use crate::error::HarvestError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Timeout(String),
    Connect(String),
    Other(String),
}

impl TransportError {
    pub fn message(&self) -> &str {
        match self {
            TransportError::Timeout(message)
            | TransportError::Connect(message)
            | TransportError::Other(message) => message,
        }
    }
}

pub trait Transport: Send + Sync {
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpReply, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpReply, TransportError> {
        (**self).get(url, query)
    }
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(credential: Option<&str>) -> Result<Self, HarvestError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("inat-harvest/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| HarvestError::ApiHttp(err.to_string()))?,
        );
        match credential {
            Some(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|err| HarvestError::ApiHttp(err.to_string()))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
                info!("using authenticated API access");
            }
            None => info!("using public API access"),
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| HarvestError::ApiHttp(err.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpReply, TransportError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(classify_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(classify_error)?;
        Ok(HttpReply {
            status,
            body: body.to_vec(),
        })
    }
}

fn classify_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() || dropped_connection(&err) {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

fn dropped_connection(err: &reqwest::Error) -> bool {
    (err.is_request() || err.is_body())
        && !err.is_builder()
        && !err.is_redirect()
        && !err.is_decode()
}
