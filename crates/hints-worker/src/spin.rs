//! Spin component integration.
//!
//! Adapts the Spin incoming request to [`ClientRequest`], implements
//! [`OutboundClient`] on top of `spin_sdk::http::send`, and exports the
//! component entry point. One cache instance lives per component instance,
//! the platform tears it down with the instance.

use std::cell::RefCell;
use std::rc::Rc;

use spin_sdk::http::{Fields, IncomingRequest, OutgoingResponse, Request, Response, ResponseOutparam};
use spin_sdk::http_component;

use hints_cache::LinkHeaderCache;
use hints_core::{
    bounded, ClientRequest, FetchError, FetchOptions, FetchResponse, HintsConfig, OutboundClient,
};

use crate::on_client_request;

thread_local! {
    static CACHE: Rc<LinkHeaderCache> = Rc::new(LinkHeaderCache::new(HintsConfig::request_url()));
}

/// Outbound client backed by Spin subrequests.
///
/// `options.timeout` is enforced locally: the subrequest races a deadline
/// and is dropped once the bound passes.
pub struct SpinOutboundClient;

#[async_trait::async_trait(?Send)]
impl OutboundClient for SpinOutboundClient {
    async fn send(&self, url: &str, options: &FetchOptions) -> Result<FetchResponse, FetchError> {
        let mut builder = Request::get(url);
        for (name, value) in &options.headers {
            builder.header(name, value);
        }

        let response: Response = bounded(
            spin_sdk::http::send::<_, Response>(builder.build()),
            options.timeout,
        )
        .await?
        .map_err(|e| FetchError::Connection(e.to_string()))?;

        let mut headers = http::HeaderMap::new();
        for (name, value) in response.headers() {
            let name = match http::header::HeaderName::try_from(name.as_str()) {
                Ok(name) => name,
                Err(_) => continue,
            };
            if let Some(value) = value.as_str() {
                if let Ok(value) = http::header::HeaderValue::from_str(value) {
                    headers.append(name, value);
                }
            }
        }

        Ok(FetchResponse::new(*response.status(), headers))
    }
}

/// Incoming request adapter recording variables for the delivery layer.
struct SpinClientRequest {
    url: String,
    headers: Vec<(String, Vec<u8>)>,
    variables: RefCell<Vec<(String, String)>>,
}

impl SpinClientRequest {
    fn from_incoming(req: &IncomingRequest) -> Self {
        Self {
            url: req.uri(),
            headers: req.headers().entries(),
            variables: RefCell::new(Vec::new()),
        }
    }
}

impl ClientRequest for SpinClientRequest {
    fn header(&self, name: &str) -> Option<Vec<String>> {
        let values: Vec<String> = self
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| String::from_utf8_lossy(v).into_owned())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }

    fn set_variable(&self, name: &str, value: &str) {
        let mut variables = self.variables.borrow_mut();
        variables.retain(|(k, _)| k != name);
        variables.push((name.to_string(), value.to_string()));
    }

    fn url(&self) -> &str {
        &self.url
    }
}

fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[http_component]
async fn handle(req: IncomingRequest, response_out: ResponseOutparam) {
    let request = SpinClientRequest::from_incoming(&req);
    let cache = CACHE.with(Rc::clone);

    on_client_request(&request, &SpinOutboundClient, &cache, epoch_ms()).await;

    // Surface recorded variables as response headers for the delivery layer.
    let mut header_list: Vec<(String, Vec<u8>)> =
        vec![("content-type".to_owned(), "text/plain".into())];
    for (name, value) in request.variables.borrow().iter() {
        header_list.push((name.to_ascii_lowercase(), value.clone().into_bytes()));
    }

    let headers = Fields::from_list(&header_list).unwrap();
    let response = OutgoingResponse::new(headers);
    response.set_status_code(200).unwrap();
    response_out.set(response);
}
