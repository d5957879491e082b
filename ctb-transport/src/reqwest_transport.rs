use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::{stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use tracing::debug;

use crate::{
    BinaryPart, HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransferProgress,
    TransportError,
};

/// Size of the slices the upload body is streamed in; progress advances per
/// slice.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// `HttpTransport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Client with an overall per-request timeout. A timeout surfaces as
    /// `TransportError::Timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Ok(Self { client })
    }

    fn build(
        &self,
        request: HttpRequest,
        progress: &TransferProgress,
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.binary {
            Some(part) => builder.multipart(multipart_form(request.fields, part, progress)?),
            None if !request.fields.is_empty() => builder.form(&request.fields),
            None => builder,
        };
        Ok(builder)
    }
}

/// Text fields first, file part last: storage endpoints ignore any field that
/// follows the file.
fn multipart_form(
    fields: Vec<(String, String)>,
    part: BinaryPart,
    progress: &TransferProgress,
) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name, value);
    }

    let total = part.data.len() as u64;
    progress.set_upload_total(total);

    let chunks: Vec<Bytes> = (0..part.data.len())
        .step_by(UPLOAD_CHUNK_BYTES)
        .map(|start| part.data.slice(start..(start + UPLOAD_CHUNK_BYTES).min(part.data.len())))
        .collect();
    let tracker = progress.clone();
    let body = stream::iter(chunks).map(move |chunk| {
        tracker.add_uploaded(chunk.len() as u64);
        Ok::<Bytes, std::io::Error>(chunk)
    });

    let file = Part::stream_with_length(reqwest::Body::wrap_stream(body), total)
        .file_name(part.file_name)
        .mime_str(&part.content_type)
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

    Ok(form.part(part.field, file))
}

fn transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else if error.is_builder() {
        TransportError::InvalidRequest(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        progress: TransferProgress,
    ) -> Result<HttpResponse, TransportError> {
        let builder = self.build(request, &progress)?;
        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();

        if let Some(length) = response.content_length() {
            progress.set_download_total(length);
        }

        let mut body = BytesMut::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(transport_error)?;
            progress.add_downloaded(chunk.len() as u64);
            body.extend_from_slice(&chunk);
        }
        debug!(status, bytes = body.len(), "response received");

        Ok(HttpResponse {
            status,
            headers,
            body: body.freeze(),
        })
    }
}
