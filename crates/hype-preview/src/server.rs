use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::Router;
use hype_render::{convert, ConversionConfig};
use percent_encoding::percent_decode_str;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::error::{PreviewError, PreviewResult};
use crate::resolver::FileResolver;

/// Read-only state shared by every request handler.
#[derive(Debug)]
pub struct PreviewState {
    resolver: FileResolver,
    conversion: ConversionConfig,
}

impl PreviewState {
    pub fn new(resolver: FileResolver, conversion: ConversionConfig) -> Self {
        Self {
            resolver,
            conversion,
        }
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }
}

/// Build the preview router. Every method and path is routed to the same
/// handler, so `POST /a.md` behaves like `GET /a.md`.
pub fn router(state: Arc<PreviewState>) -> Router {
    Router::new()
        .fallback(render_document)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP server rendering markdown files below a root directory.
pub struct PreviewServer {
    listener: TcpListener,
    state: Arc<PreviewState>,
}

impl PreviewServer {
    /// Bind `host:port` and prepare to serve files from `root`.
    pub async fn bind(
        root: impl AsRef<Path>,
        host: &str,
        port: u16,
        conversion: ConversionConfig,
    ) -> PreviewResult<Self> {
        let root = root.as_ref();
        let resolver = FileResolver::new(root).map_err(|source| PreviewError::Root {
            path: root.to_path_buf(),
            source,
        })?;

        let address = format!("{host}:{port}");
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| PreviewError::Bind { address, source })?;

        Ok(Self {
            listener,
            state: Arc::new(PreviewState::new(resolver, conversion)),
        })
    }

    pub fn local_addr(&self) -> PreviewResult<SocketAddr> {
        self.listener.local_addr().map_err(PreviewError::Serve)
    }

    pub fn root(&self) -> PathBuf {
        self.state.root().to_path_buf()
    }

    /// Serve requests until the process is stopped.
    pub async fn serve(self) -> PreviewResult<()> {
        let address = self.local_addr()?;
        info!(
            root = %self.state.root().display(),
            %address,
            extended = self.state.conversion.extended,
            "serving markdown preview"
        );

        axum::serve(self.listener, router(self.state))
            .await
            .map_err(PreviewError::Serve)
    }
}

async fn render_document(State(state): State<Arc<PreviewState>>, uri: Uri) -> Response {
    let request_path = percent_decode_str(uri.path())
        .decode_utf8_lossy()
        .into_owned();
    debug!(path = %request_path, "preview request");

    let file = match state.resolver.resolve(&request_path) {
        Ok(file) => file,
        Err(err) if err.is_not_found() => {
            debug!(path = %request_path, reason = %err, "not found");
            return not_found(&request_path);
        }
        Err(err) => {
            warn!(path = %request_path, error = %err, "failed to resolve file");
            return internal_error(&err.to_string());
        }
    };

    let markdown = match tokio::fs::read(&file).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(file = %file.display(), error = %err, "failed to read file");
            return internal_error(&err.to_string());
        }
    };

    let conversion = state.conversion;
    let rendered = tokio::task::spawn_blocking(move || convert(&markdown, conversion)).await;
    match rendered {
        Ok(Ok(html)) => (StatusCode::OK, Html(html)).into_response(),
        Ok(Err(err)) => {
            warn!(file = %file.display(), error = %err, "conversion failed");
            internal_error(&err.to_string())
        }
        Err(err) => {
            warn!(file = %file.display(), error = %err, "conversion task failed");
            internal_error(&err.to_string())
        }
    }
}

fn not_found(request_path: &str) -> Response {
    let body = format!(
        "<h1>Error 404</h1>\n<p>File {} not found.</p>",
        escape_html(request_path)
    );
    (StatusCode::NOT_FOUND, Html(body)).into_response()
}

fn internal_error(description: &str) -> Response {
    let body = format!("<h1>Error 500</h1>\n<p>{}</p>", escape_html(description));
    (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
}

/// Escape text for inclusion in an HTML element body or attribute.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
