//! Hosting page served at `/`.
//!
//! `GET /?url=<T>` embeds the proxied target in a full-viewport frame so the
//! injected script has a parent to relay to. Without `url` a placeholder is
//! returned.
//!
//! The page logs every relayed message to the browser console as one JSON
//! line, the input format of `uxinsight replay`.

use crate::handler::ProxyResponse;
use crate::request::proxy_href;
use tracing::warn;

/// Writes each relay message from the framed page as a JSON line.
const RELAY_LOGGER: &str = r#"window.addEventListener("message", function (event) {
  var message = event.data;
  if (message && typeof message === "object" && typeof message.type === "string") {
    console.log(JSON.stringify(message));
  }
});
"#;

/// Render the hosting page for a `/` request's query string.
#[must_use]
pub fn host_page(query: &str) -> ProxyResponse {
    let target = url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == "url")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.trim().is_empty());

    let content = match target {
        Some(target) => format!(
            "<iframe src=\"{}\" style=\"position:absolute;top:0;left:0;width:100%;height:100%;border:none;\"></iframe>",
            proxy_href(&target, None)
        ),
        None => {
            warn!("No URL parameter provided to host page");
            "<p>Loading...</p>".to_string()
        }
    };

    ProxyResponse::html(
        200,
        format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>UX Insight</title>\
             <script>\n{}</script></head>\
             <body style=\"margin:0;overflow:hidden;\">{}</body></html>\n",
            RELAY_LOGGER, content
        ),
    )
}
