//! Minimal browser globals for running the page scripts under boa.

use boa_engine::{Context, Source};

const BROWSER_PRELUDE: &str = r#"
var posted = [];
var consoleLines = [];
var store = {};
var listeners = {};
var observers = [];
var localStorage = {
  getItem: function (key) {
    return Object.prototype.hasOwnProperty.call(store, key) ? store[key] : null;
  },
  setItem: function (key, value) { store[key] = String(value); },
  removeItem: function (key) { delete store[key]; }
};
var window = {
  localStorage: localStorage,
  scrollY: 0,
  parent: {
    postMessage: function (message) { posted.push(JSON.parse(JSON.stringify(message))); }
  },
  addEventListener: function (type, listener) { listeners[type] = listener; }
};
var location = { href: "https://example.com/" };
var document = {};
var console = { log: function (line) { consoleLines.push(String(line)); } };
function MutationObserver(callback) {
  this.callback = callback;
  observers.push(this);
}
MutationObserver.prototype.observe = function () {};
"#;

/// A page context with stubbed storage, frame messaging and observers.
pub(crate) struct BrowserEnv {
    context: Context,
}

#[allow(clippy::unwrap_used)]
impl BrowserEnv {
    /// Fresh globals with `Date.now()` pinned to `now`.
    pub(crate) fn new(now: i64) -> Self {
        let mut env = Self {
            context: Context::default(),
        };
        env.run(BROWSER_PRELUDE);
        env.run(&format!("Date.now = function () {{ return {}; }};", now));
        env
    }

    pub(crate) fn run(&mut self, code: &str) {
        self.context.eval(Source::from_bytes(code)).unwrap();
    }

    /// Evaluate `expr` and bring it back through JSON (`undefined` -> null).
    pub(crate) fn json(&mut self, expr: &str) -> serde_json::Value {
        let code = format!(
            "JSON.stringify((function (v) {{ return v === undefined ? null : v; }})({}))",
            expr
        );
        let value = self.context.eval(Source::from_bytes(&code)).unwrap();
        let text = value
            .to_string(&mut self.context)
            .unwrap()
            .to_std_string_escaped();
        serde_json::from_str(&text).unwrap()
    }
}
