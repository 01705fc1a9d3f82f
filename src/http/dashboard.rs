// src/http/dashboard.rs
//
// =============================================================================
// RENDER-MANAGER: BUNDLED DASHBOARD DOCUMENT (v 0.1)
// =============================================================================
//
// The dashboard UI itself is somebody else's problem - we only need to hand
// a browser *something* to render when it asks for `/` with
// `Accept: text/html`. This is the bundled static document that request
// gets; it is not the render-farm operations console, just the thin page
// that keeps a browser hitting `/open-browser` from seeing raw JSON.

pub const DASHBOARD_HTML: &str = include_str!("../../assets/dashboard.html");
