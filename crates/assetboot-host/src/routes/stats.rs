//! Statistics route.
//!
//! ### `GET /hostStats`
//!
//! **Response:**
//! ```json
//! {
//!   "totalRequests": 3,
//!   "hits": { "/css/bootstrap-5.2.3.min.css": 2, "/js/app.js": 1 },
//!   "requests": [{ "method": "GET", "path": "/js/app.js", "status": 200 }],
//!   "uptime": 12
//! }
//! ```
//!
//! Requests to this endpoint are not themselves recorded.

use axum::{extract::State, response::Json};

use crate::statistics::HostStatistics;
use crate::AppState;

/// GET /hostStats
pub async fn stats_handler(State(state): State<AppState>) -> Json<HostStatistics> {
    Json(state.stats().snapshot())
}
