// Per-request context carried through the Pingora callbacks

use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::router::Route;

#[derive(Debug)]
pub struct RequestContext {
    request_id: String,
    route: Route,
    started: Instant,
}

impl RequestContext {
    /// New context with a fresh UUID v4 request id
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            route: Route::NotFound,
            started: Instant::now(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn set_route(&mut self, route: Route) {
        self.route = route;
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
