// Router module - maps method and path to a route
//
// Image paths are `/{identifier}/{width}/{height}` with purely numeric width
// and height. Anything that does not match is `NotFound` and never reaches
// the delivery pipeline.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Health,
    Metrics,
    Creatures,
    Attribution,
    Image {
        identifier: String,
        width: u32,
        height: u32,
    },
    NotFound,
    MethodNotAllowed,
}

impl Route {
    pub fn parse(method: &str, path: &str) -> Route {
        if method != "GET" && method != "HEAD" {
            return Route::MethodNotAllowed;
        }

        match path {
            "/health" => return Route::Health,
            "/metrics" => return Route::Metrics,
            "/creatures" => return Route::Creatures,
            "/attribution" => return Route::Attribution,
            _ => {}
        }

        let Some(rest) = path.strip_prefix('/') else {
            return Route::NotFound;
        };
        let segments: Vec<&str> = rest.split('/').collect();
        let [identifier, width, height] = segments.as_slice() else {
            return Route::NotFound;
        };

        let (Some(width), Some(height)) = (parse_dimension(width), parse_dimension(height)) else {
            return Route::NotFound;
        };

        match urlencoding::decode(identifier) {
            Ok(identifier) if !identifier.is_empty() => Route::Image {
                identifier: identifier.into_owned(),
                width,
                height,
            },
            _ => Route::NotFound,
        }
    }

    /// Label used for metrics and logs
    pub fn label(&self) -> &'static str {
        match self {
            Route::Health => "health",
            Route::Metrics => "metrics",
            Route::Creatures => "creatures",
            Route::Attribution => "attribution",
            Route::Image { .. } => "image",
            Route::NotFound => "not_found",
            Route::MethodNotAllowed => "method_not_allowed",
        }
    }
}

/// `[0-9]+` that fits in a u32
fn parse_dimension(segment: &str) -> Option<u32> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
