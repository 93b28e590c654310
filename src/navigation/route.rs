//! # Route Table
//!
//! Ordered `pattern → handler` mapping. Patterns look like `/users/:id`:
//! literal segments must match exactly, `:name` segments are required
//! positional parameters. Each route also declares which named query
//! parameters it accepts; those are optional.
//!
//! Only scalar identifiers cross this boundary. A destination that needs a
//! full record receives its id and fetches the record itself.

use std::collections::BTreeMap;

use super::error::NavigationError;

/// Whether `value` is a scalar identifier (`[A-Za-z0-9_.~-]+`).
pub fn is_scalar(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
    query: Vec<String>,
}

impl RoutePattern {
    pub fn parse(raw: &str) -> Result<Self, NavigationError> {
        let invalid = |reason: &str| NavigationError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };
        if !raw.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut segments = Vec::new();
        for part in raw.split('/').filter(|s| !s.is_empty()) {
            let segment = match part.strip_prefix(':') {
                Some(name) if !is_scalar(name) => return Err(invalid("bad parameter name")),
                Some(name) => {
                    if segments
                        .iter()
                        .any(|s| matches!(s, Segment::Param(existing) if existing == name))
                    {
                        return Err(invalid("duplicate parameter name"));
                    }
                    Segment::Param(name.to_string())
                }
                None if !is_scalar(part) => return Err(invalid("bad literal segment")),
                None => Segment::Literal(part.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
            query: Vec::new(),
        })
    }

    /// Declares the optional named query parameters this route accepts.
    pub fn with_query(mut self, names: &[&str]) -> Self {
        self.query = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn required_params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn optional_params(&self) -> impl Iterator<Item = &str> {
        self.query.iter().map(String::as_str)
    }

    fn match_segments(&self, parts: &[&str]) -> Option<BTreeMap<String, String>> {
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}

/// A concrete navigation target after matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pattern: String,
    path: String,
    params: BTreeMap<String, String>,
    query: BTreeMap<String, String>,
}

impl Location {
    /// The pattern this location matched, e.g. `/users/:id`.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Normalized path without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Canonical form: normalized path plus sorted query.
    pub fn href(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self.query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

struct Route<H> {
    pattern: RoutePattern,
    handler: H,
}

pub struct RouteMatch<'a, H> {
    pub handler: &'a H,
    pub location: Location,
}

/// Ordered routes; the first pattern that matches wins.
pub struct RouteTable<H> {
    routes: Vec<Route<H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Appends a route. `query` lists the optional query parameters it accepts.
    pub fn route(mut self, pattern: &str, query: &[&str], handler: H) -> Result<Self, NavigationError> {
        let pattern = RoutePattern::parse(pattern)?.with_query(query);
        self.routes.push(Route { pattern, handler });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Matches a requested path like `/users/42?tab=posts`.
    pub fn match_path(&self, requested: &str) -> Result<RouteMatch<'_, H>, NavigationError> {
        let (path_part, query_part) = match requested.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (requested, None),
        };
        let parts: Vec<&str> = path_part.split('/').filter(|s| !s.is_empty()).collect();
        let path = format!("/{}", parts.join("/"));

        let invalid = |reason: String| NavigationError::InvalidParameter {
            path: requested.to_string(),
            reason,
        };

        let Some((route, params)) = self
            .routes
            .iter()
            .find_map(|r| r.pattern.match_segments(&parts).map(|p| (r, p)))
        else {
            return Err(NavigationError::UnknownRoute(requested.to_string()));
        };

        if let Some((name, value)) = params.iter().find(|(_, v)| !is_scalar(v)) {
            return Err(invalid(format!("'{name}' = '{value}' is not a scalar")));
        }

        let mut query = BTreeMap::new();
        for pair in query_part.into_iter().flat_map(|q| q.split('&')).filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            if !route.pattern.query.iter().any(|declared| declared == name) {
                return Err(invalid(format!("undeclared query parameter '{name}'")));
            }
            if !is_scalar(value) {
                return Err(invalid(format!("'{name}' = '{value}' is not a scalar")));
            }
            if query.insert(name.to_string(), value.to_string()).is_some() {
                return Err(invalid(format!("duplicate query parameter '{name}'")));
            }
        }

        Ok(RouteMatch {
            handler: &route.handler,
            location: Location {
                pattern: route.pattern.raw.clone(),
                path,
                params,
                query,
            },
        })
    }

    /// Builds a path for a declared pattern from scalar parameters.
    pub fn build_path(
        &self,
        pattern: &str,
        params: &[(&str, &str)],
        query: &[(&str, &str)],
    ) -> Result<String, NavigationError> {
        let route = self
            .routes
            .iter()
            .find(|r| r.pattern.raw == pattern)
            .ok_or_else(|| NavigationError::UnknownRoute(pattern.to_string()))?;
        let invalid = |reason: String| NavigationError::InvalidParameter {
            path: pattern.to_string(),
            reason,
        };

        let mut parts = Vec::with_capacity(route.pattern.segments.len());
        for segment in &route.pattern.segments {
            match segment {
                Segment::Literal(lit) => parts.push(lit.as_str()),
                Segment::Param(name) => {
                    let value = params
                        .iter()
                        .find(|(k, _)| k == name)
                        .map(|(_, v)| *v)
                        .ok_or_else(|| invalid(format!("missing required parameter '{name}'")))?;
                    if !is_scalar(value) {
                        return Err(invalid(format!("'{name}' = '{value}' is not a scalar")));
                    }
                    parts.push(value);
                }
            }
        }

        let mut pairs = Vec::with_capacity(query.len());
        for (name, value) in query {
            if !route.pattern.query.iter().any(|declared| declared == name) {
                return Err(invalid(format!("undeclared query parameter '{name}'")));
            }
            if !is_scalar(value) {
                return Err(invalid(format!("'{name}' = '{value}' is not a scalar")));
            }
            pairs.push(format!("{name}={value}"));
        }

        let path = format!("/{}", parts.join("/"));
        if pairs.is_empty() {
            Ok(path)
        } else {
            Ok(format!("{}?{}", path, pairs.join("&")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable<&'static str> {
        RouteTable::new()
            .route("/", &[], "home")
            .unwrap()
            .route("/users/new", &[], "new-user")
            .unwrap()
            .route("/users/:id", &["tab"], "user")
            .unwrap()
            .route("/teams/:team/members/:member", &[], "member")
            .unwrap()
    }

    #[test]
    fn test_root_and_trailing_slash() {
        let routes = table();
        assert_eq!(*routes.match_path("/").unwrap().handler, "home");
        let m = routes.match_path("/users/7/").unwrap();
        assert_eq!(m.location.path(), "/users/7");
    }

    #[test]
    fn test_first_declared_route_wins() {
        let routes = table();
        assert_eq!(*routes.match_path("/users/new").unwrap().handler, "new-user");
        assert_eq!(*routes.match_path("/users/42").unwrap().handler, "user");
    }

    #[test]
    fn test_positional_and_query_params() {
        let routes = table();
        let m = routes.match_path("/users/42?tab=posts").unwrap();
        assert_eq!(m.location.pattern(), "/users/:id");
        assert_eq!(m.location.param("id"), Some("42"));
        assert_eq!(m.location.query("tab"), Some("posts"));
        assert_eq!(m.location.href(), "/users/42?tab=posts");

        let m = routes.match_path("/teams/core/members/ann").unwrap();
        assert_eq!(m.location.param("team"), Some("core"));
        assert_eq!(m.location.param("member"), Some("ann"));
    }

    #[test]
    fn test_unknown_route() {
        assert_eq!(
            table().match_path("/nowhere").err(),
            Some(NavigationError::UnknownRoute("/nowhere".to_string()))
        );
    }

    #[test]
    fn test_undeclared_query_rejected() {
        let err = table().match_path("/users/1?sort=asc").err();
        assert!(matches!(err, Some(NavigationError::InvalidParameter { .. })));
    }

    #[test]
    fn test_non_scalar_values_rejected() {
        let routes = table();
        assert!(routes.match_path("/users/{\"id\":1}").is_err());
        assert!(routes.match_path("/users/1?tab=").is_err());
        assert!(routes.match_path("/users/1?tab=a,b").is_err());
    }

    #[test]
    fn test_build_path() {
        let routes = table();
        assert_eq!(
            routes
                .build_path("/users/:id", &[("id", "42")], &[("tab", "info")])
                .unwrap(),
            "/users/42?tab=info"
        );
        assert!(routes.build_path("/users/:id", &[], &[]).is_err());
        assert!(routes
            .build_path("/users/:id", &[("id", "a b")], &[])
            .is_err());
        assert!(routes.build_path("/missing", &[], &[]).is_err());
    }

    #[test]
    fn test_pattern_declares_params() {
        let pattern = RoutePattern::parse("/teams/:team/members/:member")
            .unwrap()
            .with_query(&["tab"]);
        assert_eq!(pattern.required_params().collect::<Vec<_>>(), vec!["team", "member"]);
        assert_eq!(pattern.optional_params().collect::<Vec<_>>(), vec!["tab"]);
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(RoutePattern::parse("users").is_err());
        assert!(RoutePattern::parse("/a/:id/:id").is_err());
        assert!(RoutePattern::parse("/a/:").is_err());
    }
}
