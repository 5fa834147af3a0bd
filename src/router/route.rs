//! Route descriptor and pattern compiler.
//!
//! A [`Route`] pairs a compiled URI pattern with a path map: a list of named
//! parts that resolve either to a capture-group position or to a literal
//! default. Patterns use `{name}` and `{name:regex}` placeholders; patterns
//! starting with `^` are taken as raw regexes, and patterns without
//! placeholders or groups are compared literally.

use std::fmt;
use std::sync::Arc;

use http::Method;
use regex::Regex;
use serde::Serialize;

use crate::errors::RouterError;
use crate::naming::uncamelize;

/// Stable identifier assigned by the owning router at registration time.
pub type RouteId = u64;

/// Where a named part of a matched route takes its value from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PathTarget {
    /// A capture-group position in the compiled pattern (1-based).
    Position(usize),
    /// A literal default carried by the route definition itself.
    Literal(String),
}

/// Path definition accepted when registering a route.
///
/// The shorthand form `"Controller::action"` is resolved into an explicit
/// map at construction time; internally every route carries one canonical
/// `name -> PathTarget` list.
#[derive(Debug, Clone)]
pub enum PathSpec {
    /// No paths; every part falls back to router defaults.
    None,
    /// `"Users"`, `"Users::show"` or `"App::Users::show"`.
    Shorthand(String),
    /// Explicit part map.
    Map(Vec<(String, PathTarget)>),
}

impl PathSpec {
    /// Build an explicit part map.
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, PathTarget)>,
        K: Into<String>,
    {
        PathSpec::Map(entries.into_iter().map(|(k, t)| (k.into(), t)).collect())
    }

    pub(crate) fn resolve(self) -> Result<Vec<(String, PathTarget)>, RouterError> {
        match self {
            PathSpec::None => Ok(Vec::new()),
            PathSpec::Map(map) => Ok(map),
            PathSpec::Shorthand(spec) => {
                let parts: Vec<&str> = spec.split("::").collect();
                if parts.iter().any(|p| p.is_empty()) {
                    return Err(RouterError::InvalidShorthand(spec));
                }
                let mut paths = Vec::with_capacity(3);
                match parts.as_slice() {
                    [controller] => {
                        paths.push(("controller".to_string(), literal(uncamelize(controller))));
                    }
                    [controller, action] => {
                        paths.push(("controller".to_string(), literal(uncamelize(controller))));
                        paths.push(("action".to_string(), literal(action.to_string())));
                    }
                    [namespace @ .., controller, action] => {
                        paths.push(("namespace".to_string(), literal(namespace.join("::"))));
                        paths.push(("controller".to_string(), literal(uncamelize(controller))));
                        paths.push(("action".to_string(), literal(action.to_string())));
                    }
                    [] => return Err(RouterError::InvalidShorthand(spec)),
                }
                Ok(paths)
            }
        }
    }
}

fn literal(value: String) -> PathTarget {
    PathTarget::Literal(value)
}

impl From<&str> for PathSpec {
    fn from(spec: &str) -> Self {
        PathSpec::Shorthand(spec.to_string())
    }
}

impl From<String> for PathSpec {
    fn from(spec: String) -> Self {
        PathSpec::Shorthand(spec)
    }
}

impl From<Vec<(String, PathTarget)>> for PathSpec {
    fn from(map: Vec<(String, PathTarget)>) -> Self {
        PathSpec::Map(map)
    }
}

/// Compiled, matchable form of a route pattern.
#[derive(Debug, Clone)]
pub(crate) enum CompiledPattern {
    /// Plain string comparison; patterns without placeholders or groups.
    Literal(String),
    /// Anchored regex match.
    Pattern(Regex),
}

#[derive(Debug, Clone)]
pub(crate) enum HostMatcher {
    Literal(String),
    Pattern(Regex),
}

impl HostMatcher {
    pub(crate) fn matches(&self, host: &str) -> bool {
        match self {
            HostMatcher::Literal(expected) => expected == host,
            HostMatcher::Pattern(re) => re.is_match(host),
        }
    }
}

type BeforeMatch = Arc<dyn Fn(&str, &Route) -> bool>;
type Converter = Arc<dyn Fn(&str) -> String>;

/// A single pattern route.
///
/// Constructed through `Router::add` (or a `RouteGroup`); immutable during
/// matching. The setters may be chained before the route is first used.
pub struct Route {
    id: RouteId,
    name: Option<String>,
    pattern: String,
    compiled: CompiledPattern,
    paths: Vec<(String, PathTarget)>,
    methods: Option<Vec<Method>>,
    hostname: Option<String>,
    host_matcher: Option<HostMatcher>,
    before_match: Option<BeforeMatch>,
    converters: Vec<(String, Converter)>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("paths", &self.paths)
            .field("methods", &self.methods)
            .field("hostname", &self.hostname)
            .finish_non_exhaustive()
    }
}

impl Route {
    pub(crate) fn new(
        id: RouteId,
        pattern: &str,
        paths: PathSpec,
        methods: Option<Vec<Method>>,
    ) -> Result<Self, RouterError> {
        let mut paths = paths.resolve()?;
        let (compiled, placeholders) = compile_pattern(pattern)?;
        for (name, position) in placeholders {
            match paths.iter_mut().find(|(existing, _)| *existing == name) {
                Some(entry) => entry.1 = PathTarget::Position(position),
                None => paths.push((name, PathTarget::Position(position))),
            }
        }
        Ok(Self {
            id,
            name: None,
            pattern: pattern.to_string(),
            compiled,
            paths,
            methods,
            hostname: None,
            host_matcher: None,
            before_match: None,
            converters: Vec::new(),
        })
    }

    /// Identifier assigned by the router that registered this route.
    #[must_use]
    pub fn route_id(&self) -> RouteId {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: RouteId) {
        self.id = id;
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name the route so it can be looked up with `Router::get_route_by_name`.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Raw pattern as registered.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Source of the compiled pattern: the regex text, or the literal for
    /// placeholder-free patterns.
    #[must_use]
    pub fn compiled_pattern(&self) -> &str {
        match &self.compiled {
            CompiledPattern::Literal(lit) => lit,
            CompiledPattern::Pattern(re) => re.as_str(),
        }
    }

    /// Canonical part map (`name -> position | literal`).
    #[must_use]
    pub fn paths(&self) -> &[(String, PathTarget)] {
        &self.paths
    }

    /// HTTP-method constraint, if any.
    #[must_use]
    pub fn http_methods(&self) -> Option<&[Method]> {
        self.methods.as_deref()
    }

    /// Replace the HTTP-method constraint.
    pub fn via(&mut self, methods: Vec<Method>) -> &mut Self {
        self.methods = Some(methods);
        self
    }

    /// Hostname constraint as registered, if any.
    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Constrain the route to a hostname. A constraint containing a group is
    /// compiled (and validated) as an anchored regex; anything else is
    /// compared literally.
    pub fn set_hostname(&mut self, hostname: &str) -> Result<&mut Self, RouterError> {
        let matcher = if hostname.contains('(') {
            let source = if hostname.starts_with('^') {
                hostname.to_string()
            } else {
                format!("^{hostname}$")
            };
            let re = Regex::new(&source).map_err(|source| RouterError::InvalidHostname {
                hostname: hostname.to_string(),
                source,
            })?;
            HostMatcher::Pattern(re)
        } else {
            HostMatcher::Literal(hostname.to_string())
        };
        self.hostname = Some(hostname.to_string());
        self.host_matcher = Some(matcher);
        Ok(self)
    }

    pub(crate) fn host_matcher(&self) -> Option<&HostMatcher> {
        self.host_matcher.as_ref()
    }

    /// Attach a predicate that must also hold for the route to match. It
    /// receives the handled URI and the route.
    pub fn before_match<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&str, &Route) -> bool + 'static,
    {
        self.before_match = Some(Arc::new(predicate));
        self
    }

    pub(crate) fn set_before_match_arc(&mut self, predicate: BeforeMatch) {
        self.before_match = Some(predicate);
    }

    pub(crate) fn before_match_predicate(&self) -> Option<&BeforeMatch> {
        self.before_match.as_ref()
    }

    /// Register a value transform for one named part, applied during
    /// extraction.
    pub fn convert<F>(&mut self, part: impl Into<String>, converter: F) -> &mut Self
    where
        F: Fn(&str) -> String + 'static,
    {
        self.converters.push((part.into(), Arc::new(converter)));
        self
    }

    /// Apply the part's converter to a value, or pass the value through.
    pub(crate) fn convert_value(&self, part: &str, value: &str) -> String {
        match self.converters.iter().find(|(name, _)| name == part) {
            Some((_, converter)) => converter(value),
            None => value.to_string(),
        }
    }

    /// Test the compiled pattern against a URI. On success returns the
    /// capture values indexed by group position (index 0 is the whole match).
    pub(crate) fn try_match(&self, uri: &str) -> Option<Vec<Option<String>>> {
        match &self.compiled {
            CompiledPattern::Literal(lit) => {
                (lit == uri).then(|| vec![Some(uri.to_string())])
            }
            CompiledPattern::Pattern(re) => re.captures(uri).map(|caps| {
                (0..caps.len())
                    .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
                    .collect()
            }),
        }
    }
}

/// Compile a pattern into its matchable form plus the `(name, position)`
/// pairs of its placeholders, positions assigned left to right from 1.
fn compile_pattern(
    pattern: &str,
) -> Result<(CompiledPattern, Vec<(String, usize)>), RouterError> {
    // Raw regexes are accepted verbatim; the author anchors them.
    if pattern.starts_with('^') {
        let re = Regex::new(pattern).map_err(|e| invalid(pattern, &e))?;
        return Ok((CompiledPattern::Pattern(re), Vec::new()));
    }

    if !pattern.contains('{') {
        if pattern.contains('(') {
            let re = Regex::new(&format!("^{pattern}$")).map_err(|e| invalid(pattern, &e))?;
            return Ok((CompiledPattern::Pattern(re), Vec::new()));
        }
        return Ok((CompiledPattern::Literal(pattern.to_string()), Vec::new()));
    }

    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    let mut placeholders = Vec::new();
    let mut position = 1usize;
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        source.push_str(&regex::escape(&rest[..open]));
        let after = &rest[open..];
        let close = matching_brace(after).ok_or_else(|| RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "unbalanced `{` in placeholder".to_string(),
        })?;
        let body = &after[1..close];
        let (name, fragment) = match body.find(':') {
            Some(colon) => (&body[..colon], &body[colon + 1..]),
            None => (body, "[^/]+"),
        };
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(RouterError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: format!("invalid placeholder name `{name}`"),
            });
        }
        source.push('(');
        source.push_str(fragment);
        source.push(')');
        placeholders.push((name.to_string(), position));
        position += 1 + count_captures(fragment);
        rest = &after[close + 1..];
    }
    source.push_str(&regex::escape(rest));
    source.push('$');

    let re = Regex::new(&source).map_err(|e| invalid(pattern, &e))?;
    Ok((CompiledPattern::Pattern(re), placeholders))
}

fn invalid(pattern: &str, error: &regex::Error) -> RouterError {
    RouterError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: error.to_string(),
    }
}

/// Byte offset of the brace closing the one at the start of `s`, honoring
/// nesting (regex repetitions like `[0-9]{2}` appear inside fragments).
fn matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Count the capture groups a placeholder fragment itself opens, so later
/// placeholders land on the right positions. A `(` inside a character class
/// is a literal, not a group.
fn count_captures(fragment: &str) -> usize {
    let mut count = 0;
    let mut escaped = false;
    let mut in_class = false;
    let mut chars = fragment.chars().peekable();
    while let Some(ch) = chars.next() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => {
                if chars.peek() != Some(&'?') {
                    count += 1;
                }
            }
            _ => {}
        }
    }
    count
}
