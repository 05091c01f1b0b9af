//! Per-method endpoint table.

use http::Method;

use crate::Endpoint;

/// Maps HTTP methods to endpoints for one handler.
///
/// `HEAD` falls back to the `GET` endpoint unless one is registered for it.
#[derive(Clone, Default)]
pub struct MethodTable {
    entries: Vec<(Method, Endpoint)>,
}

impl MethodTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `endpoint` for `method`, replacing any previous one.
    #[must_use]
    pub fn method(mut self, method: Method, endpoint: Endpoint) -> Self {
        match self.entries.iter_mut().find(|(m, _)| *m == method) {
            Some(entry) => entry.1 = endpoint,
            None => self.entries.push((method, endpoint)),
        }
        self
    }

    /// Returns the endpoint for `method`.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&Endpoint> {
        self.find(method).or_else(|| {
            if *method == Method::HEAD {
                self.find(&Method::GET)
            } else {
                None
            }
        })
    }

    /// Returns the methods served, in registration order, with `HEAD`
    /// added when `GET` is served.
    #[must_use]
    pub fn allowed(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.entries.iter().map(|(m, _)| m.clone()).collect();
        if methods.contains(&Method::GET) && !methods.contains(&Method::HEAD) {
            methods.push(Method::HEAD);
        }
        methods
    }

    /// Returns `true` if no endpoint is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, method: &Method) -> Option<&Endpoint> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, e)| e)
    }
}

impl std::fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(m, _)| m))
            .finish()
    }
}
