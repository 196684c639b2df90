use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{StartupError, StartupResult};
use crate::handler::Handler;

/// The handler resolution table, populated once at process start.
///
/// The bridged convention selects handlers by a two-part dotted path,
/// `"module.attribute"`. In an embedding host that is a registration
/// table rather than runtime reflection: the host registers every handler
/// it links under a module name and an attribute name, then resolves the
/// configured path before serving the first request.
///
/// ```rust
/// use gatelink::{AppBody, Environ, HandlerError, Registry, StartResponse};
///
/// fn ping(_environ: &mut Environ, start: StartResponse) -> Result<AppBody, HandlerError> {
///     start.start("200 OK", [("Content-Type", "text/plain")]);
///     Ok(AppBody::new("Pong!"))
/// }
///
/// let mut registry = Registry::new();
/// registry.register("hello", "ping_app", ping);
/// let handler = registry.resolve("hello.ping_app").unwrap();
/// ```
#[derive(Default)]
pub struct Registry {
    modules: HashMap<String, HashMap<String, Arc<dyn Handler>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Register a handler under `module`.`attribute`. Re-registering the
    /// same path replaces the previous handler.
    pub fn register(
        &mut self,
        module: impl Into<String>,
        attribute: impl Into<String>,
        handler: impl Handler + 'static,
    ) -> &mut Registry {
        self.modules
            .entry(module.into())
            .or_default()
            .insert(attribute.into(), Arc::new(handler));
        self
    }

    /// Resolve a dotted `"module.attribute"` path. The attribute is split
    /// off at the last dot, so module names may themselves be dotted.
    pub fn resolve(&self, path: &str) -> StartupResult<Arc<dyn Handler>> {
        let (module, attribute) = path
            .rsplit_once('.')
            .ok_or_else(|| StartupError::MalformedPath(path.to_owned()))?;

        let attributes = self
            .modules
            .get(module)
            .ok_or_else(|| StartupError::UnknownModule(module.to_owned()))?;

        attributes
            .get(attribute)
            .cloned()
            .ok_or_else(|| StartupError::UnknownAttribute {
                module: module.to_owned(),
                attribute: attribute.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::AppBody;
    use crate::environ::Environ;
    use crate::error::HandlerError;
    use crate::response::StartResponse;

    fn noop(
        _environ: &mut Environ,
        start: StartResponse,
    ) -> Result<AppBody, HandlerError> {
        start.start("204 No Content", std::iter::empty::<(&str, &str)>());
        Ok(AppBody::empty())
    }

    /// Tests resolution of a registered dotted path.
    #[test]
    fn test_resolve_registered_handler() {
        let mut registry = Registry::new();
        registry.register("hello", "ping_app", noop);

        assert!(registry.resolve("hello.ping_app").is_ok());
    }

    /// Tests that the split happens at the last dot, allowing dotted
    /// module names.
    #[test]
    fn test_resolve_dotted_module_name() {
        let mut registry = Registry::new();
        registry.register("site.api", "status", noop);

        assert!(registry.resolve("site.api.status").is_ok());
        assert!(matches!(
            registry.resolve("site.api").unwrap_err(),
            StartupError::UnknownModule(_)
        ));
    }

    /// Tests each resolution failure in the startup taxonomy.
    #[test]
    fn test_resolution_failures() {
        let mut registry = Registry::new();
        registry.register("hello", "ping_app", noop);

        assert!(matches!(
            registry.resolve("no_dots").unwrap_err(),
            StartupError::MalformedPath(_)
        ));
        assert!(matches!(
            registry.resolve("missing.app").unwrap_err(),
            StartupError::UnknownModule(_)
        ));
        assert!(matches!(
            registry.resolve("hello.other_app").unwrap_err(),
            StartupError::UnknownAttribute { .. }
        ));
    }

    /// Tests that re-registering a path replaces the handler.
    #[test]
    fn test_reregistration_replaces() {
        let mut registry = Registry::new();
        registry.register("hello", "app", noop);
        registry.register("hello", "app", noop);

        assert_eq!(registry.modules["hello"].len(), 1);
    }
}
