use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use roost_core::{Result, RoostError, Routine};

/// Maps routine names to routine implementations.
///
/// Built once during process initialization with explicit `register`
/// calls, then handed to the harness — never ambient module state, so
/// tests construct a fresh registry apiece and registration stays an
/// observable step.
#[derive(Default)]
pub struct RoutineRegistry {
    routines: Vec<Arc<dyn Routine>>,
    by_name: HashMap<String, usize>,
}

impl RoutineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a routine. A duplicate name fails loudly — silently overwriting
    /// would mask a double-registration bug at startup.
    pub fn register(&mut self, routine: Arc<dyn Routine>) -> Result<()> {
        let name = routine.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(RoostError::DuplicateRoutine(name));
        }
        debug!(routine = %name, "registered routine");
        self.by_name.insert(name, self.routines.len());
        self.routines.push(routine);
        Ok(())
    }

    /// Look up a routine by exact name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Routine>> {
        match self.by_name.get(name) {
            Some(&index) => Ok(Arc::clone(&self.routines[index])),
            None => {
                let mut available = self.names();
                available.sort();
                Err(RoostError::RoutineNotFound {
                    name: name.to_string(),
                    available: available.join(", "),
                })
            }
        }
    }

    /// Registered routines in registration order. Each call returns a
    /// fresh iterator.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Routine>> {
        self.routines.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.routines.iter().map(|r| r.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use roost_core::{InvocationContext, RoutineDefinition};

    struct NamedRoutine {
        def: RoutineDefinition,
    }

    impl NamedRoutine {
        fn new(name: &str) -> Arc<dyn Routine> {
            Arc::new(Self {
                def: RoutineDefinition::new(name),
            })
        }
    }

    #[async_trait]
    impl Routine for NamedRoutine {
        fn definition(&self) -> &RoutineDefinition {
            &self.def
        }

        fn allowed_capabilities(&self) -> Vec<String> {
            vec![]
        }

        async fn build_prompt(&self, _ctx: &InvocationContext) -> anyhow::Result<String> {
            Ok(String::new())
        }

        async fn handle_output(
            &self,
            _output: &str,
            _ctx: &InvocationContext,
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = RoutineRegistry::new();
        registry.register(NamedRoutine::new("a.one")).unwrap();
        assert_eq!(registry.get("a.one").unwrap().name(), "a.one");
    }

    #[test]
    fn test_get_is_idempotent() {
        let mut registry = RoutineRegistry::new();
        registry.register(NamedRoutine::new("a.one")).unwrap();
        let first = registry.get("a.one").unwrap();
        let second = registry.get("a.one").unwrap();
        assert_eq!(first.name(), second.name());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_duplicate_name_fails_loudly() {
        let mut registry = RoutineRegistry::new();
        registry.register(NamedRoutine::new("a.one")).unwrap();
        let err = registry.register(NamedRoutine::new("a.one")).unwrap_err();
        assert!(matches!(err, RoostError::DuplicateRoutine(name) if name == "a.one"));
        // The original registration is intact.
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_name_lists_available() {
        let mut registry = RoutineRegistry::new();
        registry.register(NamedRoutine::new("b.two")).unwrap();
        registry.register(NamedRoutine::new("a.one")).unwrap();
        let err = match registry.get("c.three") {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        match err {
            RoostError::RoutineNotFound { name, available } => {
                assert_eq!(name, "c.three");
                assert_eq!(available, "a.one, b.two");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_iter_preserves_registration_order_and_restarts() {
        let mut registry = RoutineRegistry::new();
        registry.register(NamedRoutine::new("z.last")).unwrap();
        registry.register(NamedRoutine::new("a.first")).unwrap();

        let names: Vec<_> = registry.iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, ["z.last", "a.first"]);

        // A second iteration starts over from the beginning.
        let again: Vec<_> = registry.iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, again);
    }
}
