// src/composite/resolver.rs

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::SaveError;

/// Maps client-supplied temporary identifiers to the durable ids assigned
/// when the corresponding records were persisted.
///
/// One resolver is constructed per composite save operation and discarded
/// with it. It must never be shared across operations.
#[derive(Debug, Default)]
pub struct TempRefResolver {
    assigned: HashMap<String, Uuid>,
}

impl TempRefResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the durable id assigned to a temporary id.
    /// Registering the same temporary id twice is an error, never a silent
    /// overwrite.
    pub fn register(
        &mut self,
        field: &str,
        temp_id: &str,
        durable_id: Uuid,
    ) -> Result<(), SaveError> {
        if self.assigned.contains_key(temp_id) {
            return Err(SaveError::invalid(
                field,
                format!("temporary id '{temp_id}' was assigned more than once"),
            ));
        }
        self.assigned.insert(temp_id.to_string(), durable_id);
        Ok(())
    }

    /// Looks up the durable id registered for a temporary id.
    /// References that were never registered in this operation are a hard
    /// failure.
    pub fn resolve(&self, field: &str, reference: &str) -> Result<Uuid, SaveError> {
        self.assigned
            .get(reference)
            .copied()
            .ok_or_else(|| SaveError::UnresolvedReference {
                field: field.to_string(),
                reference: reference.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_ids_resolve() {
        let mut resolver = TempRefResolver::new();
        let durable = Uuid::new_v4();
        resolver.register("categories", "tmp-1", durable).unwrap();
        assert_eq!(resolver.resolve("items", "tmp-1").unwrap(), durable);
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mut resolver = TempRefResolver::new();
        resolver
            .register("categories", "tmp-1", Uuid::new_v4())
            .unwrap();
        let err = resolver
            .register("categories", "tmp-1", Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, SaveError::Validation(_)));
    }

    #[test]
    fn unknown_reference_is_unresolved() {
        let resolver = TempRefResolver::new();
        let err = resolver.resolve("items", "tmp-9").unwrap_err();
        match err {
            SaveError::UnresolvedReference { field, reference } => {
                assert_eq!(field, "items");
                assert_eq!(reference, "tmp-9");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
