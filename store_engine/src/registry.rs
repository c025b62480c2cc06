//! Entity/model registry
//!
//! Maps each entity type to the storage model that persists it, keyed by the
//! entity's `TypeId`. Contract conformance (conversion, table metadata, row
//! decoding) is enforced by the trait bounds on the registration calls;
//! what only the runtime can see (duplicate registrations, alias targets,
//! the primary-key column) is validated once in [`Mappings::build`], which
//! panics on violation: a bad mapping is a programming mistake, not a
//! runtime condition. The built registry is immutable and safe to share.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::StoreError;
use crate::model::{FetchRelated, Hooks, Model};
use crate::store::binding::{Binding, EntityPort};

/// Domain-field token to column-name aliasing for filter expressions
pub type FieldColumnMap = HashMap<String, String>;

pub struct Registry {
    entries: HashMap<TypeId, Arc<dyn EntityPort>>,
}

impl Registry {
    pub fn is_registered<E: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<E>())
    }

    pub(crate) fn resolve<E: 'static>(&self) -> Result<&dyn EntityPort, StoreError> {
        self.entries
            .get(&TypeId::of::<E>())
            .map(|port| port.as_ref())
            .ok_or_else(|| StoreError::NoMapping(type_name::<E>()))
    }
}

/// Builder for a [`Registry`]
#[derive(Default)]
pub struct Mappings {
    entries: Vec<(TypeId, Arc<dyn EntityPort>)>,
}

impl Mappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model for its entity type, with a field/column alias map
    /// for filter expressions.
    pub fn model<M>(self, fields: &[(&str, &str)]) -> Self
    where
        M: Model
            + FetchRelated
            + for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>
            + Unpin
            + 'static,
    {
        self.push::<M>(Binding::new(field_column_map(fields)))
    }

    /// Like [`Mappings::model`], additionally capturing the model's
    /// before-save/before-delete hooks. The capability is taken here, once;
    /// the store never probes for it afterwards.
    pub fn hooked_model<M>(self, fields: &[(&str, &str)]) -> Self
    where
        M: Model
            + Hooks
            + FetchRelated
            + for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>
            + Unpin
            + 'static,
    {
        self.push::<M>(Binding::new_hooked(field_column_map(fields)))
    }

    fn push<M>(mut self, binding: Binding<M>) -> Self
    where
        M: Model
            + FetchRelated
            + for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>
            + Unpin
            + 'static,
    {
        let port: Arc<dyn EntityPort> = Arc::new(binding);
        self.entries.push((TypeId::of::<M::Entity>(), port));
        self
    }

    /// Validate every mapping and build the immutable registry.
    ///
    /// # Panics
    ///
    /// Panics on a duplicate entity type, an alias map targeting a column the
    /// model does not declare, or a primary-key column missing from the
    /// model's declared columns.
    pub fn build(self) -> Registry {
        let mut entries: HashMap<TypeId, Arc<dyn EntityPort>> = HashMap::new();

        for (entity_id, port) in self.entries {
            if entries.contains_key(&entity_id) {
                panic!(
                    "duplicate mapping for entity type {}",
                    port.entity_type()
                );
            }

            let columns = port.declared_columns();

            let pk = port.primary_key_column();
            if !columns.contains(&pk) {
                panic!(
                    "primary key column {} is not a declared column of model {}",
                    pk,
                    port.model_type()
                );
            }

            for target in port.field_columns().values() {
                if !columns.iter().any(|column| column == target) {
                    panic!(
                        "field map for model {} targets unknown column {}",
                        port.model_type(),
                        target
                    );
                }
            }

            entries.insert(entity_id, port);
        }

        Registry { entries }
    }
}

fn field_column_map(fields: &[(&str, &str)]) -> FieldColumnMap {
    fields
        .iter()
        .map(|(field, column)| (field.to_string(), column.to_string()))
        .collect()
}
