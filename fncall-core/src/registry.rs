// Copyright 2025 Fncall Contributors (https://github.com/fncall-rs/fncall)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! In-memory function schema registry
//!
//! Read-mostly: populated once at startup by the loader, grown occasionally
//! by explicit registration, and read on every invocation.

use crate::schema::FunctionSchema;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Thread-safe registry mapping function names to their schemas.
///
/// The first schema registered under a name wins; later registrations of the
/// same name are no-ops. Schemas are handed out as `Arc` clones so lookups
/// never copy the underlying schema.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<FunctionSchema>>>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a schema by function name
    pub fn get(&self, name: &str) -> Option<Arc<FunctionSchema>> {
        self.schemas.read().get(name).cloned()
    }

    /// Register a schema under its declared name.
    ///
    /// Returns `true` if the schema was inserted, `false` if a schema with
    /// the same name was already present (the existing schema is kept).
    pub fn register(&self, schema: FunctionSchema) -> bool {
        let mut schemas = self.schemas.write();
        if schemas.contains_key(&schema.name) {
            tracing::debug!("Schema already registered, keeping existing: {}", schema.name);
            return false;
        }
        tracing::debug!("Registered function schema: {}", schema.name);
        schemas.insert(schema.name.clone(), Arc::new(schema));
        true
    }

    /// Whether a function name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.read().contains_key(name)
    }

    /// Names of all registered functions, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered schemas
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    /// Whether the registry holds no schemas
    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}
