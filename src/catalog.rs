use crate::error::{Error, Result};
use crate::metadata::{short_name, CapabilityKind, ControllerMeta, MethodMeta, TypeMeta};
use log::{debug, warn};
use std::collections::HashMap;
use std::rc::Rc;

/// Lookup tables over the reflected types and controllers of one run.
///
/// Entries are reference counted so analyzers can hold a type's metadata while mutating the
/// generator that owns the catalog.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    types: HashMap<String, Rc<TypeMeta>>,
    /// short name -> identities in registration order
    short_names: HashMap<String, Vec<String>>,
    methods: HashMap<(String, String), Rc<MethodMeta>>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from reflected types and controllers
    pub fn from_parts(types: Vec<TypeMeta>, controllers: Vec<ControllerMeta>) -> Self {
        let mut catalog = Self::new();
        for meta in types {
            catalog.add_type(meta);
        }
        for controller in controllers {
            catalog.add_controller(controller);
        }
        debug!(
            "Catalog holds {} types and {} controller methods",
            catalog.types.len(),
            catalog.methods.len()
        );
        catalog
    }

    /// Adds a type. A later entry for the same identity replaces the earlier one.
    pub fn add_type(&mut self, meta: TypeMeta) {
        let identity = meta.identity.clone();
        if self.types.insert(identity.clone(), Rc::new(meta)).is_some() {
            warn!("Type {} declared twice, keeping the later declaration", identity);
            return;
        }
        self.short_names
            .entry(short_name(&identity).to_string())
            .or_default()
            .push(identity);
    }

    pub fn add_controller(&mut self, controller: ControllerMeta) {
        for method in controller.methods {
            let key = (controller.identity.clone(), method.name.clone());
            if self.methods.insert(key, Rc::new(method)).is_some() {
                warn!(
                    "Method declared twice on {}, keeping the later declaration",
                    controller.identity
                );
            }
        }
    }

    pub fn get(&self, identity: &str) -> Option<Rc<TypeMeta>> {
        self.types.get(identity).cloned()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.types.contains_key(identity)
    }

    pub fn capability_of(&self, identity: &str) -> Option<CapabilityKind> {
        self.types.get(identity).map(|meta| meta.capability.kind())
    }

    /// Resolves a name found in source text or documentation to a known type.
    ///
    /// A full identity matches directly; otherwise the first type registered under that short
    /// name is used.
    pub fn find(&self, name: &str) -> Option<Rc<TypeMeta>> {
        let name = name.trim().trim_start_matches('\\');
        if let Some(meta) = self.get(name) {
            return Some(meta);
        }
        self.short_names
            .get(short_name(name))
            .and_then(|identities| identities.first())
            .and_then(|identity| self.get(identity))
    }

    /// Reflected method `action` of `controller`
    pub fn method(&self, controller: &str, action: &str) -> Result<Rc<MethodMeta>> {
        self.methods
            .get(&(controller.to_string(), action.to_string()))
            .cloned()
            .ok_or_else(|| Error::MissingMethod {
                controller: controller.to_string(),
                method: action.to_string(),
            })
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}
