//! Component schema registry for one generation run.
//!
//! The registry maps type identities to component names and holds the schema body for every
//! name. A name is reserved *before* the type's fields are analyzed, so a type that reaches
//! itself again (directly or through other types) resolves to a reference to the reserved
//! name instead of recursing forever.
//!
//! Names are the unqualified type name. When a second, different identity shares that short
//! name it gets a name qualified by its full identity (`App.Http.V2.UserResource`), so neither
//! schema overwrites the other.

use crate::metadata::short_name;
use crate::schema::SchemaNode;
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// Outcome of [`SchemaRegistry::register`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Component name reserved for the identity
    pub name: String,
    /// Whether this call created the reservation
    pub is_new: bool,
}

#[derive(Debug, Clone)]
enum Slot {
    /// Reserved, fields not yet analyzed
    Pending,
    Ready(SchemaNode),
}

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    /// identity -> component name
    names: HashMap<String, String>,
    /// component name -> identity
    owners: HashMap<String, String>,
    /// component name -> body
    slots: BTreeMap<String, Slot>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a component name for `identity`. Idempotent per identity.
    pub fn register(&mut self, identity: &str) -> Registration {
        if let Some(name) = self.names.get(identity) {
            return Registration {
                name: name.clone(),
                is_new: false,
            };
        }

        let name = self.choose_name(identity);
        debug!("Registering schema {} for {}", name, identity);

        self.names.insert(identity.to_string(), name.clone());
        self.owners.insert(name.clone(), identity.to_string());
        self.slots.insert(name.clone(), Slot::Pending);

        Registration { name, is_new: true }
    }

    /// Stores the analyzed body for a reserved name
    pub fn fill(&mut self, name: &str, schema: SchemaNode) {
        debug!("Filling schema {}", name);
        self.slots.insert(name.to_string(), Slot::Ready(schema));
    }

    pub fn name_of(&self, identity: &str) -> Option<&str> {
        self.names.get(identity).map(String::as_str)
    }

    /// Analyzed body of a component, `None` while it is still pending
    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        match self.slots.get(name) {
            Some(Slot::Ready(schema)) => Some(schema),
            _ => None,
        }
    }

    pub fn is_pending(&self, name: &str) -> bool {
        matches!(self.slots.get(name), Some(Slot::Pending))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Snapshot of all components. Reservations that were never filled (their analysis
    /// failed) are emitted as generic objects so every reference still resolves.
    pub fn all_entries(&self) -> BTreeMap<String, SchemaNode> {
        self.slots
            .iter()
            .map(|(name, slot)| {
                let schema = match slot {
                    Slot::Ready(schema) => schema.clone(),
                    Slot::Pending => {
                        debug!("Schema {} was never filled, using generic object", name);
                        SchemaNode::object()
                    }
                };
                (name.clone(), schema)
            })
            .collect()
    }

    /// Drops every reservation and body
    pub fn reset(&mut self) {
        debug!("Resetting schema registry ({} entries)", self.slots.len());
        self.names.clear();
        self.owners.clear();
        self.slots.clear();
    }

    fn choose_name(&self, identity: &str) -> String {
        let short = short_name(identity);
        if !self.owners.contains_key(short) {
            return short.to_string();
        }

        let qualified = qualified_name(identity);
        if !self.owners.contains_key(&qualified) {
            debug!(
                "Short name {} already taken by {}, using {}",
                short, self.owners[short], qualified
            );
            return qualified;
        }

        let mut suffix = 2;
        loop {
            let candidate = format!("{}_{}", qualified, suffix);
            if !self.owners.contains_key(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// Identity with namespace separators normalized to dots
fn qualified_name(identity: &str) -> String {
    identity
        .split(['\\', '/', '.', ':'])
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}
