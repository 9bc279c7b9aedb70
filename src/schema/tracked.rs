//! Change tracking
//!
//! Every schema instance owns a `ChangeSet`. Containers handed out by an
//! instance, and embedded instances, hold an `OwnerLink` back to the owning
//! change-set: a weak reference plus the owning field name. Mutating through
//! the container marks that field on the owner, and the owner forwards the
//! mark to its own parent, if any.
//!
//! Instances are single-threaded; the shared state is `Rc<RefCell<_>>`.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use serde_json::{Map, Value};

use crate::field::{FieldKind, FieldResult};

#[derive(Debug, Default)]
struct ChangeState {
    changed: BTreeSet<String>,
    parent: Option<OwnerLink>,
}

/// Set of field names modified since creation or the last save.
#[derive(Debug, Default)]
pub struct ChangeSet {
    state: Rc<RefCell<ChangeState>>,
}

impl ChangeSet {
    /// Create an empty change-set with no parent
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a change-set whose marks are forwarded to `parent`
    pub fn with_parent(parent: OwnerLink) -> Self {
        Self {
            state: Rc::new(RefCell::new(ChangeState {
                changed: BTreeSet::new(),
                parent: Some(parent),
            })),
        }
    }

    /// Mark a field as changed and notify the parent.
    pub fn mark(&self, field: &str) {
        mark_state(&self.state, field);
    }

    /// Returns whether the field is marked
    pub fn contains(&self, field: &str) -> bool {
        self.state.borrow().changed.contains(field)
    }

    /// Returns the marked field names in sorted order
    pub fn fields(&self) -> Vec<String> {
        self.state.borrow().changed.iter().cloned().collect()
    }

    /// Returns whether nothing is marked
    pub fn is_empty(&self) -> bool {
        self.state.borrow().changed.is_empty()
    }

    /// Forget all marks
    pub fn clear(&self) {
        self.state.borrow_mut().changed.clear();
    }

    /// Create a back-reference for a container stored under `field`
    pub fn link(&self, field: &str) -> OwnerLink {
        OwnerLink {
            owner: Rc::downgrade(&self.state),
            field: field.to_string(),
        }
    }
}

fn mark_state(state: &Rc<RefCell<ChangeState>>, field: &str) {
    let parent = {
        let mut state = state.borrow_mut();
        state.changed.insert(field.to_string());
        state.parent.clone()
    };
    if let Some(parent) = parent {
        parent.notify();
    }
}

/// Back-reference from a container to the field that owns it.
///
/// Does not keep the owner alive; notifying a dropped owner does nothing.
#[derive(Debug, Clone)]
pub struct OwnerLink {
    owner: Weak<RefCell<ChangeState>>,
    field: String,
}

impl OwnerLink {
    /// Returns the owning field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Mark the owning field as changed
    pub fn notify(&self) {
        if let Some(state) = self.owner.upgrade() {
            mark_state(&state, &self.field);
        }
    }
}

/// A value whose mutations are reported to its owner.
///
/// Reads go through `Deref`; every mutation goes through a method that
/// notifies the owner when the value actually changed. A typed list also
/// coerces incoming elements through its element type.
#[derive(Debug)]
pub struct ChangeTracked<T> {
    value: T,
    owner: OwnerLink,
    element: Option<FieldKind>,
}

/// Change-tracked array stored in a list field
pub type TrackedList = ChangeTracked<Vec<Value>>;

/// Change-tracked mapping stored in a mixed field
pub type TrackedMap = ChangeTracked<Map<String, Value>>;

impl<T> ChangeTracked<T> {
    /// Wrap a value owned by the field behind `owner`
    pub fn new(value: T, owner: OwnerLink) -> Self {
        Self {
            value,
            owner,
            element: None,
        }
    }

    /// Returns the owning field name
    pub fn field(&self) -> &str {
        self.owner.field()
    }

    /// Apply an arbitrary mutation and mark the owner unconditionally.
    ///
    /// Values written this way bypass element coercion.
    pub fn modify<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.value);
        self.owner.notify();
        result
    }

    /// Unwrap the plain value
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for ChangeTracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl ChangeTracked<Vec<Value>> {
    /// Wrap the array of a list field whose elements have type `element`
    pub fn with_element(items: Vec<Value>, owner: OwnerLink, element: Option<FieldKind>) -> Self {
        Self {
            value: items,
            owner,
            element,
        }
    }

    /// Returns the element type of a typed list
    pub fn element(&self) -> Option<&FieldKind> {
        self.element.as_ref()
    }

    fn coerce_element(&self, value: Value) -> FieldResult<Value> {
        match &self.element {
            Some(kind) => kind.coerce(value),
            None => Ok(value),
        }
    }

    /// Append a value
    pub fn push(&mut self, value: Value) -> FieldResult<()> {
        let value = self.coerce_element(value)?;
        self.modify(|items| items.push(value));
        Ok(())
    }

    /// Remove the last value
    pub fn pop(&mut self) -> Option<Value> {
        let popped = self.value.pop();
        if popped.is_some() {
            self.owner.notify();
        }
        popped
    }

    /// Insert at `index`; returns false when out of bounds
    pub fn insert(&mut self, index: usize, value: Value) -> FieldResult<bool> {
        if index > self.value.len() {
            return Ok(false);
        }
        let value = self.coerce_element(value)?;
        self.modify(|items| items.insert(index, value));
        Ok(true)
    }

    /// Remove the value at `index`
    pub fn remove(&mut self, index: usize) -> Option<Value> {
        if index >= self.value.len() {
            return None;
        }
        Some(self.modify(|items| items.remove(index)))
    }

    /// Replace the value at `index`; returns whether anything changed
    pub fn set(&mut self, index: usize, value: Value) -> FieldResult<bool> {
        let value = self.coerce_element(value)?;
        match self.value.get(index) {
            Some(current) if *current != value => {
                self.modify(|items| items[index] = value);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Append every value; nothing is appended if any value fails to coerce
    pub fn extend(&mut self, values: impl IntoIterator<Item = Value>) -> FieldResult<()> {
        let values = values
            .into_iter()
            .map(|value| self.coerce_element(value))
            .collect::<FieldResult<Vec<_>>>()?;
        if !values.is_empty() {
            self.modify(|items| items.extend(values));
        }
        Ok(())
    }

    /// Remove every value
    pub fn clear(&mut self) {
        if !self.value.is_empty() {
            self.modify(Vec::clear);
        }
    }
}

impl ChangeTracked<Map<String, Value>> {
    /// Insert or replace a key; the owner is marked only if the value differs
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if self.value.get(&key) == Some(&value) {
            return Some(value);
        }
        self.modify(|map| map.insert(key, value))
    }

    /// Remove a key
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.value.remove(key);
        if removed.is_some() {
            self.owner.notify();
        }
        removed
    }

    /// Remove every key
    pub fn clear(&mut self) {
        if !self.value.is_empty() {
            self.modify(Map::clear);
        }
    }
}
