//! In-memory attribute store.

use tracing::debug;

use crate::{Attribute, AttributeStore, Context, Rid, StoreError};

#[derive(Debug, Clone)]
struct Row {
    id: Rid,
    scope: Option<Rid>,
    attribute: Attribute,
}

impl Row {
    fn in_scope(&self, context: Option<Context>) -> bool {
        self.scope == context.map(Context::rid)
    }
}

/// In-memory attribute store.
///
/// Rows are kept in a single vector in insertion order, which gives the
/// stable "first stored value" ordering the registry depends on. Suitable
/// for a daemon whose registrations need not survive a restart, and for
/// testing.
///
/// # Examples
///
/// ```
/// use port_registry::{Attribute, AttributeStore, Context, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// let rid = store.insert(Attribute::new("port", "/cam"), None).unwrap();
/// let ctx = Some(Context::of(rid));
/// store.insert(Attribute::new("ips", "10.0.0.2"), ctx).unwrap();
/// store.insert(Attribute::new("ips", "192.168.1.5"), ctx).unwrap();
///
/// let ips = store.query(&Attribute::any("ips"), ctx).unwrap();
/// assert_eq!(ips.len(), 2);
/// assert_eq!(ips[0].value(), "10.0.0.2");
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Vec<Row>,
    next_id: u64,
    in_transaction: bool,
    closed: bool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of records (unscoped identity attributes).
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.rows.iter().filter(|row| row.scope.is_none()).count()
    }

    /// Returns true while a transaction is open.
    #[must_use]
    pub const fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Removes every attribute.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Marks the store unavailable; every later operation fails.
    pub fn close(&mut self) {
        self.closed = true;
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed {
            return Err(StoreError::unavailable("memory store closed"));
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> Rid {
        self.next_id += 1;
        Rid::new(self.next_id)
    }
}

impl AttributeStore for MemoryStore {
    fn begin_transaction(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        if self.in_transaction {
            return Err(StoreError::transaction("transaction already open"));
        }
        self.in_transaction = true;
        Ok(())
    }

    fn end_transaction(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::transaction("no transaction open"));
        }
        self.in_transaction = false;
        self.ensure_open()
    }

    fn insert(
        &mut self,
        attribute: Attribute,
        context: Option<Context>,
    ) -> Result<Rid, StoreError> {
        self.ensure_open()?;
        let id = self.allocate_id();
        debug!(%attribute, %id, "insert");
        self.rows.push(Row {
            id,
            scope: context.map(Context::rid),
            attribute,
        });
        Ok(id)
    }

    fn update(&mut self, attribute: Attribute, context: Option<Context>) -> Result<(), StoreError> {
        self.ensure_open()?;
        let mut updated = false;
        for row in self
            .rows
            .iter_mut()
            .filter(|row| row.in_scope(context) && row.attribute.key() == attribute.key())
        {
            row.attribute = attribute.clone();
            updated = true;
        }
        if !updated {
            self.insert(attribute, context)?;
        }
        Ok(())
    }

    fn find(
        &mut self,
        pattern: &Attribute,
        context: Option<Context>,
    ) -> Result<Option<Rid>, StoreError> {
        self.ensure_open()?;
        Ok(self
            .rows
            .iter()
            .find(|row| row.in_scope(context) && pattern.matches(&row.attribute))
            .map(|row| row.id))
    }

    fn query(
        &mut self,
        pattern: &Attribute,
        context: Option<Context>,
    ) -> Result<Vec<Attribute>, StoreError> {
        self.ensure_open()?;
        Ok(self
            .rows
            .iter()
            .filter(|row| row.in_scope(context) && pattern.matches(&row.attribute))
            .map(|row| row.attribute.clone())
            .collect())
    }

    fn remove_matching(
        &mut self,
        pattern: &Attribute,
        context: Option<Context>,
    ) -> Result<usize, StoreError> {
        self.ensure_open()?;
        let before = self.rows.len();
        self.rows
            .retain(|row| !(row.in_scope(context) && pattern.matches(&row.attribute)));
        let removed = before - self.rows.len();
        if removed > 0 {
            debug!(pattern = %pattern, removed, "remove");
        }
        Ok(removed)
    }
}
