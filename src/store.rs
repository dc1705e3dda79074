//! Attribute store trait consumed by the registry.

use crate::{Attribute, Context, Rid, StoreError};

/// Transactional attribute store with wildcard queries.
///
/// The registry owns exactly one store and brackets every command with
/// [`begin_transaction`](Self::begin_transaction) and
/// [`end_transaction`](Self::end_transaction) while holding its lock.
/// Implementations may be in-memory (see [`MemoryStore`](crate::MemoryStore))
/// or backed by a persistent engine; the registry logic does not change.
///
/// # Scoping
///
/// Every operation takes an optional [`Context`]. `Some(ctx)` restricts the
/// operation to the attributes of one record; `None` restricts it to the
/// unscoped attributes, which hold the record identities.
///
/// # Ordering
///
/// [`query`](Self::query) returns matches in insertion order. The registry
/// relies on this for "first value wins" resolution and for ordered
/// multi-valued properties.
pub trait AttributeStore: Send {
    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend is unavailable.
    fn begin_transaction(&mut self) -> Result<(), StoreError>;

    /// Commits the open transaction.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend is unavailable or no transaction
    /// is open.
    fn end_transaction(&mut self) -> Result<(), StoreError>;

    /// Inserts an attribute, returning the identifier of the new row.
    ///
    /// An unscoped insert creates a new record whose [`Rid`] is the returned
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend is unavailable.
    fn insert(&mut self, attribute: Attribute, context: Option<Context>)
        -> Result<Rid, StoreError>;

    /// Replaces the value of every attribute with the same key, or inserts
    /// the attribute if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend is unavailable.
    fn update(&mut self, attribute: Attribute, context: Option<Context>) -> Result<(), StoreError>;

    /// Returns the identifier of the first attribute matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend is unavailable.
    fn find(&mut self, pattern: &Attribute, context: Option<Context>)
        -> Result<Option<Rid>, StoreError>;

    /// Returns every attribute matching `pattern`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend is unavailable.
    fn query(
        &mut self,
        pattern: &Attribute,
        context: Option<Context>,
    ) -> Result<Vec<Attribute>, StoreError>;

    /// Removes every attribute matching `pattern`, returning how many went.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend is unavailable.
    fn remove_matching(
        &mut self,
        pattern: &Attribute,
        context: Option<Context>,
    ) -> Result<usize, StoreError>;

    /// Drops any cached query cursor between independent operations.
    fn reset(&mut self) {}
}
