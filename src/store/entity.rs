use uuid::Uuid;

/// A persisted record with a stable identity.
///
/// The id is assigned once when the entity is first created and never
/// changes; "updating" an entity means building a new value with the
/// same id and replacing the stored one.  Implementors should make
/// `PartialEq` and `Hash` compare ids only.
pub trait Entity: Clone {
    fn id(&self) -> Uuid;
}
