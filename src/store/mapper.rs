//! Conversion between domain entities and their on-disk shape.
//!
//! Going out (model → DTO) is a plain projection and cannot fail.
//! Coming in (DTO → model) always validates first; one bad record
//! fails the whole collection.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::entity::Entity;
use crate::errors::Result;

/// Serializable record used only at the persistence boundary.
pub trait DataTransferObject: Serialize + DeserializeOwned {
    /// Structural checks run before a DTO is turned into a model.
    ///
    /// Failures are `VaultError::Validation`.
    fn validate(&self) -> Result<()>;
}

/// Two-way mapping between a model and its DTO.
pub trait Mapper {
    type Model: Entity;
    type Dto: DataTransferObject;

    fn to_dto(&self, model: &Self::Model) -> Self::Dto;

    /// Build the model from a DTO that has already passed `validate`.
    fn map_to_model(&self, dto: Self::Dto) -> Result<Self::Model>;

    /// Validate `dto`, then build the model.
    fn to_model(&self, dto: Self::Dto) -> Result<Self::Model> {
        dto.validate()?;
        self.map_to_model(dto)
    }

    fn to_dtos(&self, models: &[Self::Model]) -> Vec<Self::Dto> {
        models.iter().map(|m| self.to_dto(m)).collect()
    }

    fn to_models(&self, dtos: Vec<Self::Dto>) -> Result<Vec<Self::Model>> {
        dtos.into_iter().map(|dto| self.to_model(dto)).collect()
    }
}
