//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM operations
//! for database entities. Tenant-scoped repositories take the owning company id on
//! every call so records of other companies behave as missing.
//!
//! Repositories are generic over [`sea_orm::ConnectionTrait`] so they work both on the
//! pool and inside a transaction.

pub mod company;
pub mod company_feature;
pub mod employee;
pub mod feature;
pub mod group;
pub mod item;
pub mod item_type;
pub mod item_unit;
pub mod manufacturer;
pub mod permission;
pub mod user;

pub use company::CompanyRepository;
pub use company_feature::FeatureGrantRepository;
pub use employee::EmployeeRepository;
pub use feature::FeatureRepository;
pub use group::GroupRepository;
pub use item::ItemRepository;
pub use item_type::ItemTypeRepository;
pub use item_unit::ItemUnitRepository;
pub use manufacturer::ManufacturerRepository;
pub use permission::PermissionRepository;
pub use user::UserRepository;
