pub mod user_repo;
pub use user_repo::{PgUserRepository, UserRepository};
pub mod rbac_repo;
pub use rbac_repo::{PgRoleRepository, RoleRepository};
pub mod tenancy_repo;
pub use tenancy_repo::{PgTenancyRepository, TenancyRepository};
pub mod memory;
pub use memory::InMemoryStore;
