//! Repository traits (ports)

pub mod lead_repository;
pub mod user_repository;

pub use lead_repository::LeadRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
pub use lead_repository::MockLeadRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
