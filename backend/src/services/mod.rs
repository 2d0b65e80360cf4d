pub mod invites;
pub mod organizations;
