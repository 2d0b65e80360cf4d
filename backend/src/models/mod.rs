pub mod invite;
pub mod member;
pub mod organization;
