pub mod health;
pub mod permission_groups;
pub mod permissions;
pub mod principals;
