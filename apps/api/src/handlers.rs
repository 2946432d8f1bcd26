pub mod health;
pub mod iam;
