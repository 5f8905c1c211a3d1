pub mod credentials;
pub mod health;
