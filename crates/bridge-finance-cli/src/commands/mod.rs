pub mod bridge;
pub mod sensitivity;
