pub mod analyze;
pub mod cases;
pub mod health;
