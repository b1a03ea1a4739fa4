pub mod cookies;
pub mod suggest;
pub mod text;
