pub mod apply;
pub mod info;
pub mod validate;
