pub mod connection;
pub mod material;
pub mod option;
pub mod product;
pub mod rules;
