pub mod brand;
pub mod request;
