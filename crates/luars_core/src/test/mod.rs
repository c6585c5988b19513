pub mod test_compare;
pub mod test_operators;
pub mod test_properties;
