pub mod complex_field;

pub use complex_field::{ComplexField, Component};
