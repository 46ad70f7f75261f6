pub mod accountant;
