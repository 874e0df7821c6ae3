pub mod wacc;
