pub mod fx_options;
pub mod options;
pub mod terms;
