pub mod auto_complete;
pub mod import;

pub use auto_complete::AutoCompleteController;
pub use import::ImportConfig;
