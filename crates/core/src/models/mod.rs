pub mod complex;
pub mod price;
pub mod report;
pub mod settings;
pub mod statistics;
pub mod window;
pub mod zoom;
