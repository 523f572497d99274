pub mod history_service;
pub mod report_exporter;
pub mod statistics_aggregator;
pub mod time_series_store;
pub mod zoom_navigator;
