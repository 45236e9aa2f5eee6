pub mod data_logger;
