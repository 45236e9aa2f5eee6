pub mod flat_buffer;
