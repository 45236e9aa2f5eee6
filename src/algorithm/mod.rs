pub mod cursor_fusion;
pub mod gesture;
pub mod hand_ray;
