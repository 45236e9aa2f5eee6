pub mod camera;
pub mod entity;
pub mod geometry;
pub mod roles;
