pub mod config;
pub mod engine;
pub mod geometry;
pub mod hit_test;
pub mod input;
pub mod ring;
pub mod scene;
pub mod system;
pub mod tracking;
