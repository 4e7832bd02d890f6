pub mod map_component;
