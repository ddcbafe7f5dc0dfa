pub mod buckets;
pub mod casts;
pub mod intervals;
pub mod minimap;
pub mod phases;
pub mod resources;
pub mod time_axis;
pub mod tracks;
