pub mod persist;
pub mod regions;
pub mod store;

pub use persist::{
    MAP_STATE_KEY, REGION_VISIBILITY_KEY, SavedMapState, StoredMapState, load_map_state,
    load_region_visibility, save_map_state, save_region_visibility,
};
pub use regions::{REGIONS, RegionId, RegionMeta, RegionVisibility};
pub use store::{InMemoryStore, KeyValueStore, LocalStorageStore, StoreError};
