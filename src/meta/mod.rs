mod magnet_link;

pub use magnet_link::{
    EXACT_TOPIC_PREFIX, KEY_DISPLAY_NAME, KEY_EXACT_LENGTH, KEY_EXACT_TOPIC, KEY_TRACKER,
    MAGNET_SCHEME, MagnetLink, Params,
};
