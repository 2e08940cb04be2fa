use crate::{Result, meta::MagnetLink};

use std::str::FromStr;

pub(crate) fn run(uri: String, json: bool) -> Result<()> {
    let magnet_link = MagnetLink::from_str(&uri)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&magnet_link)?);
        return Ok(());
    }

    println!("Tracker URL: {}", magnet_link.tracker().unwrap_or("N/A"));
    println!("Info Hash: {}", magnet_link.info_hash());
    println!("Name: {}", magnet_link.name());

    if let Some(length) = magnet_link.exact_length() {
        println!("Length: {length}");
    }

    println!("Trackers:");
    for tracker in magnet_link.trackers() {
        println!("{tracker}");
    }

    for (key, values) in magnet_link.params() {
        for value in values {
            println!("{key}={value}");
        }
    }

    Ok(())
}
