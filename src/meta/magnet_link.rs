use crate::{BitTorrentError, Result, util::Bytes20};

use data_encoding::BASE32;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{debug, trace};
use url::Url;

pub const MAGNET_SCHEME: &str = "magnet";
pub const EXACT_TOPIC_PREFIX: &str = "urn:btih:";

pub const KEY_EXACT_TOPIC: &str = "xt";
pub const KEY_TRACKER: &str = "tr";
pub const KEY_DISPLAY_NAME: &str = "dn";
pub const KEY_EXACT_LENGTH: &str = "xl";

const HEX_HASH_LEN: usize = 40;
const BASE32_HASH_LEN: usize = 32;

/// Query parameters of a magnet link, values in the order they appear.
pub type Params = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MagnetLink {
    info_hash: Bytes20,
    name: String,
    trackers: Vec<String>,
    params: Params,
}

impl MagnetLink {
    pub fn info_hash(&self) -> Bytes20 {
        self.info_hash
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trackers(&self) -> &[String] {
        &self.trackers
    }

    pub fn tracker(&self) -> Option<&str> {
        self.trackers.first().map(String::as_str)
    }

    /// Every parameter other than `xt`, `tr` and `dn`.
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn exact_length(&self) -> Option<u64> {
        self.param(KEY_EXACT_LENGTH).and_then(|xl| xl.parse().ok())
    }
}

impl FromStr for MagnetLink {
    type Err = BitTorrentError;

    fn from_str(s: &str) -> Result<Self> {
        let url = Url::parse(s)?;

        if url.scheme() != MAGNET_SCHEME {
            return Err(BitTorrentError::SchemeError(url.scheme().to_string()));
        }

        let mut params = query_params(&url);

        let info_hash = take_exact_topic(&mut params)?;
        let trackers = take_trackers(&mut params)?;
        let name = take_display_name(&mut params)?;

        debug!(
            "Parsed magnet link {info_hash} with {} trackers and {} extra parameters",
            trackers.len(),
            params.len()
        );

        Ok(MagnetLink {
            info_hash,
            name,
            trackers,
            params,
        })
    }
}

fn query_params(url: &Url) -> Params {
    let mut params = Params::new();
    for (key, value) in url.query_pairs() {
        params
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    params
}

fn take_exact_topic(params: &mut Params) -> Result<Bytes20> {
    let xt = params
        .get(KEY_EXACT_TOPIC)
        .and_then(|values| values.first())
        .ok_or(BitTorrentError::MissingParameter(KEY_EXACT_TOPIC))?;

    let hash = xt
        .strip_prefix(EXACT_TOPIC_PREFIX)
        .ok_or(BitTorrentError::MalformedParameter(KEY_EXACT_TOPIC))?;

    let info_hash = decode_info_hash(hash)?;
    params.remove(KEY_EXACT_TOPIC);

    Ok(info_hash)
}

// Links carry the hash either as 40 hex digits or, in older links, as 32
// upper case base32 characters. Query decoding is lossy, so percent escapes
// that are not UTF-8 arrive here as U+FFFD.
fn decode_info_hash(hash: &str) -> Result<Bytes20> {
    let decoded = match hash.len() {
        HEX_HASH_LEN => hex::decode(hash).ok(),
        BASE32_HASH_LEN => BASE32.decode(hash.as_bytes()).ok(),
        // hex digest of the wrong length
        _ if !hash.is_empty() && hash.bytes().all(|b| b.is_ascii_hexdigit()) => None,
        len => return Err(BitTorrentError::UnsupportedEncoding(len)),
    };

    let info_hash = decoded
        .and_then(|bytes| Bytes20::try_from(bytes).ok())
        .ok_or(BitTorrentError::DecodeError(KEY_EXACT_TOPIC))?;

    trace!("Decoded info hash {info_hash} from {hash}");
    Ok(info_hash)
}

fn take_trackers(params: &mut Params) -> Result<Vec<String>> {
    params
        .remove(KEY_TRACKER)
        .filter(|trackers| !trackers.is_empty())
        .ok_or(BitTorrentError::MissingParameter(KEY_TRACKER))
}

fn take_display_name(params: &mut Params) -> Result<String> {
    params
        .remove(KEY_DISPLAY_NAME)
        .and_then(|names| names.into_iter().next())
        .ok_or(BitTorrentError::MissingParameter(KEY_DISPLAY_NAME))
}
