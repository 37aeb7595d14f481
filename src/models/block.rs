use serde::Deserialize;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenCounts {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_input_tokens: u64,
    pub cache_read_input_tokens: u64,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BurnRate {
    pub tokens_per_minute: f64,
    pub cost_per_hour: f64,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Projection {
    pub total_tokens: u64,
    pub total_cost: f64,
    pub remaining_minutes: i64,
}

/// One accounting window as reported by `ccusage blocks --json`.
///
/// Timestamps are kept as the raw strings ccusage emits; they are parsed
/// lazily by [`crate::window::session_progress`].
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Block {
    pub id: String,
    pub start_time: String,
    pub end_time: String,
    pub actual_end_time: String,
    pub is_active: bool,
    pub is_gap: bool,
    pub entries: u64,
    pub token_counts: TokenCounts,
    pub total_tokens: u64,
    #[serde(rename = "costUSD")]
    pub cost_usd: f64,
    pub models: Vec<String>,
    // ccusage reports `null` for idle blocks
    #[serde(deserialize_with = "null_as_default")]
    pub burn_rate: BurnRate,
    #[serde(deserialize_with = "null_as_default")]
    pub projection: Projection,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct BlocksResponse {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
