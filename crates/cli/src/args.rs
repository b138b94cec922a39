use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

use agon_core::{DEFAULT_MEDIA_SIZE, is_positive_id};

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Episode id or inclusive id range (e.g. 22 or 20-24)
    pub episodes: EpisodeRange,

    /// Path to the credentials JSON file ({"email": ..., "password": ...})
    #[arg(short, long, default_value = "./account.json")]
    pub account: PathBuf,

    /// Output directory for downloaded media
    #[arg(short, long, default_value = "./rec.agonp")]
    pub dir: PathBuf,

    /// Media size variant requested from the url api
    #[arg(short, long, default_value = DEFAULT_MEDIA_SIZE)]
    pub size: String,

    /// Logging verbosity (error, warn, info, debug)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Prompt for credentials even when the account file exists
    #[arg(short, long)]
    pub interactive: bool,
}

#[derive(Debug, Clone)]
pub struct EpisodeRange {
    pub start: u64,
    pub end: u64,
}

impl EpisodeRange {
    pub fn iter(&self) -> impl Iterator<Item = String> + use<> {
        (self.start..=self.end).map(|id| id.to_string())
    }
}

fn parse_id(raw: &str) -> Result<u64, String> {
    if !is_positive_id(raw) {
        return Err(format!("invalid episode id: {raw}"));
    }
    raw.parse().map_err(|_| format!("invalid episode id: {raw}"))
}

impl FromStr for EpisodeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((start, end)) = s.split_once('-') {
            let start = parse_id(start)?;
            let end = parse_id(end)?;

            if start > end {
                return Err("start cannot be greater than end".into());
            }

            Ok(EpisodeRange { start, end })
        } else {
            let value = parse_id(s)?;
            Ok(EpisodeRange {
                start: value,
                end: value,
            })
        }
    }
}

impl std::fmt::Display for EpisodeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_episode_parses_to_a_unit_range() {
        let range: EpisodeRange = "22".parse().expect("single id should parse");
        assert_eq!(range.iter().collect::<Vec<_>>(), vec!["22"]);
    }

    #[test]
    fn dash_separated_range_is_inclusive() {
        let range: EpisodeRange = "20-23".parse().expect("range should parse");
        assert_eq!(
            range.iter().collect::<Vec<_>>(),
            vec!["20", "21", "22", "23"]
        );
    }

    #[test]
    fn non_positive_ids_are_rejected() {
        assert!("0".parse::<EpisodeRange>().is_err());
        assert!("007".parse::<EpisodeRange>().is_err());
        assert!("22a".parse::<EpisodeRange>().is_err());
        assert!("5-3".parse::<EpisodeRange>().is_err());
    }
}
